// src/assistant/engine.rs
//
// The context-assembling chat request: gather best-effort fragments from the
// search, TDMS and forecast APIs, send one prompt to the generative
// endpoint, and persist the exchange. Lookups are never retried; a failed
// lookup only drops its fragment from the prompt.

use std::sync::Arc;

use thiserror::Error;
use uuid::Uuid;

use crate::assistant::conversation::{ConversationError, ConversationStore, MessageRole};
use crate::assistant::GenerativeClient;
use crate::context::{self, ContextBundle};
use crate::forecast_client::{DailyPoint, ForecastClient};
use crate::search_client::{format_search_results, SearchClient};
use crate::tdms_client::{SiteDay, TdmsClient};

/// Shown (and persisted as the assistant's turn) when the generation call
/// fails or no generative client is configured.
pub const FALLBACK_MESSAGE: &str =
    "I apologize, but I'm having trouble connecting to the AI service. Please try again later.";

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error(transparent)]
    Conversation(#[from] ConversationError),
    #[error("Message must not be empty")]
    EmptyMessage,
}

#[derive(Debug)]
pub struct AssistantReply {
    pub session_uuid: Uuid,
    pub text: String,
    pub sources: Vec<String>,
}

pub struct ChatAssistant {
    store: ConversationStore,
    generative: Option<Arc<dyn GenerativeClient>>,
    search: SearchClient,
    tdms: TdmsClient,
    forecasts: ForecastClient,
}

impl ChatAssistant {
    pub fn new(
        store: ConversationStore,
        generative: Option<Arc<dyn GenerativeClient>>,
        search: SearchClient,
        tdms: TdmsClient,
        forecasts: ForecastClient,
    ) -> Self {
        Self {
            store,
            generative,
            search,
            tdms,
            forecasts,
        }
    }

    /// Handle one user turn: persist it (creating the session on the first
    /// message of a new conversation), assemble context, call the model
    /// once, and persist the assistant turn. Fallback text is persisted the
    /// same way as a generated answer.
    pub async fn handle_message(
        &self,
        user_id: i32,
        session_uuid: Option<Uuid>,
        message: &str,
    ) -> Result<AssistantReply, AssistantError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AssistantError::EmptyMessage);
        }

        let session = match session_uuid {
            Some(uuid) => self.store.find_session(user_id, uuid).await?,
            None => {
                let title = context::derive_session_title(message);
                self.store.create_session(user_id, &title).await?
            }
        };

        self.store
            .append_message(session.id, MessageRole::User, message, &[])
            .await?;

        let bundle = self.gather_context(message).await;
        let prompt = context::build_prompt(message, &bundle);

        let (text, sources) = match &self.generative {
            Some(client) => match client.generate(&prompt).await {
                Ok(text) => (text, bundle.sources()),
                Err(e) => {
                    tracing::error!("Generation call failed: {}", e);
                    (FALLBACK_MESSAGE.to_string(), Vec::new())
                }
            },
            None => {
                tracing::warn!("No generative client configured; returning fallback");
                (FALLBACK_MESSAGE.to_string(), Vec::new())
            }
        };

        self.store
            .append_message(session.id, MessageRole::Assistant, &text, &sources)
            .await?;

        Ok(AssistantReply {
            session_uuid: session.session_uuid,
            text,
            sources,
        })
    }

    /// Issue the best-effort context lookups. Web search always runs; TDMS
    /// and forecast lookups are gated on the message's keywords. The two
    /// forecast endpoints are fetched concurrently, each independently
    /// fallible.
    async fn gather_context(&self, message: &str) -> ContextBundle {
        let mut bundle = ContextBundle::default();

        match self.search.search_web(message).await {
            Ok(response) if response.success && !response.results.is_empty() => {
                bundle.web_search = Some(format_search_results(&response.results));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Web search failed, proceeding without it: {}", e);
            }
        }

        if context::wants_site_context(message) {
            bundle.site_stats = self.site_context(message).await;
        }

        if context::wants_forecast_context(message) {
            let (daily, scenarios) =
                futures::join!(self.forecasts.fetch_daily(), self.forecasts.fetch_scenarios());

            match daily {
                Ok(data) if !data.baseline.is_empty() => {
                    bundle.daily = Some(daily_fragment(&data.baseline));
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Daily forecast fetch failed: {}", e),
            }

            match scenarios {
                Ok(data) if !data.baseline.is_empty() => {
                    bundle.scenarios = Some(
                        "Forecast scenarios available: baseline, optimistic, pessimistic"
                            .to_string(),
                    );
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Forecast scenario fetch failed: {}", e),
            }
        }

        bundle
    }

    async fn site_context(&self, message: &str) -> Option<String> {
        let sites = match self.tdms.fetch_sites().await {
            Ok(sites) if !sites.is_empty() => sites,
            Ok(_) => return None,
            Err(e) => {
                tracing::warn!("TDMS site list fetch failed: {}", e);
                return None;
            }
        };

        let mentioned = context::find_mentioned_site(message, &sites);
        let detail = match mentioned {
            Some(site) => match self.tdms.fetch_site(site).await {
                Ok(series) => series.last().cloned(),
                Err(e) => {
                    tracing::warn!("TDMS data fetch failed for {}: {}", site, e);
                    None
                }
            },
            None => None,
        };

        Some(site_fragment(&sites, mentioned, detail.as_ref()))
    }
}

/// The first three baseline daily rows, formatted for the prompt.
fn daily_fragment(points: &[DailyPoint]) -> String {
    let mut fragment = String::from("Upcoming tourism arrival predictions:\n");
    for point in points.iter().take(3) {
        fragment.push_str(&format!(
            "- {}: {} forecasted arrivals\n",
            point.date, point.total_forecast
        ));
    }
    fragment.trim_end().to_string()
}

/// The TDMS fragment: the first ten site names, plus the latest data point
/// for a mentioned site when one was found.
fn site_fragment(sites: &[String], mentioned: Option<&str>, latest: Option<&SiteDay>) -> String {
    let preview: Vec<&str> = sites.iter().take(10).map(|s| s.as_str()).collect();
    let mut fragment = format!("Available tourism sites in dataset: {}...", preview.join(", "));

    if let (Some(site), Some(day)) = (mentioned, latest) {
        fragment.push_str(&format!(
            "\n\nLatest data for {}:\n- Predicted visitors: {}\n- VLI score: {}\n- Statistical capacity: {}\n- Date: {}",
            site, day.predicted_total_visitors, day.vli_score, day.statistical_capacity, day.date
        ));
    }

    fragment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daily_fragment_caps_at_three_rows() {
        let points: Vec<DailyPoint> = (1..=5)
            .map(|d| DailyPoint {
                date: format!("2026-01-0{}", d),
                total_forecast: 1000.0 * d as f64,
            })
            .collect();
        let fragment = daily_fragment(&points);
        assert!(fragment.contains("2026-01-03"));
        assert!(!fragment.contains("2026-01-04"));
        assert_eq!(fragment.lines().count(), 4);
    }

    #[test]
    fn test_site_fragment_without_mention() {
        let sites: Vec<String> = (1..=12).map(|i| format!("Site {}", i)).collect();
        let fragment = site_fragment(&sites, None, None);
        assert!(fragment.contains("Site 10"));
        assert!(!fragment.contains("Site 11"));
        assert!(!fragment.contains("Latest data"));
    }

    #[test]
    fn test_site_fragment_with_latest_data() {
        let sites = vec!["Sigiriya".to_string()];
        let day = SiteDay {
            date: "2026-03-01".to_string(),
            predicted_total_visitors: 5200.0,
            vli_score: 118.4,
            statistical_capacity: 6000.0,
        };
        let fragment = site_fragment(&sites, Some("Sigiriya"), Some(&day));
        assert!(fragment.contains("Latest data for Sigiriya"));
        assert!(fragment.contains("VLI score: 118.4"));
        assert!(fragment.contains("Date: 2026-03-01"));
    }
}
