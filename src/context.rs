// src/context.rs
//
// Keyword gating and prompt assembly for the chat assistant. The gates here
// decide which upstream lookups the engine issues for a given message; the
// bundle collects whatever fragments those lookups produced.

/// Terms that indicate the user is asking about a specific site or its load.
const SITE_TERMS: [&str; 6] = ["site", "location", "place", "vli", "visitors", "capacity"];

/// Terms that indicate the user is asking about predictions.
const FORECAST_TERMS: [&str; 4] = ["forecast", "prediction", "future", "trend"];

fn mentions_any(message: &str, terms: &[&str]) -> bool {
    let lowered = message.to_lowercase();
    terms.iter().any(|term| lowered.contains(term))
}

pub fn wants_site_context(message: &str) -> bool {
    mentions_any(message, &SITE_TERMS)
}

pub fn wants_forecast_context(message: &str) -> bool {
    mentions_any(message, &FORECAST_TERMS)
}

/// Find the first known site name mentioned in the message, case-insensitive.
/// When several names match, the first one in upstream list order wins.
pub fn find_mentioned_site<'a>(message: &str, sites: &'a [String]) -> Option<&'a str> {
    let lowered = message.to_lowercase();
    sites
        .iter()
        .find(|site| !site.is_empty() && lowered.contains(&site.to_lowercase()))
        .map(|site| site.as_str())
}

/// Derive a session title from the first message: the first six words, or a
/// 40-character prefix when the message has no word structure to speak of.
pub fn derive_session_title(message: &str) -> String {
    let words: Vec<&str> = message.split_whitespace().take(6).collect();
    if !words.is_empty() {
        return words.join(" ");
    }
    message.chars().take(40).collect()
}

/// The context fragments gathered for one chat turn. Each lookup is
/// best-effort: a failed or skipped lookup leaves its fragment as `None` and
/// the prompt simply omits that block.
#[derive(Debug, Default)]
pub struct ContextBundle {
    pub web_search: Option<String>,
    pub site_stats: Option<String>,
    pub scenarios: Option<String>,
    pub daily: Option<String>,
}

impl ContextBundle {
    /// Labels of the context categories that contributed to the prompt,
    /// shown to the user as the answer's sources.
    pub fn sources(&self) -> Vec<String> {
        let mut sources = Vec::new();
        if self.web_search.is_some() {
            sources.push("Web search integration".to_string());
        }
        if self.site_stats.is_some() {
            sources.push("TDMS dataset".to_string());
        }
        if self.scenarios.is_some() {
            sources.push("Forecast scenarios".to_string());
        }
        if self.daily.is_some() {
            sources.push("Daily predictions".to_string());
        }
        sources
    }

    pub fn is_empty(&self) -> bool {
        self.web_search.is_none()
            && self.site_stats.is_none()
            && self.scenarios.is_none()
            && self.daily.is_none()
    }
}

/// Concatenate the preamble, every successful context fragment, and the
/// user's question into the single prompt sent to the generative endpoint.
pub fn build_prompt(message: &str, context: &ContextBundle) -> String {
    let mut prompt = String::from(
        "You are a helpful AI assistant specializing in tourism analytics and Sri Lanka tourism. \
         You have access to real-time data from the tourism analytics dashboard.\n\n\
         Available data sources:\n\
         - Current web search results for latest information\n\
         - TDMS (Tourism Destination Management System) data with site-specific visitor predictions and VLI scores\n\
         - Tourism forecasts with multiple scenarios (baseline, optimistic, pessimistic)\n\
         - Daily and monthly predictions for tourism arrivals\n",
    );

    for fragment in [
        &context.web_search,
        &context.site_stats,
        &context.scenarios,
        &context.daily,
    ]
    .into_iter()
    .flatten()
    {
        prompt.push('\n');
        prompt.push_str(fragment);
        prompt.push('\n');
    }

    prompt.push_str("\nUser question: ");
    prompt.push_str(message);
    prompt.push_str(
        "\n\nProvide a comprehensive and helpful response using the available data above. \
         If specific data isn't available for the query, clearly state that and provide \
         general guidance based on tourism best practices.",
    );

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_site_gate_matches_case_insensitively() {
        assert!(wants_site_context("What is the VLI at Sigiriya?"));
        assert!(wants_site_context("how many Visitors tomorrow"));
        assert!(!wants_site_context("hello there"));
    }

    #[test]
    fn test_forecast_gate() {
        assert!(wants_forecast_context("What is the forecast for March?"));
        assert!(wants_forecast_context("show me the TREND"));
        assert!(!wants_forecast_context("tell me about Kandy"));
    }

    #[test]
    fn test_first_mentioned_site_wins() {
        let sites = vec![
            "Sigiriya".to_string(),
            "Kandy".to_string(),
            "Galle Fort".to_string(),
        ];
        // Both Kandy and Sigiriya appear; list order decides.
        assert_eq!(
            find_mentioned_site("compare kandy with sigiriya", &sites),
            Some("Sigiriya")
        );
        assert_eq!(find_mentioned_site("visiting galle fort", &sites), Some("Galle Fort"));
        assert_eq!(find_mentioned_site("somewhere else entirely", &sites), None);
    }

    #[test]
    fn test_title_uses_first_six_words() {
        assert_eq!(
            derive_session_title("What is the forecast for March in Colombo?"),
            "What is the forecast for March"
        );
        assert_eq!(derive_session_title("hi"), "hi");
    }

    #[test]
    fn test_title_falls_back_to_prefix() {
        let long = "x".repeat(100);
        assert_eq!(derive_session_title(&long), "x".repeat(40));
        assert_eq!(derive_session_title(""), "");
    }

    #[test]
    fn test_sources_follow_fragments() {
        let mut bundle = ContextBundle::default();
        assert!(bundle.sources().is_empty());
        assert!(bundle.is_empty());

        bundle.web_search = Some("results".to_string());
        bundle.daily = Some("rows".to_string());
        assert_eq!(
            bundle.sources(),
            vec!["Web search integration".to_string(), "Daily predictions".to_string()]
        );
        assert!(!bundle.is_empty());
    }

    #[test]
    fn test_prompt_contains_fragments_and_question() {
        let bundle = ContextBundle {
            web_search: Some("Recent web search results:\n- A: B".to_string()),
            site_stats: None,
            scenarios: Some("Forecast scenarios available: baseline, optimistic, pessimistic".to_string()),
            daily: None,
        };
        let prompt = build_prompt("What is next month like?", &bundle);
        assert!(prompt.contains("Recent web search results"));
        assert!(prompt.contains("Forecast scenarios available"));
        assert!(prompt.contains("User question: What is next month like?"));
    }
}
