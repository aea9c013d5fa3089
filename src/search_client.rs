// src/search_client.rs
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone)]
pub struct SearchClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct WebSearchResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SearchResult {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
}

impl SearchClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    /// Run a web search for current information related to the query.
    pub async fn search_web(
        &self,
        query: &str,
    ) -> Result<WebSearchResponse, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/api/search/web", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&json!({ "query": query }))
            .send()
            .await?
            .error_for_status()?;

        let body = response.json::<WebSearchResponse>().await?;
        Ok(body)
    }
}

/// Format search results into the prompt fragment the assistant injects.
pub fn format_search_results(results: &[SearchResult]) -> String {
    let mut fragment = String::from("Recent web search results:\n");
    for result in results {
        fragment.push_str(&format!("- {}: {}\n", result.title, result.snippet));
    }
    fragment.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parsing_defaults() {
        let parsed: WebSearchResponse = serde_json::from_str("{}").unwrap();
        assert!(!parsed.success);
        assert!(parsed.results.is_empty());

        let parsed: WebSearchResponse = serde_json::from_str(
            r#"{"success": true, "results": [{"title": "Tourism up", "snippet": "Arrivals rose 12%"}]}"#,
        )
        .unwrap();
        assert!(parsed.success);
        assert_eq!(parsed.results.len(), 1);
    }

    #[test]
    fn test_format_search_results() {
        let results = vec![
            SearchResult { title: "A".to_string(), snippet: "one".to_string() },
            SearchResult { title: "B".to_string(), snippet: "two".to_string() },
        ];
        assert_eq!(
            format_search_results(&results),
            "Recent web search results:\n- A: one\n- B: two"
        );
    }
}
