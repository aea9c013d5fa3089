// src/forecast_client.rs
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct ForecastClient {
    client: Client,
    base_url: String,
}

/// Monthly arrival forecasts, one labeled series per scenario. Missing
/// series deserialize as empty.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct ScenarioForecasts {
    #[serde(default)]
    pub baseline: Vec<ScenarioPoint>,
    #[serde(default)]
    pub optimistic: Vec<ScenarioPoint>,
    #[serde(default)]
    pub pessimistic: Vec<ScenarioPoint>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScenarioPoint {
    pub date: String,
    #[serde(default)]
    pub arrivals_forecast: f64,
}

/// Short-horizon daily forecasts, same scenario labeling.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DailyForecasts {
    #[serde(default)]
    pub baseline: Vec<DailyPoint>,
    #[serde(default)]
    pub optimistic: Vec<DailyPoint>,
    #[serde(default)]
    pub pessimistic: Vec<DailyPoint>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DailyPoint {
    pub date: String,
    #[serde(default)]
    pub total_forecast: f64,
}

impl DailyForecasts {
    /// Select a scenario's series by label; unknown labels fall back to
    /// baseline, matching how the dashboard treats scenario toggles.
    pub fn scenario(&self, name: &str) -> &[DailyPoint] {
        match name {
            "optimistic" => &self.optimistic,
            "pessimistic" => &self.pessimistic,
            _ => &self.baseline,
        }
    }
}

impl ForecastClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub async fn fetch_scenarios(
        &self,
    ) -> Result<ScenarioForecasts, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/api/forecasts/scenarios", self.base_url);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        Ok(response.json::<ScenarioForecasts>().await?)
    }

    pub async fn fetch_daily(
        &self,
    ) -> Result<DailyForecasts, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/api/forecasts/daily", self.base_url);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        Ok(response.json::<DailyForecasts>().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_series_default_to_empty() {
        let parsed: DailyForecasts =
            serde_json::from_str(r#"{"baseline": [{"date": "2026-01-01", "total_forecast": 5200}]}"#)
                .unwrap();
        assert_eq!(parsed.baseline.len(), 1);
        assert!(parsed.optimistic.is_empty());
        assert!(parsed.pessimistic.is_empty());
    }

    #[test]
    fn test_scenario_selection_falls_back_to_baseline() {
        let forecasts = DailyForecasts {
            baseline: vec![DailyPoint { date: "2026-01-01".to_string(), total_forecast: 1.0 }],
            optimistic: vec![],
            pessimistic: vec![],
        };
        assert_eq!(forecasts.scenario("baseline").len(), 1);
        assert_eq!(forecasts.scenario("optimistic").len(), 0);
        assert_eq!(forecasts.scenario("unheard-of").len(), 1);
    }

    #[test]
    fn test_malformed_payload_is_an_error_not_a_panic() {
        let parsed = serde_json::from_str::<ScenarioForecasts>("[1, 2, 3]");
        assert!(parsed.is_err());
    }
}
