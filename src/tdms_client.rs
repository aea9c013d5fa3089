// src/tdms_client.rs
//
// Client for the Tourist Distribution Management System API: per-site
// visitor predictions, VLI scores and monthly aggregates.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::analytics::SiteLoad;

#[derive(Debug, Clone)]
pub struct TdmsClient {
    client: Client,
    base_url: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SitesResponse {
    #[serde(default)]
    pub sites: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DatesResponse {
    #[serde(default)]
    pub dates: Vec<String>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct DashboardResponse {
    #[serde(default)]
    pub vli_scores: Vec<SiteLoad>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct SiteSeriesResponse {
    #[serde(default)]
    pub data: Vec<SiteDay>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SiteDay {
    pub date: String,
    #[serde(default)]
    pub predicted_total_visitors: f64,
    #[serde(default)]
    pub vli_score: f64,
    #[serde(default)]
    pub statistical_capacity: f64,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct MonthlyResponse {
    #[serde(default)]
    pub monthly_data: Vec<MonthlyDatum>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MonthlyDatum {
    pub month: String,
    #[serde(default)]
    pub total_visitors: i64,
}

impl TdmsClient {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
        }
    }

    pub async fn fetch_sites(
        &self,
    ) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/api/tdms/sites", self.base_url);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        Ok(response.json::<SitesResponse>().await?.sites)
    }

    pub async fn fetch_dates(
        &self,
    ) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/api/tdms/dates", self.base_url);
        let response = self.client.get(&url).send().await?.error_for_status()?;
        Ok(response.json::<DatesResponse>().await?.dates)
    }

    /// Per-site VLI scores and visitor counts for one date.
    pub async fn fetch_dashboard(
        &self,
        date: &str,
    ) -> Result<Vec<SiteLoad>, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!(
            "{}/api/tdms/dashboard/{}",
            self.base_url,
            urlencoding::encode(date)
        );
        let response = self.client.get(&url).send().await?.error_for_status()?;
        Ok(response.json::<DashboardResponse>().await?.vli_scores)
    }

    /// Full prediction series for one site. Site names contain spaces, so
    /// the path segment must be percent-encoded.
    pub async fn fetch_site(
        &self,
        site: &str,
    ) -> Result<Vec<SiteDay>, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!("{}/api/tdms/site/{}", self.base_url, urlencoding::encode(site));
        let response = self.client.get(&url).send().await?.error_for_status()?;
        Ok(response.json::<SiteSeriesResponse>().await?.data)
    }

    pub async fn fetch_monthly(
        &self,
        site: &str,
        year: i32,
    ) -> Result<Vec<MonthlyDatum>, Box<dyn std::error::Error + Send + Sync>> {
        let url = format!(
            "{}/api/tdms/monthly/{}/{}",
            self.base_url,
            urlencoding::encode(site),
            year
        );
        let response = self.client.get(&url).send().await?.error_for_status()?;
        Ok(response.json::<MonthlyResponse>().await?.monthly_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dashboard_parsing() {
        let body = r#"{"vli_scores": [{"site": "Sigiriya", "vli_score": 118.4, "visitors": 5200}]}"#;
        let parsed: DashboardResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.vli_scores.len(), 1);
        assert_eq!(parsed.vli_scores[0].site, "Sigiriya");
        assert_eq!(parsed.vli_scores[0].visitors, 5200);
    }

    #[test]
    fn test_missing_fields_default() {
        let parsed: SiteSeriesResponse =
            serde_json::from_str(r#"{"data": [{"date": "2026-01-01"}]}"#).unwrap();
        assert_eq!(parsed.data[0].predicted_total_visitors, 0.0);
        assert_eq!(parsed.data[0].vli_score, 0.0);

        let parsed: MonthlyResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.monthly_data.is_empty());
    }
}
