// src/analytics.rs
//
// Data shaping for the dashboard views: daily forecast windowing, monthly
// KPI aggregation, and the visitor redistribution simulation. No upstream
// calls happen here; handlers pass in whatever the TDMS and forecast
// services returned.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One row of the daily predictions table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyWindowRow {
    pub date: String,
    pub day: String,
    pub prediction: f64,
    pub confidence: u8,
}

/// Default confidence shown next to each daily prediction. The upstream
/// forecast service does not report per-row confidence.
const DEFAULT_CONFIDENCE: u8 = 95;

/// Slice a scenario's daily series into a display window starting at
/// `start` and spanning `days` calendar days. Dates absent from the series
/// are skipped; a malformed or empty upstream response yields an empty
/// window, never an error.
pub fn daily_window(points: &[(String, f64)], start: NaiveDate, days: u32) -> Vec<DailyWindowRow> {
    let by_date: HashMap<NaiveDate, f64> = points
        .iter()
        .filter_map(|(date, value)| {
            NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .ok()
                .map(|parsed| (parsed, *value))
        })
        .collect();

    let mut rows = Vec::new();
    for offset in 0..days {
        let date = start + Duration::days(offset as i64);
        if let Some(value) = by_date.get(&date) {
            rows.push(DailyWindowRow {
                date: date.format("%Y-%m-%d").to_string(),
                day: date.format("%A, %B %-d, %Y").to_string(),
                prediction: *value,
                confidence: DEFAULT_CONFIDENCE,
            });
        }
    }
    rows
}

/// KPI metrics for a site/year selection. `None` when there is no monthly
/// data to aggregate (rendered as "N/A" by the dashboard).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MonthlyKpis {
    pub yearly_peak_demand: Option<i64>,
    pub average_monthly_volume: Option<i64>,
}

pub fn monthly_kpis(totals: &[i64]) -> MonthlyKpis {
    if totals.is_empty() {
        return MonthlyKpis {
            yearly_peak_demand: None,
            average_monthly_volume: None,
        };
    }
    let peak = totals.iter().copied().max();
    let sum: i64 = totals.iter().sum();
    let average = (sum as f64 / totals.len() as f64).round() as i64;
    MonthlyKpis {
        yearly_peak_demand: peak,
        average_monthly_volume: Some(average),
    }
}

/// Per-site load as reported by the TDMS dashboard endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SiteLoad {
    pub site: String,
    pub vli_score: f64,
    pub visitors: i64,
}

/// A site's load after the redistribution simulation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulatedSite {
    pub site: String,
    pub visitors: i64,
    pub original_vli: f64,
    pub simulated_vli: f64,
}

/// Simulate moving `percentage`% of the source site's visitors to the
/// target site. VLI scales linearly with the visitor count: the source's
/// score shrinks (clamped at zero) and the target's grows; every other
/// site is untouched. Sites with zero visitors keep their score since
/// there is no load to scale against.
pub fn simulate_redistribution(
    sites: &[SiteLoad],
    source_site: &str,
    target_site: &str,
    percentage: f64,
) -> Vec<SimulatedSite> {
    let percentage = percentage.clamp(0.0, 100.0);
    let source_visitors = sites
        .iter()
        .find(|s| s.site == source_site)
        .map(|s| s.visitors)
        .unwrap_or(0);
    let moved = ((source_visitors as f64) * (percentage / 100.0)).floor() as i64;

    sites
        .iter()
        .map(|site| {
            if site.site == source_site && site.visitors > 0 {
                let new_visitors = site.visitors - moved;
                let scaled = site.vli_score * (new_visitors as f64 / site.visitors as f64);
                SimulatedSite {
                    site: site.site.clone(),
                    visitors: new_visitors,
                    original_vli: site.vli_score,
                    simulated_vli: scaled.max(0.0),
                }
            } else if site.site == target_site && site.visitors > 0 {
                let new_visitors = site.visitors + moved;
                let scaled = site.vli_score * (new_visitors as f64 / site.visitors as f64);
                SimulatedSite {
                    site: site.site.clone(),
                    visitors: new_visitors,
                    original_vli: site.vli_score,
                    simulated_vli: scaled,
                }
            } else {
                SimulatedSite {
                    site: site.site.clone(),
                    visitors: site.visitors,
                    original_vli: site.vli_score,
                    simulated_vli: site.vli_score,
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points() -> Vec<(String, f64)> {
        vec![
            ("2026-01-01".to_string(), 5200.0),
            ("2026-01-02".to_string(), 5350.0),
            ("2026-01-04".to_string(), 4900.0),
            ("not-a-date".to_string(), 1.0),
        ]
    }

    #[test]
    fn test_daily_window_skips_missing_dates() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let rows = daily_window(&points(), start, 7);

        // Jan 3 has no data and non-dates are dropped.
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].date, "2026-01-01");
        assert_eq!(rows[1].date, "2026-01-02");
        assert_eq!(rows[2].date, "2026-01-04");
        assert_eq!(rows[0].prediction, 5200.0);
        assert_eq!(rows[0].confidence, 95);
        assert_eq!(rows[0].day, "Thursday, January 1, 2026");
    }

    #[test]
    fn test_daily_window_empty_upstream_is_empty_display_set() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        assert!(daily_window(&[], start, 30).is_empty());
    }

    #[test]
    fn test_daily_window_is_ordered_ascending() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let rows = daily_window(&points(), start, 7);
        let mut dates = rows.iter().map(|r| r.date.clone()).collect::<Vec<_>>();
        dates.sort();
        assert_eq!(dates, rows.iter().map(|r| r.date.clone()).collect::<Vec<_>>());
    }

    #[test]
    fn test_monthly_kpis() {
        let kpis = monthly_kpis(&[1000, 4000, 2500]);
        assert_eq!(kpis.yearly_peak_demand, Some(4000));
        assert_eq!(kpis.average_monthly_volume, Some(2500));

        let empty = monthly_kpis(&[]);
        assert_eq!(empty.yearly_peak_demand, None);
        assert_eq!(empty.average_monthly_volume, None);
    }

    fn loads() -> Vec<SiteLoad> {
        vec![
            SiteLoad { site: "Sigiriya".to_string(), vli_score: 120.0, visitors: 1000 },
            SiteLoad { site: "Kandy".to_string(), vli_score: 60.0, visitors: 500 },
            SiteLoad { site: "Galle Fort".to_string(), vli_score: 80.0, visitors: 800 },
        ]
    }

    #[test]
    fn test_redistribution_moves_load() {
        let result = simulate_redistribution(&loads(), "Sigiriya", "Kandy", 20.0);

        let source = result.iter().find(|s| s.site == "Sigiriya").unwrap();
        assert_eq!(source.visitors, 800);
        assert_eq!(source.original_vli, 120.0);
        assert!((source.simulated_vli - 96.0).abs() < 1e-9);

        let target = result.iter().find(|s| s.site == "Kandy").unwrap();
        assert_eq!(target.visitors, 700);
        assert!((target.simulated_vli - 84.0).abs() < 1e-9);

        // Visitors moved out equal visitors moved in.
        assert_eq!(1000 - source.visitors, target.visitors - 500);

        let other = result.iter().find(|s| s.site == "Galle Fort").unwrap();
        assert_eq!(other.visitors, 800);
        assert_eq!(other.simulated_vli, other.original_vli);
    }

    #[test]
    fn test_redistribution_source_vli_never_negative() {
        let result = simulate_redistribution(&loads(), "Sigiriya", "Kandy", 100.0);
        let source = result.iter().find(|s| s.site == "Sigiriya").unwrap();
        assert!(source.simulated_vli >= 0.0);
        assert_eq!(source.visitors, 0);
    }

    #[test]
    fn test_redistribution_clamps_percentage() {
        let result = simulate_redistribution(&loads(), "Sigiriya", "Kandy", 250.0);
        let source = result.iter().find(|s| s.site == "Sigiriya").unwrap();
        assert_eq!(source.visitors, 0);
    }

    #[test]
    fn test_redistribution_with_unknown_source_is_identity() {
        let result = simulate_redistribution(&loads(), "Nowhere", "Kandy", 30.0);
        for (before, after) in loads().iter().zip(result.iter()) {
            assert_eq!(before.visitors, after.visitors);
            assert_eq!(before.vli_score, after.simulated_vli);
        }
    }

    #[test]
    fn test_redistribution_zero_visitor_sites_keep_score() {
        let sites = vec![
            SiteLoad { site: "Empty".to_string(), vli_score: 10.0, visitors: 0 },
            SiteLoad { site: "Kandy".to_string(), vli_score: 60.0, visitors: 500 },
        ];
        let result = simulate_redistribution(&sites, "Empty", "Kandy", 50.0);
        assert_eq!(result[0].simulated_vli, 10.0);
        assert_eq!(result[1].visitors, 500);
    }
}
