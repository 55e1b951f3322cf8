use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Earnings event as returned by the calendar endpoint.
///
/// The wire shape is camelCase JSON with `eventAt` carried as epoch
/// milliseconds. EPS, revenue and icon fields are not used by the ranking
/// pipeline and pass through unmodified.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsEvent {
    pub id: String,
    pub ticker: String,
    pub company_name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub event_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eps: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eps_est: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_est: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon_url: Option<String>,
}

impl EarningsEvent {
    /// Market cap used for ranking; events without one rank as zero.
    pub fn ranking_cap(&self) -> f64 {
        self.market_cap.unwrap_or(0.0)
    }
}
