use std::env;
use std::time::Duration as StdDuration;

use tracing::{info, warn};

use crate::models::EarningsEvent;

pub mod latest;
pub mod ranking;
pub mod window;

pub use latest::LatestSlot;
pub use ranking::{fetch_ranked, rank_top_by_market_cap};
pub use window::DateWindow;

#[derive(Debug, thiserror::Error)]
pub enum CalendarError {
    #[error("invalid date range: {0}")]
    InvalidRange(String),
    #[error("earnings request failed: {0}")]
    Request(String),
    #[error("earnings api returned status {status}")]
    Fetch { status: u16 },
    #[error("earnings response decode failed: {0}")]
    Decode(String),
    #[error("candidate count reached page size {page_size}; results past it were dropped")]
    Truncated { page_size: usize },
}

pub const DEFAULT_BASE_URL: &str = "https://earnings-three.vercel.app";
/// The calendar's audience lives at UTC+9; daylight saving does not apply.
pub const DEFAULT_OFFSET_MINUTES: i32 = 540;
pub const DEFAULT_RANK_CAP: usize = 10;
pub const DEFAULT_PAGE_SIZE: usize = 5000;

/// Query configuration with environment overrides and hard defaults.
#[derive(Debug, Clone)]
pub struct CalendarConfig {
    pub base_url: String,
    pub offset_minutes: i32,
    pub rank_cap: usize,
    pub page_size: usize,
}

impl CalendarConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("EARNINGS_API_BASE")
                .map(|v| v.trim().to_string())
                .ok()
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            offset_minutes: env_parsed("CALENDAR_OFFSET_MINUTES", DEFAULT_OFFSET_MINUTES),
            rank_cap: env_parsed("CALENDAR_RANK_CAP", DEFAULT_RANK_CAP),
            page_size: env_parsed("CALENDAR_PAGE_SIZE", DEFAULT_PAGE_SIZE),
        }
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            offset_minutes: DEFAULT_OFFSET_MINUTES,
            rank_cap: DEFAULT_RANK_CAP,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

fn env_parsed<T: std::str::FromStr + Copy>(key: &str, fallback: T) -> T {
    match env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("{key} is set but not numeric; using the default");
                fallback
            }
        },
        Err(_) => fallback,
    }
}

/// Facade over the window resolver and ranking fetcher, holding the HTTP
/// client and the freshness slot for displayed results.
pub struct CalendarService {
    client: reqwest::Client,
    config: CalendarConfig,
    slot: LatestSlot<Vec<EarningsEvent>>,
}

impl CalendarService {
    pub fn new(config: CalendarConfig) -> Result<Self, CalendarError> {
        let client = reqwest::Client::builder()
            .timeout(StdDuration::from_secs(15)) // 15 second timeout
            .build()
            .map_err(|e| CalendarError::Request(format!("failed to build client: {e}")))?;

        Ok(Self {
            client,
            config,
            slot: LatestSlot::new(),
        })
    }

    pub fn config(&self) -> &CalendarConfig {
        &self.config
    }

    /// Resolve the window, fetch and rank candidates, and commit the
    /// result to the freshness slot.
    ///
    /// The returned list belongs to this query even when a newer query
    /// has already superseded it in the slot; `latest` is what a display
    /// should read.
    pub async fn query(
        &self,
        start: &str,
        end: &str,
    ) -> Result<Vec<EarningsEvent>, CalendarError> {
        let window = DateWindow::resolve(start, end, self.config.offset_minutes)?;
        let ticket = self.slot.begin();

        let ranked = fetch_ranked(
            &self.client,
            &self.config.base_url,
            &window,
            self.config.rank_cap,
            self.config.page_size,
        )
        .await?;

        if !self.slot.commit(ticket, ranked.clone()).await {
            info!("query result superseded by a newer request; not installed");
        }

        Ok(ranked)
    }

    /// Newest committed result across all queries so far.
    pub async fn latest(&self) -> Option<Vec<EarningsEvent>> {
        self.slot.current().await
    }
}

pub use CalendarError as Error;
