use std::cmp::Ordering;

use tracing::{info, warn};

use crate::models::EarningsEvent;
use crate::service::calendar::window::DateWindow;
use crate::service::calendar::CalendarError;

/// Reduce candidates to the top `cap` by market capitalization, presented
/// in chronological order.
///
/// Truncation happens on the cap-descending order before the survivors
/// are re-sorted ascending by event time. Both sorts are stable, so ties
/// keep their original order.
pub fn rank_top_by_market_cap(
    mut candidates: Vec<EarningsEvent>,
    cap: usize,
) -> Vec<EarningsEvent> {
    candidates.sort_by(|a, b| {
        b.ranking_cap()
            .partial_cmp(&a.ranking_cap())
            .unwrap_or(Ordering::Equal)
    });
    candidates.truncate(cap);
    candidates.sort_by(|a, b| a.event_at.cmp(&b.event_at));
    candidates
}

/// Fetch every candidate in the window in a single round trip and rank
/// the result. No retry on failure; each error is terminal for this
/// attempt.
pub async fn fetch_ranked(
    client: &reqwest::Client,
    base_url: &str,
    window: &DateWindow,
    cap: usize,
    page_size: usize,
) -> Result<Vec<EarningsEvent>, CalendarError> {
    let url = format!("{}/api/earnings", base_url.trim_end_matches('/'));

    info!(
        "Fetching earnings candidates for window {}..{}",
        window.start_ms(),
        window.end_ms()
    );

    let resp = client
        .get(&url)
        .query(&[
            ("from", window.start_ms().to_string()),
            ("to", window.end_ms().to_string()),
            ("pageSize", page_size.to_string()),
            // Advisory only; the pipeline re-sorts regardless.
            ("sortBy", "marketCap".to_string()),
        ])
        .send()
        .await
        .map_err(|e| {
            warn!("earnings request failed: {e}");
            CalendarError::Request(format!("earnings request failed: {e}"))
        })?;

    let status = resp.status();
    if !status.is_success() {
        warn!("earnings api returned status {status}");
        return Err(CalendarError::Fetch {
            status: status.as_u16(),
        });
    }

    let raw = resp.bytes().await.map_err(|e| {
        warn!("failed to read earnings body: {e}");
        CalendarError::Request(format!("earnings body read failed: {e}"))
    })?;

    let candidates: Vec<EarningsEvent> = serde_json::from_slice(&raw).map_err(|e| {
        let preview = String::from_utf8_lossy(&raw[..raw.len().min(500)]);
        warn!("failed to decode earnings body: {e}; body preview: {preview}");
        CalendarError::Decode(e.to_string())
    })?;

    // A full page means the endpoint may have dropped candidates past it.
    if candidates.len() >= page_size {
        warn!(
            "candidate count {} reached the page size; refusing to rank a truncated set",
            candidates.len()
        );
        return Err(CalendarError::Truncated { page_size });
    }

    info!("Ranking {} candidates (cap {cap})", candidates.len());

    Ok(rank_top_by_market_cap(candidates, cap))
}
