use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Timelike, Utc};
use once_cell::sync::Lazy;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

static LAST_SNAPSHOT_DATE: Lazy<Mutex<Option<NaiveDate>>> = Lazy::new(|| Mutex::new(None));

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot request failed: {0}")]
    Request(String),
    #[error("render service returned status {status}")]
    Capture { status: u16 },
    #[error("mail relay returned status {status}")]
    Delivery { status: u16 },
}

/// Black-box page renderer: target URL in, full-page PNG bytes out.
#[async_trait]
pub trait PageCapture: Send + Sync {
    async fn capture(&self, url: &str) -> Result<Vec<u8>, SnapshotError>;
}

/// Black-box mail transport: attachment in, delivered to recipient.
#[async_trait]
pub trait SnapshotDelivery: Send + Sync {
    async fn deliver(
        &self,
        recipient: &str,
        subject: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<(), SnapshotError>;
}

/// Capture adapter over an HTTP render service.
pub struct RenderServiceCapture {
    client: reqwest::Client,
    endpoint: String,
}

impl RenderServiceCapture {
    pub fn new(endpoint: String) -> Result<Self, SnapshotError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60)) // full-page renders are slow
            .build()
            .map_err(|e| SnapshotError::Request(format!("failed to build client: {e}")))?;

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl PageCapture for RenderServiceCapture {
    async fn capture(&self, url: &str) -> Result<Vec<u8>, SnapshotError> {
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("url", url),
                ("fullPage", "true"),
                ("width", "1920"),
                ("height", "1080"),
            ])
            .send()
            .await
            .map_err(|e| SnapshotError::Request(format!("render request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            warn!("render service returned status {status}");
            return Err(SnapshotError::Capture {
                status: status.as_u16(),
            });
        }

        let bytes = resp
            .bytes()
            .await
            .map_err(|e| SnapshotError::Request(format!("render body read failed: {e}")))?;

        Ok(bytes.to_vec())
    }
}

/// Delivery adapter over an HTTP mail relay.
pub struct MailRelayDelivery {
    client: reqwest::Client,
    endpoint: String,
}

impl MailRelayDelivery {
    pub fn new(endpoint: String) -> Result<Self, SnapshotError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SnapshotError::Request(format!("failed to build client: {e}")))?;

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl SnapshotDelivery for MailRelayDelivery {
    async fn deliver(
        &self,
        recipient: &str,
        subject: &str,
        filename: &str,
        bytes: Vec<u8>,
    ) -> Result<(), SnapshotError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .query(&[
                ("recipient", recipient),
                ("subject", subject),
                ("filename", filename),
            ])
            .header("Content-Type", "application/octet-stream")
            .body(bytes)
            .send()
            .await
            .map_err(|e| SnapshotError::Request(format!("relay request failed: {e}")))?;

        let status = resp.status();
        if !status.is_success() {
            warn!("mail relay returned status {status}");
            return Err(SnapshotError::Delivery {
                status: status.as_u16(),
            });
        }

        Ok(())
    }
}

/// One capture-and-deliver pass for the hosted calendar page.
///
/// The attachment carries the run date in its name. When an archive
/// directory is configured the bytes are also written there; archive
/// failures are logged but do not fail the run.
pub async fn run_snapshot(
    capture: &dyn PageCapture,
    delivery: &dyn SnapshotDelivery,
    page_url: &str,
    recipient: &str,
    archive_dir: Option<&Path>,
    today: NaiveDate,
) -> Result<(), SnapshotError> {
    info!("Capturing {page_url}");
    let bytes = capture.capture(page_url).await?;
    info!("Captured {} bytes", bytes.len());

    let filename = format!("earnings-calendar-{}.png", today.format("%Y-%m-%d"));

    if let Some(dir) = archive_dir {
        if let Err(err) = archive_snapshot(dir, &filename, &bytes).await {
            warn!("failed to archive snapshot to {}: {err}", dir.display());
        }
    }

    let subject = format!("Earnings calendar {}", today.format("%Y-%m-%d"));
    delivery
        .deliver(recipient, &subject, &filename, bytes)
        .await?;

    info!("Snapshot delivered to {recipient} as {filename}");
    Ok(())
}

async fn archive_snapshot(dir: &Path, filename: &str, bytes: &[u8]) -> std::io::Result<()> {
    tokio::fs::create_dir_all(dir).await?;
    tokio::fs::write(dir.join(filename), bytes).await
}

/// Spawn the daily snapshot poster (once per day inside the configured
/// UTC hour).
pub fn spawn_snapshot_poster(
    capture: Arc<dyn PageCapture>,
    delivery: Arc<dyn SnapshotDelivery>,
    page_url: String,
    recipient: String,
    archive_dir: Option<PathBuf>,
) -> Option<JoinHandle<()>> {
    if env::var("ENABLE_SNAPSHOT_POSTER")
        .map(|v| v == "0")
        .unwrap_or(false)
    {
        info!("Snapshot poster disabled via ENABLE_SNAPSHOT_POSTER=0");
        return None;
    }

    let post_hour = env::var("SNAPSHOT_HOUR_UTC")
        .ok()
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|h| *h < 24)
        .unwrap_or(21);

    info!("Starting snapshot poster for {page_url} at {post_hour:02}:00 UTC");

    Some(tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(60));
        loop {
            interval.tick().await;
            if should_post_now(post_hour).await {
                let today = Utc::now().date_naive();
                if let Err(e) = run_snapshot(
                    capture.as_ref(),
                    delivery.as_ref(),
                    &page_url,
                    &recipient,
                    archive_dir.as_deref(),
                    today,
                )
                .await
                {
                    warn!("snapshot poster iteration failed: {e}");
                }
            }
        }
    }))
}

async fn should_post_now(post_hour: u32) -> bool {
    let now = Utc::now();

    // Allow a small window to avoid missing the minute
    if !(now.hour() == post_hour && now.minute() < 5) {
        return false;
    }

    let today = now.date_naive();
    let mut last = LAST_SNAPSHOT_DATE.lock().await;
    if let Some(prev) = *last {
        if prev == today {
            return false;
        }
    }
    *last = Some(today);
    true
}
