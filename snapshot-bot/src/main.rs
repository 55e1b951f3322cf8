use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use snapshot_bot::automation::snapshot::{
    self, MailRelayDelivery, PageCapture, RenderServiceCapture, SnapshotDelivery,
};

fn read_env_var(key: &str) -> Result<String, Box<dyn std::error::Error>> {
    let raw = env::var(key)?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(format!("{key} is set but empty").into());
    }
    Ok(trimmed.to_string())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter("info")
        .compact()
        .init();

    let page_url = read_env_var("SNAPSHOT_PAGE_URL")?;
    let renderer_url = read_env_var("RENDER_SERVICE_URL")?;
    let relay_url = read_env_var("MAIL_RELAY_URL")?;
    let recipient = read_env_var("MAIL_RECIPIENT")?;
    let archive_dir = env::var("SNAPSHOT_DIR")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from);

    let capture: Arc<dyn PageCapture> = Arc::new(RenderServiceCapture::new(renderer_url)?);
    let delivery: Arc<dyn SnapshotDelivery> = Arc::new(MailRelayDelivery::new(relay_url)?);

    if env::args().any(|arg| arg == "--once") {
        // Single pass; a failed run is fatal to that run.
        snapshot::run_snapshot(
            capture.as_ref(),
            delivery.as_ref(),
            &page_url,
            &recipient,
            archive_dir.as_deref(),
            Utc::now().date_naive(),
        )
        .await?;
        return Ok(());
    }

    match snapshot::spawn_snapshot_poster(capture, delivery, page_url, recipient, archive_dir) {
        Some(handle) => handle.await?,
        None => info!("snapshot poster not started; exiting"),
    }

    Ok(())
}
