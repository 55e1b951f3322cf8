use std::env;

use anyhow::{bail, Result};
use dotenv::dotenv;
use tracing::info;

use earnings_watch::service::calendar::{CalendarConfig, CalendarService};
use earnings_watch::service::report::format_output;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    let (start, end) = match args.as_slice() {
        [_, start, end] => (start.as_str(), end.as_str()),
        _ => bail!("usage: earnings-watch <start-date> <end-date> (both %Y-%m-%d)"),
    };

    let config = CalendarConfig::from_env();
    info!(
        "Querying {} for {start}..{end} (cap {}, offset {} min)",
        config.base_url, config.rank_cap, config.offset_minutes
    );

    let service = CalendarService::new(config)?;
    let events = service.query(start, end).await?;

    if events.is_empty() {
        println!("No earnings events between {start} and {end}.");
        return Ok(());
    }

    println!("{}", format_output(&events));

    Ok(())
}
