use chrono::Utc;

use crate::models::EarningsEvent;

/// Render a ranked list as an aligned plain-text table, one row per
/// event: ticker, company, date, EPS, estimated EPS, revenue and
/// estimated revenue. Revenue figures display in millions of dollars.
pub fn format_output(events: &[EarningsEvent]) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "Earnings Calendar\nFetched: {} | Total: {}",
        Utc::now().format("%Y-%m-%d %H:%M UTC"),
        events.len()
    ));
    lines.push(String::new());
    lines.push(format!(
        "{:<8} {:<28} {:<12} {:>8} {:>10} {:>12} {:>12}",
        "Ticker", "Company", "Date", "EPS", "Est. EPS", "Revenue", "Est. Rev"
    ));

    for event in events {
        lines.push(format!(
            "{:<8} {:<28} {:<12} {:>8} {:>10} {:>12} {:>12}",
            event.ticker,
            clip(&event.company_name, 28),
            event.event_at.format("%Y-%m-%d"),
            fmt_dollars(event.eps),
            fmt_dollars(event.eps_est),
            fmt_millions(event.revenue),
            fmt_millions(event.revenue_est),
        ));
    }

    lines.join("\n")
}

fn fmt_dollars(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("${v:.2}"),
        None => "-".to_string(),
    }
}

fn fmt_millions(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("${:.2}M", v / 1_000_000.0),
        None => "-".to_string(),
    }
}

fn clip(name: &str, max: usize) -> String {
    if name.chars().count() <= max {
        name.to_string()
    } else {
        let cut: String = name.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
