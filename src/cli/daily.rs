use super::ui;
use crate::core::RateSource;
use crate::core::config::AppConfig;
use crate::dashboard;
use crate::jobs::{self, DailyOutcome};
use anyhow::{Context, Result};
use chrono::NaiveDate;

/// Stores today's rate if missing, then re-renders the dashboard.
///
/// A failed fetch aborts before anything is written, so neither the store nor
/// the dashboard ends up showing a partial update.
pub async fn run(
    config: &AppConfig,
    source: &dyn RateSource,
    today: NaiveDate,
) -> Result<DailyOutcome> {
    let mut store = super::open_store(config)?;

    let pb = ui::new_spinner("Fetching today's rates...");
    let outcome = jobs::daily::run(source, &mut store, today).await;
    pb.finish_and_clear();
    let outcome = outcome.with_context(|| format!("Daily update for {today} failed"))?;

    if outcome.store_changed() {
        store
            .save()
            .with_context(|| format!("Failed to save store: {}", store.path().display()))?;
    }

    let dashboard_path = config.dashboard_path()?;
    dashboard::write(&store, &super::dashboard_options(config), &dashboard_path)
        .with_context(|| format!("Failed to write dashboard: {}", dashboard_path.display()))?;

    let message = match outcome {
        DailyOutcome::Inserted => format!("Stored rates for {today}"),
        DailyOutcome::AlreadyPresent => format!("Rates for {today} already stored"),
        DailyOutcome::CaughtUp(date) => {
            format!("No rates published for {today} yet, stored rates for {date}")
        }
        DailyOutcome::NotPublished => format!("No rates published for {today}"),
    };
    println!("{}", ui::style_text(&message, ui::StyleType::TotalLabel));
    println!("Dashboard: {}", dashboard_path.display());
    Ok(outcome)
}
