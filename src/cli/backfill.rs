use super::ui;
use crate::core::RateSource;
use crate::core::config::AppConfig;
use crate::jobs::{self, BackfillSummary};
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use std::fmt::Write;

/// Fills the configured window and persists the store if anything was added.
pub async fn run(
    config: &AppConfig,
    source: &dyn RateSource,
    today: NaiveDate,
) -> Result<BackfillSummary> {
    let mut store = super::open_store(config)?;

    let pb = ui::new_spinner("Fetching rates...");
    let summary = jobs::backfill::run(source, &mut store, today, config.backfill_days).await;
    pb.finish_and_clear();

    if summary.store_changed() {
        store
            .save()
            .with_context(|| format!("Failed to save store: {}", store.path().display()))?;
    }

    println!("{}", display_summary(&summary));
    println!(
        "{}",
        ui::style_text(
            &format!("Store: {} ({} days)", store.path().display(), store.len()),
            ui::StyleType::Subtle
        )
    );

    if summary.nothing_stored() {
        bail!(
            "Backfill of {} stored nothing: {} days failed",
            summary.window,
            summary.failed.len()
        );
    }
    Ok(summary)
}

fn join_dates(dates: &[NaiveDate]) -> String {
    dates
        .iter()
        .map(NaiveDate::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn display_summary(summary: &BackfillSummary) -> String {
    let mut output = format!(
        "Backfill {}\n",
        ui::style_text(&summary.window.to_string(), ui::StyleType::Title)
    );
    let _ = writeln!(
        output,
        "  inserted: {}, already stored: {}",
        ui::style_text(&summary.inserted.len().to_string(), ui::StyleType::TotalValue),
        summary.already_present
    );
    if !summary.skipped.is_empty() {
        let _ = writeln!(
            output,
            "  skipped {} (no published rate): {}",
            summary.skipped.len(),
            join_dates(&summary.skipped)
        );
    }
    for failed in &summary.failed {
        let _ = writeln!(
            output,
            "  {} {} [{}]: {}",
            ui::style_text("failed", ui::StyleType::Error),
            failed.date,
            failed.kind,
            failed.reason
        );
    }
    output.trim_end().to_string()
}
