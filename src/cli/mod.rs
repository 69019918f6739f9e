pub mod backfill;
pub mod daily;
pub mod render;
pub mod setup;
pub mod show;
pub mod ui;

use crate::core::config::AppConfig;
use crate::dashboard::DashboardOptions;
use crate::store::HistoricalStore;
use anyhow::{Context, Result};

pub(crate) fn open_store(config: &AppConfig) -> Result<HistoricalStore> {
    let path = config.store_path()?;
    HistoricalStore::open(&path, &config.currencies)
        .with_context(|| format!("Failed to load store: {}", path.display()))
}

pub(crate) fn dashboard_options(config: &AppConfig) -> DashboardOptions {
    DashboardOptions {
        home_currency: config.home_currency.clone(),
        chart_days: config.chart_days,
    }
}
