pub mod cli;
pub mod core;
pub mod dashboard;
pub mod jobs;
pub mod providers;
pub mod store;

use crate::core::config::AppConfig;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::time::Duration;
use tracing::{debug, info};

pub enum AppCommand {
    Backfill,
    Daily,
    Render,
    Show,
}

fn load_config(config_path: Option<&str>) -> Result<AppConfig> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");
    Ok(config)
}

fn build_source(config: &AppConfig) -> Result<providers::frankfurter::FrankfurterProvider> {
    let provider = &config.providers.frankfurter;
    providers::frankfurter::FrankfurterProvider::new(
        &provider.base_url,
        &config.home_currency,
        &config.currencies,
        Duration::from_secs(provider.timeout_secs),
    )
    .context("Failed to build HTTP client")
}

/// Runs `command` with today's local date.
pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let today = chrono::Local::now().date_naive();
    run_command_on(command, config_path, today).await
}

/// Runs `command` as if the current date were `today`.
pub async fn run_command_on(
    command: AppCommand,
    config_path: Option<&str>,
    today: NaiveDate,
) -> Result<()> {
    info!("fxdash starting for {today}");
    let config = load_config(config_path)?;

    match command {
        AppCommand::Backfill => {
            let source = build_source(&config)?;
            cli::backfill::run(&config, &source, today).await?;
        }
        AppCommand::Daily => {
            let source = build_source(&config)?;
            cli::daily::run(&config, &source, today).await?;
        }
        AppCommand::Render => cli::render::run(&config)?,
        AppCommand::Show => cli::show::run(&config)?,
    }
    Ok(())
}
