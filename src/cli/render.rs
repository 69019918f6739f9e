use crate::core::config::AppConfig;
use crate::dashboard;
use anyhow::{Context, Result};

/// Re-renders the dashboard from the stored history without fetching.
pub fn run(config: &AppConfig) -> Result<()> {
    let store = super::open_store(config)?;
    let path = config.dashboard_path()?;
    dashboard::write(&store, &super::dashboard_options(config), &path)
        .with_context(|| format!("Failed to write dashboard: {}", path.display()))?;
    println!("Dashboard: {}", path.display());
    Ok(())
}
