use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_FRANKFURTER_URL: &str = "https://api.frankfurter.app";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FrankfurterProviderConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for FrankfurterProviderConfig {
    fn default() -> Self {
        FrankfurterProviderConfig {
            base_url: DEFAULT_FRANKFURTER_URL.to_string(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct ProvidersConfig {
    #[serde(default)]
    pub frankfurter: FrankfurterProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    #[serde(default = "default_home_currency")]
    pub home_currency: String,
    #[serde(default = "default_currencies")]
    pub currencies: Vec<String>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    pub data_path: Option<String>,
    pub dashboard_path: Option<String>,
    #[serde(default = "default_backfill_days")]
    pub backfill_days: u32,
    /// Days of history drawn in the dashboard charts; `None` draws everything
    #[serde(default = "default_chart_days")]
    pub chart_days: Option<u32>,
}

fn default_home_currency() -> String {
    "PLN".to_string()
}

fn default_currencies() -> Vec<String> {
    ["EUR", "USD", "GBP", "CHF"].map(String::from).to_vec()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_backfill_days() -> u32 {
    90
}

fn default_chart_days() -> Option<u32> {
    Some(365)
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            home_currency: default_home_currency(),
            currencies: default_currencies(),
            providers: ProvidersConfig::default(),
            data_path: None,
            dashboard_path: None,
            backfill_days: default_backfill_days(),
            chart_days: default_chart_days(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, falling back to built-in
    /// defaults when no config file was created yet.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using built-in defaults",
                config_path.display()
            );
            let config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "fxdash", "fxdash")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "fxdash", "fxdash")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn store_path(&self) -> Result<PathBuf> {
        let file_name = format!("history_{}.csv", self.home_currency.to_lowercase());
        Ok(self.data_dir()?.join(file_name))
    }

    pub fn dashboard_path(&self) -> Result<PathBuf> {
        match &self.dashboard_path {
            Some(path) => Ok(PathBuf::from(path)),
            None => Ok(self.data_dir()?.join("dashboard.html")),
        }
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        validate_code(&self.home_currency)?;
        if self.currencies.is_empty() {
            bail!("At least one currency must be tracked");
        }
        for (i, code) in self.currencies.iter().enumerate() {
            validate_code(code)?;
            if self.currencies[..i].contains(code) {
                bail!("Currency {code} is listed more than once");
            }
        }
        if self.currencies.contains(&self.home_currency) {
            bail!(
                "Home currency {} cannot also be a tracked currency",
                self.home_currency
            );
        }
        if self.backfill_days == 0 {
            bail!("backfill_days must be at least 1");
        }
        if self.providers.frankfurter.timeout_secs == 0 {
            bail!("providers.frankfurter.timeout_secs must be at least 1");
        }
        Ok(())
    }
}

fn validate_code(code: &str) -> Result<()> {
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        bail!("Invalid currency code: '{code}' (expected three uppercase letters)");
    }
    Ok(())
}
