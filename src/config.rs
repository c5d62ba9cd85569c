//! Configuration file handling.
//!
//! Settings come from `salary_dash.toml` (or the file given with `--config`)
//! and are then overridden by command-line flags.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::Args;
use crate::error::DashboardError;

pub const DEFAULT_CONFIG_FILE: &'static str = "salary_dash.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub dashboard: DashboardConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
    /// CSV file with one salary record per row.
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
        }
    }
}

fn default_data_path() -> PathBuf {
    PathBuf::from("../output/cleaned_salaries.csv")
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardConfig {
    #[serde(default = "default_title")]
    pub title: String,

    /// How many distinct values each filter starts with.
    #[serde(default = "default_five")]
    pub default_selection: usize,

    /// Companies shown in the salary distribution chart.
    #[serde(default = "default_five")]
    pub top_companies: usize,

    /// Input polling interval of the event loop.
    #[serde(default = "default_tick_rate_ms")]
    pub tick_rate_ms: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            default_selection: default_five(),
            top_companies: default_five(),
            tick_rate_ms: default_tick_rate_ms(),
        }
    }
}

fn default_title() -> String {
    "Data Science & AI Job Salaries Dashboard 2025".to_string()
}

fn default_five() -> usize {
    5
}

fn default_tick_rate_ms() -> u64 {
    200
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log output goes here since the terminal is taken by the dashboard.
    #[serde(default = "default_log_file")]
    pub file: PathBuf,

    /// One of `error`, `warn`, `info`, `debug`, `trace`.
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: default_log_file(),
            level: default_level(),
        }
    }
}

fn default_log_file() -> PathBuf {
    PathBuf::from("salary_dash.log")
}

fn default_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, DashboardError> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, DashboardError> {
        Ok(toml::from_str(content)?)
    }

    /// Returns `Ok(None)` when there is no config file in the working directory.
    pub fn load_default() -> Result<Option<Self>, DashboardError> {
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            Ok(Some(Self::load(path)?))
        } else {
            Ok(None)
        }
    }

    /// Command-line flags win over file settings.
    pub fn merge_with_args(&mut self, args: &Args) {
        if let Some(ref data) = args.data {
            self.data.path = data.clone();
        }
        if let Some(ref log_file) = args.log_file {
            self.logging.file = log_file.clone();
        }
        if let Some(level) = args.log_level() {
            self.logging.level = level.to_string();
        }
    }

    pub fn log_level(&self) -> tracing::Level {
        self.logging.level.parse().unwrap_or(tracing::Level::INFO)
    }

    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}
