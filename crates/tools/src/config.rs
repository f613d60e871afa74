use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tt_core::WeekdayEncoding;
use tt_features::ValidityConfig;
use tt_views::TopKConfig;

/// Everything a cleaning or ranking run needs. Loaded from JSON; missing keys
/// fall back to the defaults below.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PipelineConfig {
    pub input: PathBuf,
    pub cleaned_output: PathBuf,
    pub exclusion_log: PathBuf,
    /// When set, `trips.csv`, `locations.csv` and `vendors.csv` are written here.
    pub storage_dir: Option<PathBuf>,
    pub weekday_encoding: WeekdayEncoding,
    pub validity: ValidityConfig,
    pub top_k: TopKConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: PathBuf::from("train.csv"),
            cleaned_output: PathBuf::from("cleaned_train.csv"),
            exclusion_log: PathBuf::from("excluded_records.log"),
            storage_dir: None,
            weekday_encoding: WeekdayEncoding::SundayZero,
            validity: ValidityConfig::default(),
            top_k: TopKConfig::default(),
        }
    }
}

impl PipelineConfig {
    pub fn from_json(data: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(data).context("invalid pipeline config JSON")?;
        cfg.validity.validate()?;
        Ok(cfg)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_json(&data).with_context(|| format!("loading config {}", path.display()))
    }

    /// Load `path` when given, otherwise start from the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}
