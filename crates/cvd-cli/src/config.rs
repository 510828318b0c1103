//! `cvd.toml` loading. A missing or broken file falls back to defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Deserialize, Default, Clone, Debug)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Deserialize, Default, Clone, Debug)]
pub struct DataConfig {
    /// JSON array of case records. `None` means the built-in sample.
    #[serde(default)]
    pub records: Option<PathBuf>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct DisplayConfig {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub json: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            json: false,
        }
    }
}

fn default_limit() -> usize {
    50
}

impl Config {
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Config::default();
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Failed to read config {:?}: {}", path, e);
                return Config::default();
            }
        };

        let mut config: Config = match toml::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring invalid config {:?}: {}", path, e);
                return Config::default();
            }
        };

        // Relative record paths are relative to the config file.
        if let (Some(records), Some(dir)) = (config.data.records.as_mut(), path.parent()) {
            if records.is_relative() {
                *records = dir.join(&*records);
            }
        }

        config
    }
}
