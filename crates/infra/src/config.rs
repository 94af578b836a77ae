//! Runtime configuration from environment variables.
//!
//! Every setting has a default. Unusable values fall back to it with a
//! warning; because the log format is itself configured here, warnings are
//! buffered until [`Config::report_warnings`] runs after the subscriber is
//! installed.

use std::path::PathBuf;

use pharmstock_observability::LogFormat;

pub const DATA_DIR_VAR: &str = "PHARMSTOCK_DATA_DIR";
pub const STORAGE_KEY_VAR: &str = "PHARMSTOCK_STORAGE_KEY";
pub const LOG_FORMAT_VAR: &str = "PHARMSTOCK_LOG_FORMAT";

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_STORAGE_KEY: &str = "myDrugSystemData_v3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub storage_key: String,
    pub log_format: LogFormat,
    warnings: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            log_format: LogFormat::default(),
            warnings: Vec::new(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same parsing as [`Config::from_env`] over an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(dir) = non_blank(&lookup, DATA_DIR_VAR, &mut config.warnings) {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(key) = non_blank(&lookup, STORAGE_KEY_VAR, &mut config.warnings) {
            config.storage_key = key;
        }

        if let Some(raw) = non_blank(&lookup, LOG_FORMAT_VAR, &mut config.warnings) {
            match raw.parse::<LogFormat>() {
                Ok(format) => config.log_format = format,
                Err(_) => config.warnings.push(format!(
                    "{LOG_FORMAT_VAR}={raw:?} is not one of json|pretty; using {}",
                    config.log_format
                )),
            }
        }

        config
    }

    /// Problems found while reading the environment, one message each.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn report_warnings(&self) {
        for warning in &self.warnings {
            tracing::warn!("{warning}");
        }
    }
}

fn non_blank(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    warnings: &mut Vec<String>,
) -> Option<String> {
    let value = lookup(name)?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        warnings.push(format!("{name} is set but empty; using default"));
        return None;
    }
    Some(trimmed.to_string())
}
