use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use crate::{
    errors::{QuoteError, Result},
    storage::json_backend::write_atomic,
    sync::gateway::DEFAULT_REMOTE_URL,
    utils::paths::{self, ensure_dir},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub remote_url: String,
    pub sync_interval_secs: u64,
    pub batch_limit: usize,
    pub request_timeout_secs: u64,
    pub periodic_sync: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            remote_url: DEFAULT_REMOTE_URL.into(),
            sync_interval_secs: 60,
            batch_limit: 10,
            request_timeout_secs: 10,
            periodic_sync: true,
        }
    }
}

impl Config {
    pub const KEYS: [&'static str; 5] = [
        "remote_url",
        "sync_interval_secs",
        "batch_limit",
        "request_timeout_secs",
        "periodic_sync",
    ];

    /// Updates one setting from its textual form.
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        let value = value.trim();
        match key.to_lowercase().as_str() {
            "remote_url" => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(QuoteError::Validation(
                        "remote_url must start with http:// or https://".into(),
                    ));
                }
                self.remote_url = value.to_string();
            }
            "sync_interval_secs" => self.sync_interval_secs = parse_positive(key, value)?,
            "batch_limit" => self.batch_limit = parse_positive(key, value)? as usize,
            "request_timeout_secs" => self.request_timeout_secs = parse_positive(key, value)?,
            "periodic_sync" => {
                self.periodic_sync = match value.to_ascii_lowercase().as_str() {
                    "on" | "true" | "yes" => true,
                    "off" | "false" | "no" => false,
                    _ => {
                        return Err(QuoteError::Validation(
                            "periodic_sync must be on or off".into(),
                        ))
                    }
                }
            }
            other => {
                return Err(QuoteError::Validation(format!(
                    "unknown config key `{}`",
                    other
                )))
            }
        }
        Ok(())
    }
}

fn parse_positive(key: &str, value: &str) -> Result<u64> {
    match value.parse::<u64>() {
        Ok(parsed) if parsed > 0 => Ok(parsed),
        _ => Err(QuoteError::Validation(format!(
            "{} must be a positive whole number",
            key
        ))),
    }
}

pub struct ConfigManager {
    base: PathBuf,
    path: PathBuf,
}

impl ConfigManager {
    pub fn new() -> Result<Self> {
        Self::with_base_dir(paths::app_data_dir())
    }

    pub fn with_base_dir(base: PathBuf) -> Result<Self> {
        ensure_dir(&base)?;
        Ok(Self {
            path: paths::config_file_in(&base),
            base,
        })
    }

    pub fn load(&self) -> Result<Config> {
        match fs::read_to_string(&self.path) {
            Ok(data) => serde_json::from_str(&data).map_err(|err| {
                QuoteError::Validation(format!(
                    "invalid configuration `{}`: {}",
                    self.path.display(),
                    err
                ))
            }),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Config::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        write_atomic(&self.path, &json)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Directory under which quote data is stored.
    pub fn data_dir(&self) -> PathBuf {
        paths::data_dir_in(&self.base)
    }
}
