use std::fs;
use std::path::PathBuf;

use directories::BaseDirs;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default poll cadence for both the conversation list and the active
/// conversation's detail, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 3000;

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Backend base URL, e.g. `http://localhost:8000`.
    pub base_url: String,
    /// This client's own account id; messages from this sender render as
    /// "sent by me" and stamp optimistic sends. Set once at startup.
    pub self_id: String,
    #[serde(default = "default_poll_interval")]
    pub list_poll_interval_ms: u64,
    #[serde(default = "default_poll_interval")]
    pub detail_poll_interval_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            self_id: "918329446654".to_string(),
            list_poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            detail_poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

impl Config {
    fn config_path() -> Result<PathBuf, ConfigError> {
        let base = BaseDirs::new().ok_or(ConfigError::NoConfigDir)?;
        Ok(base.config_dir().join("wachat.toml"))
    }

    /// Load from the user config dir, falling back to defaults when the file
    /// does not exist yet.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;
        match fs::read_to_string(&path) {
            Ok(text) => Ok(toml::from_str(&text)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        let path = Self::config_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_interval_fields_take_the_default() {
        let cfg: Config =
            toml::from_str("base_url = \"http://localhost:8000\"\nself_id = \"me\"\n").unwrap();
        assert_eq!(cfg.list_poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
        assert_eq!(cfg.detail_poll_interval_ms, DEFAULT_POLL_INTERVAL_MS);
    }

    #[test]
    fn round_trips_through_toml() {
        let cfg = Config::default();
        let text = toml::to_string_pretty(&cfg).unwrap();
        let back: Config = toml::from_str(&text).unwrap();
        assert_eq!(back.base_url, cfg.base_url);
        assert_eq!(back.self_id, cfg.self_id);
    }
}
