//! Configuration and logging bootstrap.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::SaveError;

/// Settings for the file backend and logging.
///
/// Every field is optional in the JSON form; missing fields take their
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaveConfig {
    /// Directory holding one file per slot.
    pub saves_dir: PathBuf,
    pub app_name: String,
    /// Slot file extension, without the dot.
    pub extension: String,
    /// Write indented JSON.
    pub pretty: bool,
    /// `tracing` filter used when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for SaveConfig {
    /// Saves under the platform data directory, pretty JSON, `info` logging.
    fn default() -> Self {
        let app_name = "savekit".to_owned();
        Self {
            saves_dir: default_saves_dir(&app_name),
            app_name,
            extension: "json".to_owned(),
            pretty: true,
            log_filter: "info".to_owned(),
        }
    }
}

impl SaveConfig {
    /// Parse overrides from JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, SaveError> {
        serde_json::from_str(text).map_err(|e| SaveError::Config {
            path: PathBuf::from("<inline>"),
            details: e.to_string(),
        })
    }

    /// Read overrides from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SaveError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| SaveError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|e| SaveError::Config {
            path: path.to_path_buf(),
            details: e.to_string(),
        })
    }

    pub fn with_saves_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.saves_dir = dir.into();
        self
    }
}

/// `<data dir>/<app_name>/Saves`, or `./Saves` when the platform has no
/// data directory.
pub fn default_saves_dir(app_name: &str) -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(app_name).join("Saves"))
        .unwrap_or_else(|| PathBuf::from("./Saves"))
}

/// Install a `tracing-subscriber` formatter. `RUST_LOG` takes precedence
/// over `default_filter`. Returns `false` if a subscriber was already set.
pub fn init_logging(default_filter: &str) -> bool {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SaveConfig::default();
        assert_eq!(config.extension, "json");
        assert!(config.pretty);
        assert_eq!(config.log_filter, "info");
        assert!(config.saves_dir.ends_with("Saves"));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = SaveConfig::from_json_str(r#"{"pretty": false, "saves_dir": "/tmp/slots"}"#).unwrap();
        assert!(!config.pretty);
        assert_eq!(config.saves_dir, PathBuf::from("/tmp/slots"));
        assert_eq!(config.extension, "json");
    }

    #[test]
    fn malformed_json_is_a_config_error() {
        assert!(matches!(
            SaveConfig::from_json_str("{\"pretty\": 3}"),
            Err(SaveError::Config { .. })
        ));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("savekit.json");
        fs::write(&path, r#"{"extension": "sav"}"#).unwrap();
        assert_eq!(SaveConfig::load(&path).unwrap().extension, "sav");
        assert!(matches!(
            SaveConfig::load(dir.path().join("missing.json")),
            Err(SaveError::Io { .. })
        ));
    }

    #[test]
    fn init_logging_twice_is_harmless() {
        init_logging("debug");
        assert!(!init_logging("debug"));
    }
}
