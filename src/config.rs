//! Application configuration
//!
//! Values are resolved in three layers:
//! 1. Built-in defaults
//! 2. `config.json` in the user config directory
//!    (e.g. ~/.config/travel-tracker/config.json on Linux)
//! 3. `TRAVEL_TRACKER_*` environment variables
//!
//! A missing config file is normal; a malformed one is logged and ignored.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::geocode::nominatim::DEFAULT_BASE_URL;
use crate::state::ValidationRules;

const APP_DIR: &str = "travel-tracker";
const CONFIG_FILE: &str = "config.json";
const DATABASE_FILE: &str = "travel_tracker.db";

/// Which surface the tracker shows locations on
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Globe,
    Map,
}

impl ViewMode {
    pub fn toggled(self) -> Self {
        match self {
            ViewMode::Globe => ViewMode::Map,
            ViewMode::Map => ViewMode::Globe,
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "globe" | "3d" => Some(ViewMode::Globe),
            "map" | "2d" => Some(ViewMode::Map),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Directory holding the location database
    pub data_dir: PathBuf,
    /// Storage slot for this tracker's list
    pub storage_key: String,
    /// Base URL of the Nominatim-compatible geocoding service
    pub geocoder_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
    /// Refuse locations without a visit date
    pub require_date: bool,
    /// Lifetime of the white selection marker
    pub temporary_marker_ttl_ms: u64,
    pub initial_view: ViewMode,
}

impl Default for AppConfig {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR);

        Self {
            data_dir,
            storage_key: "trips".to_string(),
            geocoder_url: DEFAULT_BASE_URL.to_string(),
            user_agent: format!("travel-tracker/{}", env!("CARGO_PKG_VERSION")),
            request_timeout_secs: 10,
            require_date: false,
            temporary_marker_ttl_ms: 2000,
            initial_view: ViewMode::Globe,
        }
    }
}

impl AppConfig {
    /// Resolve the configuration from file and environment
    pub fn load() -> Self {
        let mut config = match dirs::config_dir() {
            Some(dir) => Self::from_file(&dir.join(APP_DIR).join(CONFIG_FILE)),
            None => Self::default(),
        };
        config.apply_env(|name| std::env::var(name).ok());
        config
    }

    /// Read a config file, falling back to defaults when it is absent or unreadable
    pub fn from_file(path: &Path) -> Self {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(err) => {
                tracing::warn!("⚠️  Could not read {}: {}", path.display(), err);
                return Self::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(config) => {
                tracing::info!("⚙️  Loaded configuration from {}", path.display());
                config
            }
            Err(err) => {
                tracing::warn!("⚠️  Ignoring malformed {}: {}", path.display(), err);
                Self::default()
            }
        }
    }

    /// Override fields from `TRAVEL_TRACKER_*` variables
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(dir) = var("TRAVEL_TRACKER_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }
        if let Some(key) = var("TRAVEL_TRACKER_STORAGE_KEY").filter(|k| !k.trim().is_empty()) {
            self.storage_key = key;
        }
        if let Some(url) = var("TRAVEL_TRACKER_GEOCODER_URL") {
            self.geocoder_url = url;
        }
        if let Some(flag) = var("TRAVEL_TRACKER_REQUIRE_DATE") {
            match flag.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => self.require_date = true,
                "0" | "false" | "no" => self.require_date = false,
                other => tracing::warn!("⚠️  Ignoring TRAVEL_TRACKER_REQUIRE_DATE={}", other),
            }
        }
        if let Some(view) = var("TRAVEL_TRACKER_VIEW") {
            match ViewMode::parse(&view) {
                Some(mode) => self.initial_view = mode,
                None => tracing::warn!("⚠️  Ignoring TRAVEL_TRACKER_VIEW={}", view),
            }
        }
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn temporary_marker_ttl(&self) -> Duration {
        Duration::from_millis(self.temporary_marker_ttl_ms)
    }

    pub fn validation_rules(&self) -> ValidationRules {
        ValidationRules {
            require_date: self.require_date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.storage_key, "trips");
        assert_eq!(config.temporary_marker_ttl(), Duration::from_secs(2));
        assert!(config.database_path().ends_with("travel-tracker/travel_tracker.db"));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"storage_key": "holidayLocations", "initial_view": "map"}"#).unwrap();

        let config = AppConfig::from_file(&path);
        assert_eq!(config.storage_key, "holidayLocations");
        assert_eq!(config.initial_view, ViewMode::Map);
        assert_eq!(config.geocoder_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_malformed_or_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        assert_eq!(AppConfig::from_file(&path), AppConfig::default());

        std::fs::write(&path, "{ storage_key: ").unwrap();
        assert_eq!(AppConfig::from_file(&path), AppConfig::default());
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = AppConfig {
            storage_key: "fromfile".to_string(),
            ..AppConfig::default()
        };
        config.apply_env(env(&[
            ("TRAVEL_TRACKER_STORAGE_KEY", "fromenv"),
            ("TRAVEL_TRACKER_REQUIRE_DATE", "yes"),
            ("TRAVEL_TRACKER_VIEW", "2d"),
            ("TRAVEL_TRACKER_DATA_DIR", "/tmp/tracker"),
        ]));

        assert_eq!(config.storage_key, "fromenv");
        assert!(config.validation_rules().require_date);
        assert_eq!(config.initial_view, ViewMode::Map);
        assert_eq!(config.database_path(), PathBuf::from("/tmp/tracker/travel_tracker.db"));
    }

    #[test]
    fn test_bad_env_values_are_ignored() {
        let mut config = AppConfig::default();
        config.apply_env(env(&[
            ("TRAVEL_TRACKER_REQUIRE_DATE", "sometimes"),
            ("TRAVEL_TRACKER_VIEW", "hologram"),
            ("TRAVEL_TRACKER_STORAGE_KEY", "  "),
        ]));
        assert_eq!(config, AppConfig::default());
    }
}
