use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

const SETTINGS_FILE: &str = "settings.json";

/// User-tunable settings, read from `<config dir>/focus-hub/settings.json`.
/// Every field has a default so a partial file is fine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub github_api_url: String,
    pub agent_api_url: String,
    /// Run against the built-in demo data even inside the desktop shell.
    pub mock_data: bool,
    pub search_debounce_ms: u64,
    pub mock_latency: MockLatency,
    pub log_level: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MockLatency {
    pub search_ms: u64,
    pub details_ms: u64,
    pub dispatch_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            github_api_url: "https://api.github.com".to_string(),
            agent_api_url: "https://api.jules.ai".to_string(),
            mock_data: false,
            search_debounce_ms: 300,
            mock_latency: MockLatency::default(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for MockLatency {
    fn default() -> Self {
        Self {
            search_ms: 400,
            details_ms: 300,
            dispatch_ms: 1500,
        }
    }
}

impl MockLatency {
    /// No artificial delay at all.
    #[cfg(test)]
    pub fn none() -> Self {
        Self {
            search_ms: 0,
            details_ms: 0,
            dispatch_ms: 0,
        }
    }

    pub fn search(&self) -> Duration {
        Duration::from_millis(self.search_ms)
    }

    pub fn details(&self) -> Duration {
        Duration::from_millis(self.details_ms)
    }

    pub fn dispatch(&self) -> Duration {
        Duration::from_millis(self.dispatch_ms)
    }
}

impl Settings {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("focus-hub").join(SETTINGS_FILE))
    }

    /// Load from the default location, falling back to defaults when the file
    /// is absent or broken.
    pub fn load() -> Self {
        let Some(path) = Self::default_path() else {
            log::warn!("No config directory available, using default settings");
            return Self::default();
        };
        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::error!("Failed to load settings: {e}");
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("Settings file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| Error::Config {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn log_level(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or_else(|_| {
            log::warn!("Unknown log level {:?}, using info", self.log_level);
            log::LevelFilter::Info
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.search_debounce(), Duration::from_millis(300));
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{ "mock_data": true, "mock_latency": {{ "dispatch_ms": 10 }} }}"#
        )
        .unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert!(settings.mock_data);
        assert_eq!(settings.mock_latency.dispatch_ms, 10);
        assert_eq!(settings.mock_latency.search_ms, 400);
        assert_eq!(settings.github_api_url, "https://api.github.com");
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(Settings::load_from(&path), Err(Error::Config { .. })));
    }

    #[test]
    fn test_log_level_parsing() {
        let mut settings = Settings::default();
        assert_eq!(settings.log_level(), log::LevelFilter::Info);
        settings.log_level = "debug".to_string();
        assert_eq!(settings.log_level(), log::LevelFilter::Debug);
        settings.log_level = "chatty".to_string();
        assert_eq!(settings.log_level(), log::LevelFilter::Info);
    }
}
