use crate::view::DetailLevel;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::Level;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_url: String,
    pub log_level: String,
    pub view: ViewSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ViewSettings {
    /// Include full message records instead of only their ids.
    pub expand_messages: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:mailthread.db?mode=rwc".to_string(),
            log_level: "info".to_string(),
            view: ViewSettings::default(),
        }
    }
}

impl Config {
    pub fn load() -> Self {
        Self::load_from("settings.toml")
    }

    /// Read settings from `path`, falling back to defaults when the file is
    /// missing or unreadable.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Self {
        use std::fs;
        if let Ok(content) = fs::read_to_string(path) {
            if let Ok(config) = toml::from_str(&content) {
                return config;
            }
        }
        Self::default()
    }

    pub fn detail_level(&self) -> DetailLevel {
        if self.view.expand_messages {
            DetailLevel::Expanded
        } else {
            DetailLevel::Ids
        }
    }

    pub fn log_level(&self) -> Level {
        Level::from_str(&self.log_level).unwrap_or(Level::INFO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_settings_keep_defaults() {
        let config: Config = toml::from_str("log_level = \"debug\"").unwrap();
        assert_eq!(config.log_level(), Level::DEBUG);
        assert_eq!(config.database_url, "sqlite:mailthread.db?mode=rwc");
        assert_eq!(config.detail_level(), DetailLevel::Ids);
    }

    #[test]
    fn view_section_selects_detail_level() {
        let config: Config = toml::from_str(
            "database_url = \"sqlite::memory:\"\n[view]\nexpand_messages = true\n",
        )
        .unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.detail_level(), DetailLevel::Expanded);
    }

    #[test]
    fn unknown_log_level_falls_back_to_info() {
        let config = Config {
            log_level: "chatty".to_string(),
            ..Default::default()
        };
        assert_eq!(config.log_level(), Level::INFO);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = Config::load_from("does/not/exist/settings.toml");
        assert_eq!(config.log_level, "info");
        assert!(!config.view.expand_messages);
    }
}
