use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::keyword::KeywordPair;
use crate::core::model::DEFAULT_REMINDER_DAYS;
use crate::error::ConfigError;
use crate::parse::Domain;

pub const APP_DIR: &str = "taskmail";

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("~/.local/share"))
        .join(APP_DIR)
}

fn default_reminder_days() -> i64 {
    DEFAULT_REMINDER_DAYS
}

fn default_folder() -> String {
    "INBOX".into()
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct ImapConfig {
    pub host: String,
    pub username: String,
    #[serde(default = "default_folder")]
    pub folder: String,
}

impl Default for ImapConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            username: String::new(),
            folder: default_folder(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub data_directory: PathBuf,
    #[serde(default = "default_reminder_days")]
    pub reminder_days: i64,
    pub debug_logging: bool,
    pub default_mode: Domain,
    pub imap: ImapConfig,
    /// Keyword pairs to start with when no keyword file has been saved yet.
    pub keywords: Vec<KeywordPair>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_directory: default_data_dir(),
            reminder_days: default_reminder_days(),
            debug_logging: false,
            default_mode: Domain::Task,
            imap: ImapConfig::default(),
            keywords: Vec::new(),
        }
    }
}

impl AppConfig {
    /// `~/.config/taskmail/config.json` or the platform equivalent.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join(APP_DIR)
            .join("config.json")
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Load the user config, falling back to defaults when it is missing or unreadable.
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Using default config, {} could not be read: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.data_directory.join("tasks.txt")
    }

    pub fn emails_path(&self) -> PathBuf {
        self.data_directory.join("emails.json")
    }

    pub fn keywords_path(&self) -> PathBuf {
        self.data_directory.join("keywords.json")
    }

    /// Ensure the data directory exists.
    pub fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.data_directory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "default_mode": "email", "imap": { "host": "imap.example.com" } }"#,
        )
        .unwrap();
        let config = AppConfig::load_from(&path).unwrap();
        assert_eq!(config.default_mode, Domain::Email);
        assert_eq!(config.reminder_days, 3);
        assert_eq!(config.imap.host, "imap.example.com");
        assert_eq!(config.imap.folder, "INBOX");
        assert!(config.keywords.is_empty());
    }

    #[test]
    fn data_paths_live_under_data_directory() {
        let config = AppConfig {
            data_directory: PathBuf::from("/tmp/tm"),
            ..AppConfig::default()
        };
        assert_eq!(config.tasks_path(), PathBuf::from("/tmp/tm/tasks.txt"));
        assert_eq!(config.emails_path(), PathBuf::from("/tmp/tm/emails.json"));
        assert_eq!(config.keywords_path(), PathBuf::from("/tmp/tm/keywords.json"));
    }

    #[test]
    fn malformed_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{").unwrap();
        assert!(matches!(AppConfig::load_from(&path), Err(ConfigError::Json(_))));
    }
}
