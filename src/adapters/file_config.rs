//! INI file configuration adapter.
//!
//! Sections: `[store]` selects the backend (`csv` with `data_dir`, or
//! `sqlite`), `[sqlite]` holds the database path, `[profile]` the fallback
//! initial balance used when no profile row exists, `[export]` the output
//! directory.

use configparser::ini::Ini;
use std::path::Path;

use crate::ports::config_port::ConfigPort;

pub struct FileConfig {
    config: Ini,
}

impl FileConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    /// Backend selector; `csv` unless configured otherwise.
    pub fn store_backend(&self) -> String {
        self.get_string("store", "backend")
            .unwrap_or_else(|| "csv".to_string())
    }

    /// Initial balance used when the store has no profile.
    pub fn default_initial_balance(&self) -> i64 {
        self.get_int("profile", "default_initial_balance", 0)
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfig {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> bool {
        self.config
            .get(section, key)
            .as_ref()
            .and_then(|v| Self::parse_bool(v))
            .unwrap_or(default)
    }
}
