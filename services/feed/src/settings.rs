//! Service settings
//!
//! Layered with the `config` crate: built-in defaults, then an optional
//! file (`FEED_CONFIG`, default `config/feed`), then `FEED_*` environment
//! variables using `__` between sections, e.g. `FEED_SERVER__PORT=9000`.

use common::database::DatabaseConfig;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::{env, path::PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "config/feed";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub paths: PathSettings,
    pub database: DatabaseConfig,
    pub auth: AuthSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl ServerSettings {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Directory holding the fixture documents
    pub data_dir: PathBuf,
    /// Directory served under `/api/file`
    pub file_dir: PathBuf,
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("public/data"),
            file_dir: PathBuf::from("public/data"),
        }
    }
}

/// Who the current user is when a request carries no token, and how
/// tokens are verified when it does
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub default_user_uid: Option<String>,
    /// RSA public key in PEM form, or a path to one
    pub jwt_public_key: Option<String>,
}

impl Settings {
    /// Load from the file named by `FEED_CONFIG` and the environment
    pub fn load() -> Result<Self, ConfigError> {
        let file = env::var("FEED_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());
        Self::load_from(&file)
    }

    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(file).required(false))
            .add_source(
                Environment::with_prefix("FEED")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn defaults_apply_without_sources() {
        let settings = Settings::load_from("does/not/exist").unwrap();

        assert_eq!(settings.server.bind_address(), "0.0.0.0:8080");
        assert_eq!(settings.paths.data_dir, PathBuf::from("public/data"));
        assert!(!settings.database.use_db);
        assert_eq!(settings.database.query_timeout_ms, 5000);
        assert!(settings.auth.default_user_uid.is_none());
    }

    #[test]
    #[serial]
    fn file_then_environment() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("feed.json");
        std::fs::write(
            &file,
            r#"{
                "server": {"port": 3000},
                "paths": {"data_dir": "/srv/fixtures"},
                "auth": {"default_user_uid": "demo"}
            }"#,
        )
        .unwrap();

        unsafe {
            std::env::set_var("FEED_SERVER__PORT", "9000");
            std::env::set_var("FEED_DATABASE__USE_DB", "true");
        }

        let settings = Settings::load_from(file.to_str().unwrap()).unwrap();

        unsafe {
            std::env::remove_var("FEED_SERVER__PORT");
            std::env::remove_var("FEED_DATABASE__USE_DB");
        }

        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.paths.data_dir, PathBuf::from("/srv/fixtures"));
        assert_eq!(settings.paths.file_dir, PathBuf::from("public/data"));
        assert!(settings.database.use_db);
        assert_eq!(settings.auth.default_user_uid.as_deref(), Some("demo"));
    }
}
