//! Configuration loader with file and environment variable support

use crate::{AppConfig, ConfigError, PrimaryStore};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::{info, warn};

/// Standard config file search paths
const CONFIG_PATHS: &[&str] = &[
    "config.toml",
    "quill.toml",
    "./config/config.toml",
    "/etc/quill/config.toml",
];

/// Configuration loader
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader
    pub fn new() -> Self {
        Self { config_path: None }
    }

    /// Create a loader with a specific config file path
    pub fn with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            config_path: Some(path.into()),
        }
    }

    /// Load configuration from file (if found), apply environment overrides, validate
    pub fn load(&self) -> Result<AppConfig, ConfigError> {
        let mut config = match self.find_config_file() {
            Some(path) => {
                info!(?path, "Loading configuration from file");
                AppConfig::from_file(&path)?
            }
            None => AppConfig::default(),
        };

        apply_overrides(&mut config, |key| env::var(key).ok())?;
        config.validate()?;

        Ok(config)
    }

    fn find_config_file(&self) -> Option<PathBuf> {
        if let Some(path) = &self.config_path {
            if path.exists() {
                return Some(path.clone());
            }
            warn!(?path, "Configured config file does not exist");
        }

        if let Ok(path) = env::var("QUILL_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|path| path.exists())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Apply `QUILL_*` overrides read through `lookup`.
///
/// Unparseable numeric or boolean values are logged and ignored, an unknown
/// primary store name is an error.
pub(crate) fn apply_overrides<F>(config: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // HTTP
    if let Some(port) = parsed(&lookup, "QUILL_HTTP_PORT") {
        config.http.port = port;
    }
    if let Some(val) = lookup("QUILL_HTTP_HOST") {
        config.http.host = val;
    }
    if let Some(val) = lookup("QUILL_CORS_ORIGINS") {
        config.http.cors_origins = split_list(&val);
    }

    // Store selection
    if let Some(val) = lookup("QUILL_STORE_PRIMARY") {
        config.store.primary = val.parse::<PrimaryStore>()?;
    }
    if let Some(val) = parsed(&lookup, "QUILL_STORE_REPLICATE") {
        config.store.replicate_to_wide_column = val;
    }

    // Relational
    if let Some(val) = lookup("QUILL_DATABASE_URL") {
        config.database.url = val;
    }
    if let Some(val) = parsed(&lookup, "QUILL_DATABASE_MAX_CONNECTIONS") {
        config.database.max_connections = val;
    }

    // Wide-column
    if let Some(val) = lookup("QUILL_WIDE_COLUMN_NODES") {
        config.wide_column.nodes = split_list(&val);
    }
    if let Some(val) = lookup("QUILL_WIDE_COLUMN_KEYSPACE") {
        config.wide_column.keyspace = val;
    }

    // Auth
    if let Some(val) = lookup("QUILL_JWT_SECRET") {
        config.auth.jwt.secret = val;
    }
    if let Some(val) = lookup("QUILL_JWT_ISSUER") {
        config.auth.jwt.issuer = val;
    }
    if let Some(val) = parsed(&lookup, "QUILL_JWT_EXPIRY_SECS") {
        config.auth.jwt.access_token_expiry_secs = val;
    }

    // General
    if let Some(val) = parsed(&lookup, "QUILL_DEV_MODE") {
        config.dev_mode = val;
    }

    Ok(())
}

fn parsed<T, F>(lookup: &F, key: &str) -> Option<T>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring unparseable environment override");
            None
        }
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
