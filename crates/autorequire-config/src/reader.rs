use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{AutoRequireConfig, names_directory, reconcile};

/// Reads the project configuration and keeps the last value it produced.
///
/// Unlike [`AutoRequireConfig::parse`], reading never fails. A missing file
/// yields the defaults, an unparsable file yields the defaults, and a key with
/// a value of the wrong type falls back to that key's default while the rest
/// of the file is kept.
#[derive(Debug, Clone)]
pub struct ConfigReader {
    path: PathBuf,
    current: AutoRequireConfig,
}

impl ConfigReader {
    /// Create a reader for `path` and perform the initial read.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = read_lenient(&path);
        Self { path, current }
    }

    /// Re-read the file without blocking the runtime and return the new
    /// configuration.
    pub async fn reload(&mut self) -> &AutoRequireConfig {
        let read = tokio::fs::read_to_string(&self.path).await;
        self.current = from_read(&self.path, read);
        &self.current
    }

    /// The configuration from the most recent read.
    pub fn config(&self) -> &AutoRequireConfig {
        &self.current
    }

    /// Path of the file being read.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_lenient(path: &Path) -> AutoRequireConfig {
    from_read(path, std::fs::read_to_string(path))
}

fn from_read(path: &Path, read: std::io::Result<String>) -> AutoRequireConfig {
    match read {
        Ok(content) => parse_lenient(&content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "Config file not found, using defaults");
            AutoRequireConfig::default()
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read config, using defaults");
            AutoRequireConfig::default()
        }
    }
}

/// Parse configuration text, recovering from every error with defaults.
pub fn parse_lenient(content: &str) -> AutoRequireConfig {
    if content.trim().is_empty() {
        return AutoRequireConfig::default();
    }

    let value: Value = match serde_json::from_str(content) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Config is not valid JSON, using defaults");
            return AutoRequireConfig::default();
        }
    };

    let Value::Object(user) = reconcile(value, AutoRequireConfig::default_template()) else {
        warn!("Config root is not an object, using defaults");
        return AutoRequireConfig::default();
    };

    let mut fields = user;
    let mut config = AutoRequireConfig {
        server_directories: take_field(&mut fields, "serverDirectories"),
        client_directories: take_field(&mut fields, "clientDirectories"),
        always_show_sub_modules: take_field(&mut fields, "alwaysShowSubModules"),
        ignore_environment: take_field(&mut fields, "ignoreEnvironment"),
        extra: Map::new(),
    };
    config.extra = fields;

    for dirs in [
        &mut config.server_directories,
        &mut config.client_directories,
    ] {
        let before = dirs.len();
        dirs.retain(|d| names_directory(d));
        if dirs.len() != before {
            warn!(dropped = before - dirs.len(), "Ignoring empty or root directory prefixes");
        }
    }
    config.normalize();
    config
}

/// Remove `key` from `fields` and deserialize it, or fall back to the default.
fn take_field<T: DeserializeOwned + Default>(fields: &mut Map<String, Value>, key: &str) -> T {
    match fields.remove(key) {
        Some(value) => serde_json::from_value(value).unwrap_or_else(|e| {
            warn!(key, error = %e, "Invalid config value, using default");
            T::default()
        }),
        None => T::default(),
    }
}
