#![deny(unsafe_code)]

//! Project configuration for autorequire.
//!
//! Loads the `.autorequire.json` file found at a project root. Missing keys are
//! filled from built-in defaults by a structural [`reconcile`] that preserves
//! unknown keys, so a file written for a newer release keeps its extra settings
//! when read by an older one.
//!
//! Two loading modes exist:
//!
//! - [`AutoRequireConfig::parse`] / [`AutoRequireConfig::load`] are strict and
//!   return a [`ConfigError`].
//! - [`ConfigReader`] never fails: it falls back to defaults for anything it
//!   cannot read and logs a warning instead.

/// Lenient, reloadable configuration reader.
pub mod reader;
/// Structural merge of a JSON value with a default template.
pub mod reconcile;

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use reader::ConfigReader;
pub use reconcile::reconcile;

/// File name of the project configuration, relative to the project root.
pub const CONFIG_FILE_NAME: &str = ".autorequire.json";

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

/// Top-level project configuration.
///
/// Keys are camelCase on disk to match the rest of the editor tooling.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoRequireConfig {
    /// Path prefixes whose modules only run on the server.
    #[serde(default)]
    pub server_directories: Vec<String>,

    /// Path prefixes whose modules only run on the client.
    #[serde(default)]
    pub client_directories: Vec<String>,

    /// Offer modules nested under another module even from unrelated files.
    #[serde(default)]
    pub always_show_sub_modules: bool,

    /// Skip the server/client compatibility check entirely.
    #[serde(default)]
    pub ignore_environment: bool,

    /// Keys this release does not know about, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AutoRequireConfig {
    /// Load configuration from a JSON file at the given path using async I/O.
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// Parse configuration from a JSON string, filling absent keys from defaults.
    pub fn parse(s: &str) -> Result<Self, ConfigError> {
        let value: Value = serde_json::from_str(s)?;
        if !value.is_object() {
            return Err(ConfigError::Validation(
                "configuration root must be a JSON object".to_string(),
            ));
        }
        let merged = reconcile(value, Self::default_template());
        let mut config: AutoRequireConfig = serde_json::from_value(merged)?;
        config.validate()?;
        config.normalize();
        Ok(config)
    }

    /// The defaults as a JSON value, used as the [`reconcile`] template.
    pub fn default_template() -> Value {
        serde_json::json!({
            "serverDirectories": [],
            "clientDirectories": [],
            "alwaysShowSubModules": false,
            "ignoreEnvironment": false,
        })
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, dirs) in [
            ("serverDirectories", &self.server_directories),
            ("clientDirectories", &self.client_directories),
        ] {
            for (i, dir) in dirs.iter().enumerate() {
                if dir.trim().is_empty() {
                    return Err(ConfigError::Validation(format!(
                        "{key}[{i}] must not be empty"
                    )));
                }
                if !names_directory(dir) {
                    return Err(ConfigError::Validation(format!(
                        "{key}[{i}] must name a directory below the project root"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Rewrite directory prefixes into the form used for matching.
    pub fn normalize(&mut self) {
        for dir in self
            .server_directories
            .iter_mut()
            .chain(self.client_directories.iter_mut())
        {
            *dir = normalize_path(dir.trim());
        }
    }

    /// Server directory prefixes, lowercased for case-insensitive matching.
    pub fn server_prefixes(&self) -> Vec<String> {
        lowercase_prefixes(&self.server_directories)
    }

    /// Client directory prefixes, lowercased for case-insensitive matching.
    pub fn client_prefixes(&self) -> Vec<String> {
        lowercase_prefixes(&self.client_directories)
    }
}

fn lowercase_prefixes(dirs: &[String]) -> Vec<String> {
    dirs.iter()
        .map(|d| normalize_path(d).to_lowercase())
        .filter(|d| names_directory(d))
        .collect()
}

/// Whether `dir` still names something once normalized and stripped of `/`.
/// A prefix of `/` or `./` would otherwise match every path.
pub fn names_directory(dir: &str) -> bool {
    !normalize_path(dir.trim()).trim_matches('/').is_empty()
}

/// Normalize a project-relative path: forward slashes, no leading `./`,
/// no repeated separators.
///
/// `normalize_path("src\\server\\.\\Combat.luau")` → `"src/server/Combat.luau"`
pub fn normalize_path(path: &str) -> String {
    let unified = path.replace('\\', "/");
    let absolute = unified.starts_with('/');
    let parts: Vec<&str> = unified
        .split('/')
        .filter(|part| !part.is_empty() && *part != ".")
        .collect();
    let joined = parts.join("/");
    if absolute {
        format!("/{joined}")
    } else {
        joined
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = AutoRequireConfig::default();
        assert!(config.server_directories.is_empty());
        assert!(config.client_directories.is_empty());
        assert!(!config.always_show_sub_modules);
        assert!(!config.ignore_environment);
    }

    #[test]
    fn test_parse_empty_object() {
        let config = AutoRequireConfig::parse("{}").unwrap();
        assert_eq!(config, AutoRequireConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let json = r#"{
            "serverDirectories": ["src/server", "src\\shared\\server"],
            "clientDirectories": ["./src/client"],
            "alwaysShowSubModules": true,
            "ignoreEnvironment": true
        }"#;
        let config = AutoRequireConfig::parse(json).unwrap();
        assert_eq!(
            config.server_directories,
            vec!["src/server".to_string(), "src/shared/server".to_string()]
        );
        assert_eq!(config.client_directories, vec!["src/client".to_string()]);
        assert!(config.always_show_sub_modules);
        assert!(config.ignore_environment);
    }

    #[test]
    fn test_parse_preserves_unknown_keys() {
        let json = r#"{ "enableModuleCollection": true, "serverDirectories": [] }"#;
        let config = AutoRequireConfig::parse(json).unwrap();
        assert_eq!(
            config.extra.get("enableModuleCollection"),
            Some(&Value::Bool(true))
        );

        let round_trip = serde_json::to_value(&config).unwrap();
        assert_eq!(round_trip["enableModuleCollection"], Value::Bool(true));
        assert_eq!(round_trip["ignoreEnvironment"], Value::Bool(false));
    }

    #[test]
    fn test_validation_rejects_empty_directory() {
        let json = r#"{ "serverDirectories": ["src/server", "  "] }"#;
        let err = AutoRequireConfig::parse(json).unwrap_err();
        assert_eq!(
            err.to_string(),
            "validation error: serverDirectories[1] must not be empty"
        );
    }

    #[test]
    fn test_validation_rejects_root_prefix() {
        for dir in ["/", "./", "\\", "/./"] {
            let json = serde_json::json!({ "clientDirectories": [dir] }).to_string();
            let err = AutoRequireConfig::parse(&json).unwrap_err();
            assert_eq!(
                err.to_string(),
                "validation error: clientDirectories[0] must name a directory below the project root"
            );
        }
        assert!(names_directory("/src/client"));
        assert!(!names_directory(" ./ "));
    }

    #[test]
    fn test_parse_rejects_non_object() {
        let result = AutoRequireConfig::parse("[1, 2, 3]");
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_parse_rejects_wrong_type() {
        let result = AutoRequireConfig::parse(r#"{ "alwaysShowSubModules": "yes" }"#);
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_prefixes_are_lowercased() {
        let config = AutoRequireConfig::parse(r#"{ "clientDirectories": ["Src/Client"] }"#).unwrap();
        assert_eq!(config.client_prefixes(), vec!["src/client".to_string()]);
        assert!(config.server_prefixes().is_empty());
    }

    #[test]
    fn test_normalize_path() {
        assert_eq!(normalize_path("src\\server\\Combat.luau"), "src/server/Combat.luau");
        assert_eq!(normalize_path("./src//client/./Input.lua"), "src/client/Input.lua");
        assert_eq!(normalize_path("/abs/path/"), "/abs/path");
        assert_eq!(normalize_path(""), "");
    }

    // ── Async file-based loading ──────────────────────────────────────

    #[test_log::test(tokio::test)]
    async fn test_load_from_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        tokio::fs::write(&path, br#"{ "serverDirectories": ["src/server"] }"#)
            .await
            .unwrap();

        let config = AutoRequireConfig::load(&path).await.unwrap();
        assert_eq!(config.server_directories, vec!["src/server".to_string()]);
    }

    #[tokio::test]
    async fn test_load_nonexistent_file() {
        let result = AutoRequireConfig::load(Path::new("/nonexistent/.autorequire.json")).await;
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[tokio::test]
    async fn test_load_invalid_json_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(CONFIG_FILE_NAME);
        tokio::fs::write(&path, b"{ not json").await.unwrap();

        let result = AutoRequireConfig::load(&path).await;
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    // ── Error display ─────────────────────────────────────────────────

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Validation("bad value".to_string());
        assert_eq!(err.to_string(), "validation error: bad value");
    }
}
