//! Configuration builders for tests.
//!
//! Use [`TestConfigBuilder`] to create customised [`AutoRequireConfig`] values
//! without repeating boilerplate across crate boundaries.

use autorequire_config::AutoRequireConfig;
use serde_json::Value;

/// Fluent builder for [`AutoRequireConfig`] in tests.
///
/// # Example
///
/// ```ignore
/// let config = TestConfigBuilder::new()
///     .server_directory("src/server")
///     .ignore_environment(true)
///     .build();
/// ```
pub struct TestConfigBuilder {
    config: AutoRequireConfig,
}

impl TestConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: AutoRequireConfig::default(),
        }
    }

    pub fn server_directory(mut self, dir: &str) -> Self {
        self.config.server_directories.push(dir.to_string());
        self
    }

    pub fn client_directory(mut self, dir: &str) -> Self {
        self.config.client_directories.push(dir.to_string());
        self
    }

    pub fn always_show_sub_modules(mut self, enabled: bool) -> Self {
        self.config.always_show_sub_modules = enabled;
        self
    }

    pub fn ignore_environment(mut self, enabled: bool) -> Self {
        self.config.ignore_environment = enabled;
        self
    }

    pub fn extra(mut self, key: &str, value: Value) -> Self {
        self.config.extra.insert(key.to_string(), value);
        self
    }

    /// The config with directory prefixes normalized, as a loaded file would be.
    pub fn build(mut self) -> AutoRequireConfig {
        self.config.normalize();
        self.config
    }

    /// The config as `.autorequire.json` file contents.
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(&self.config).expect("config serializes")
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
