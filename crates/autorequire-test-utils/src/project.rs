//! Temporary on-disk projects.

use std::path::{Path, PathBuf};

use autorequire_config::{AutoRequireConfig, CONFIG_FILE_NAME, ConfigReader};
use autorequire_core::Session;
use tempfile::TempDir;

/// A project root in a temp directory.
///
/// The directory is deleted automatically when this value is dropped,
/// guaranteeing cleanup even on panic.
pub struct TestProject {
    root: PathBuf,
    _temp_dir: TempDir,
}

impl TestProject {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        Self {
            root: temp_dir.path().to_path_buf(),
            _temp_dir: temp_dir,
        }
    }

    /// A project in a fresh directory under `parent`. When `parent` is
    /// relative, so is [`TestProject::root`].
    pub fn new_in(parent: impl AsRef<Path>) -> Self {
        let parent = parent.as_ref();
        let temp_dir = TempDir::new_in(parent).expect("failed to create temp dir");
        let name = temp_dir.path().file_name().expect("temp dir has a name");
        Self {
            root: parent.join(name),
            _temp_dir: temp_dir,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    /// Write `contents` to `relative`, creating parent directories.
    pub async fn write_file(&self, relative: &str, contents: &str) -> PathBuf {
        let path = self.root.join(relative);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .expect("failed to create parent dirs");
        }
        tokio::fs::write(&path, contents)
            .await
            .expect("failed to write test file");
        path
    }

    pub async fn write_config(&self, json: &str) -> PathBuf {
        self.write_file(CONFIG_FILE_NAME, json).await
    }

    pub async fn write_sourcemap(&self, json: &str) -> PathBuf {
        self.write_file("sourcemap.json", json).await
    }

    /// Configuration as the lenient reader sees it now.
    pub fn config(&self) -> AutoRequireConfig {
        ConfigReader::new(self.config_path()).config().clone()
    }

    /// A session rooted here with the current configuration and `snapshot`.
    pub fn session(&self, snapshot: &str) -> Session {
        let mut session = Session::new(&self.root, self.config());
        assert!(session.apply_snapshot(snapshot), "fixture snapshot rejected");
        session
    }
}

impl Default for TestProject {
    fn default() -> Self {
        Self::new()
    }
}
