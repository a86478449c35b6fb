//! The current snapshot and configuration of one project.

use std::path::{Path, PathBuf};

use autorequire_config::{AutoRequireConfig, normalize_path};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::completion::{Candidate, CompletionProvider, CompletionRequest};
use crate::edit::Position;
use crate::snapshot::SnapshotError;
use crate::tree::InstanceTree;

/// Owns the configuration and the latest good tree of a project.
///
/// A tree is replaced only by a fully built and classified successor. A bad
/// snapshot leaves the previous tree in place.
#[derive(Debug, Clone)]
pub struct Session {
    root: PathBuf,
    config: AutoRequireConfig,
    tree: Option<InstanceTree>,
}

impl Session {
    pub fn new(root: impl Into<PathBuf>, config: AutoRequireConfig) -> Self {
        Self {
            root: root.into(),
            config,
            tree: None,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &AutoRequireConfig {
        &self.config
    }

    /// The latest good tree, if any snapshot has been accepted yet.
    pub fn tree(&self) -> Option<&InstanceTree> {
        self.tree.as_ref()
    }

    /// Build a tree from `text` and swap it in. Returns whether it was accepted.
    pub fn apply_snapshot(&mut self, text: &str) -> bool {
        match self.try_apply_snapshot(text) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, kept_previous = self.tree.is_some(), "Snapshot rejected");
                false
            }
        }
    }

    /// Like [`Session::apply_snapshot`], returning the rejection reason.
    pub fn try_apply_snapshot(&mut self, text: &str) -> Result<(), SnapshotError> {
        let tree = InstanceTree::from_snapshot(text, &self.config)?;
        debug!(nodes = tree.len(), modules = tree.modules().count(), "Snapshot applied");
        self.tree = Some(tree);
        Ok(())
    }

    /// Replace the configuration and reclassify the current tree under it.
    pub fn reconfigure(&mut self, config: AutoRequireConfig) {
        if config == self.config {
            return;
        }
        self.config = config;
        if let Some(tree) = &self.tree {
            self.tree = Some(tree.reclassified(&self.config));
        }
        info!("Configuration changed, tree reclassified");
    }

    /// `path` relative to the project root, normalized. The root is stripped
    /// whenever `path` starts with it, even when both are relative. Other
    /// relative paths are taken as already relative to the root.
    pub fn relative_document_path(&self, path: &Path) -> Option<String> {
        let relative = match path.strip_prefix(&self.root) {
            Ok(rest) => rest,
            Err(_) if path.is_absolute() => return None,
            Err(_) => path,
        };
        Some(normalize_path(&relative.to_string_lossy()))
    }

    /// Candidates for `text` (the contents of `path`) at `position`.
    pub fn complete(
        &self,
        path: &Path,
        text: &str,
        position: Position,
        cancel: &CancellationToken,
    ) -> Vec<Candidate> {
        let Some(tree) = &self.tree else {
            debug!("No snapshot yet");
            return Vec::new();
        };
        let Some(document_path) = self.relative_document_path(path) else {
            debug!(path = %path.display(), "Document is outside the project root");
            return Vec::new();
        };
        let request = CompletionRequest {
            document_path: &document_path,
            text,
            position,
        };
        CompletionProvider::new(tree, &self.config).complete(&request, cancel)
    }
}
