#![deny(unsafe_code)]

//! Command implementations for the `autorequire` binary.
//!
//! Each command returns the text it would print so the binary stays a thin
//! argument parser and the commands can be tested without spawning it.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};
use autorequire_config::{AutoRequireConfig, CONFIG_FILE_NAME, ConfigReader};
use autorequire_core::{
    CompletionProvider, InstanceTree, NodeId, Position, Session, apply_edits, edit,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Where the project lives and which config file it uses.
#[derive(Debug, Clone)]
pub struct Project {
    pub root: PathBuf,
    pub config_path: PathBuf,
}

impl Project {
    /// `config` defaults to `.autorequire.json` in `root`; a relative `config`
    /// is taken relative to `root`.
    pub fn new(root: impl Into<PathBuf>, config: Option<&Path>) -> Self {
        let root = root.into();
        let config_path = match config {
            Some(path) => root.join(path),
            None => root.join(CONFIG_FILE_NAME),
        };
        Self { root, config_path }
    }

    /// Resolve a user-supplied path against the project root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        self.root.join(path)
    }

    /// Configuration for engine commands: never fails, defaults on any problem.
    pub fn read_config(&self) -> AutoRequireConfig {
        ConfigReader::new(&self.config_path).config().clone()
    }

    /// A session holding the tree from the sourcemap file at `sourcemap`.
    pub async fn open_session(&self, sourcemap: &Path) -> Result<Session> {
        let path = self.resolve(sourcemap);
        let text = tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("failed to read sourcemap '{}'", path.display()))?;
        let mut session = Session::new(&self.root, self.read_config());
        session
            .try_apply_snapshot(&text)
            .with_context(|| format!("invalid sourcemap '{}'", path.display()))?;
        Ok(session)
    }
}

/// Strictly load the config file, or defaults when there is none.
pub async fn load_config(path: &Path) -> Result<AutoRequireConfig> {
    if tokio::fs::try_exists(path).await.unwrap_or(false) {
        AutoRequireConfig::load(path)
            .await
            .with_context(|| format!("invalid configuration '{}'", path.display()))
    } else {
        info!(path = %path.display(), "Config file not found, using defaults");
        Ok(AutoRequireConfig::default())
    }
}

// ── complete ──────────────────────────────────────────────────────

/// Candidates at `position` in `document` as pretty JSON, or with `apply`
/// the document text after accepting the first candidate.
pub async fn cmd_complete(
    project: &Project,
    sourcemap: &Path,
    document: &Path,
    position: Position,
    apply: bool,
) -> Result<String> {
    let session = project.open_session(sourcemap).await?;
    let document = project.resolve(document);
    let text = tokio::fs::read_to_string(&document)
        .await
        .with_context(|| format!("failed to read document '{}'", document.display()))?;

    let candidates = session.complete(&document, &text, position, &CancellationToken::new());
    info!(count = candidates.len(), "Completion finished");

    if !apply {
        return Ok(serde_json::to_string_pretty(&candidates)?);
    }
    let first = candidates
        .first()
        .ok_or_else(|| anyhow!("no candidates at {}:{}", position.line, position.character))?;
    info!(label = %first.label, "Accepting candidate");
    Ok(apply_edits(&text, &first.edits))
}

// ── path ──────────────────────────────────────────────────────────

/// The require expression `from` would use for the module named `to`.
pub async fn cmd_path(project: &Project, sourcemap: &Path, from: &Path, to: &str) -> Result<String> {
    let session = project.open_session(sourcemap).await?;
    let tree = session
        .tree()
        .ok_or_else(|| anyhow!("sourcemap produced no tree"))?;

    let from_path = project.resolve(from);
    let relative = session
        .relative_document_path(&from_path)
        .ok_or_else(|| anyhow!("'{}' is outside the project", from_path.display()))?;
    let origin = CompletionProvider::new(tree, session.config())
        .origin_of(&relative)
        .ok_or_else(|| anyhow!("'{relative}' is not a script in the sourcemap"))?;
    let target = find_module(tree, to)?;

    // Reuse service variables the file already declares.
    let text = tokio::fs::read_to_string(&from_path).await.unwrap_or_default();
    let edits = edit::require_edits(tree, &text, origin, target)?;
    Ok(edits.expression)
}

fn find_module(tree: &InstanceTree, name: &str) -> Result<NodeId> {
    let matches: Vec<NodeId> = tree
        .modules()
        .filter(|&id| tree[id].name == name)
        .collect();
    match matches.as_slice() {
        [] => bail!("no module named '{name}'"),
        [one] => Ok(*one),
        many => {
            let paths: Vec<String> = many.iter().map(|&id| tree.display_path(id)).collect();
            bail!("module name '{name}' is ambiguous: {}", paths.join(", "))
        }
    }
}

// ── tree ──────────────────────────────────────────────────────────

/// The classified tree, one node per line, indented by depth.
pub async fn cmd_tree(project: &Project, sourcemap: &Path) -> Result<String> {
    let session = project.open_session(sourcemap).await?;
    let tree = session
        .tree()
        .ok_or_else(|| anyhow!("sourcemap produced no tree"))?;
    Ok(render_tree(tree))
}

pub fn render_tree(tree: &InstanceTree) -> String {
    let mut out = String::new();
    for id in tree.ids() {
        let node = &tree[id];
        let indent = "  ".repeat(tree.depth(id));
        let _ = write!(out, "{indent}{} ({}) [{}]", node.name, node.class_name, node.environment);
        if let Some(path) = &node.main_file_path {
            let _ = write!(out, " {path}");
        }
        out.push('\n');
    }
    out
}

// ── config ────────────────────────────────────────────────────────

pub async fn cmd_config(project: &Project, show: bool) -> Result<String> {
    let config = load_config(&project.config_path).await?;
    if show {
        Ok(serde_json::to_string_pretty(&config)?)
    } else {
        Ok(format!(
            "Configuration at '{}' is valid.",
            project.config_path.display()
        ))
    }
}
