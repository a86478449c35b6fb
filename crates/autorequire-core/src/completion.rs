//! Completion candidates for a document at a cursor position.
//!
//! The provider never fails. Anything it cannot resolve yields an empty list,
//! with the reason logged.

use std::fmt;

use autorequire_config::{AutoRequireConfig, normalize_path};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::edit::{self, Position, TextEdit};
use crate::gate::{self, GateOptions};
use crate::services::SERVICES;
use crate::tree::{InstanceTree, NodeId};

static LAST_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\w+)\s*$").unwrap());

/// One completion request from the editor.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    /// Path of the document relative to the project root.
    pub document_path: &'a str,
    /// Full current text of the document.
    pub text: &'a str,
    /// Cursor position.
    pub position: Position,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CandidateKind {
    Module,
    Service,
}

impl fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateKind::Module => write!(f, "module"),
            CandidateKind::Service => write!(f, "service"),
        }
    }
}

/// An admitted completion with the edits to apply when it is accepted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub label: String,
    pub kind: CandidateKind,
    pub detail: String,
    /// Expression passed to `require`. Absent for services.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expression: Option<String>,
    pub edits: Vec<TextEdit>,
    pub bundles_service_fetch: bool,
}

/// Word immediately before the cursor, ignoring trailing whitespace.
pub fn typed_prefix(text: &str, position: Position) -> Option<String> {
    let line = text.split('\n').nth(position.line as usize)?;
    let before: String = line.chars().take(position.character as usize).collect();
    LAST_WORD
        .captures(&before)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Produces candidates against one classified tree.
#[derive(Debug, Clone, Copy)]
pub struct CompletionProvider<'a> {
    tree: &'a InstanceTree,
    options: GateOptions,
}

impl<'a> CompletionProvider<'a> {
    pub fn new(tree: &'a InstanceTree, config: &AutoRequireConfig) -> Self {
        Self {
            tree,
            options: GateOptions::from(config),
        }
    }

    pub fn with_options(tree: &'a InstanceTree, options: GateOptions) -> Self {
        Self { tree, options }
    }

    /// The script instance whose main file is `document_path`.
    pub fn origin_of(&self, document_path: &str) -> Option<NodeId> {
        self.tree.find_by_file_path(&normalize_path(document_path))
    }

    /// Module candidates first, in tree order, then matching services.
    pub fn complete(&self, request: &CompletionRequest<'_>, cancel: &CancellationToken) -> Vec<Candidate> {
        let Some(prefix) = typed_prefix(request.text, request.position) else {
            trace!("No word before cursor");
            return Vec::new();
        };
        let Some(origin) = self.origin_of(request.document_path) else {
            debug!(path = %request.document_path, "Document is not part of the instance tree");
            return Vec::new();
        };
        if cancel.is_cancelled() {
            debug!("Completion request cancelled");
            return Vec::new();
        }

        let prefix = prefix.to_lowercase();
        let mut candidates = Vec::new();

        for target in self.tree.modules() {
            let node = &self.tree[target];
            if !node.name.to_lowercase().starts_with(&prefix) {
                continue;
            }
            if let Err(rejection) = gate::check(self.tree, origin, target, request.text, self.options) {
                trace!(target = %node.name, %rejection, "Candidate rejected");
                continue;
            }
            let edits = match edit::require_edits(self.tree, request.text, origin, target) {
                Ok(edits) => edits,
                Err(e) => {
                    warn!(error = %e, target = %node.name, "Path resolution failed");
                    return Vec::new();
                }
            };
            let file = node
                .main_file_path
                .clone()
                .unwrap_or_else(|| self.tree.display_path(target));
            candidates.push(Candidate {
                label: node.name.clone(),
                kind: CandidateKind::Module,
                detail: format!("Require '{file}'"),
                expression: Some(edits.expression),
                edits: edits.edits,
                bundles_service_fetch: edits.bundles_service_fetch,
            });
        }

        candidates.extend(service_candidates(request.text, &prefix));
        debug!(count = candidates.len(), %prefix, "Completion candidates");
        candidates
    }
}

/// Services matching `prefix` (lowercase) that the document does not bind yet.
fn service_candidates<'t>(text: &'t str, prefix: &'t str) -> impl Iterator<Item = Candidate> + 't {
    SERVICES
        .iter()
        .filter(move |service| service.to_lowercase().starts_with(prefix))
        .filter(move |service| edit::service_variable_name(text, service).is_none())
        .map(move |service| Candidate {
            label: service.to_string(),
            kind: CandidateKind::Service,
            detail: format!(":GetService(\"{service}\")"),
            expression: None,
            edits: vec![edit::service_fetch_edit(text, service)],
            bundles_service_fetch: true,
        })
}
