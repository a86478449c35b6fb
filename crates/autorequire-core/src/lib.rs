#![deny(unsafe_code)]

//! autorequire core engine.
//!
//! Turns a Rojo sourcemap into a classified instance tree and answers, for one
//! source file at a time, which modules it may `require` and which text edits
//! add that `require`. Nothing here parses Luau: documents are scanned line by
//! line with anchored patterns, and every edit is an insertion.
//!
//! ```text
//! sourcemap ──► snapshot ──► environment ──┐
//!                                          ▼
//! document ──► completion ──► gate ──► path ──► edit ──► candidates
//! ```

/// Completion candidates for a document at a cursor.
pub mod completion;
/// Insertion-only text edits for requires and service fetches.
pub mod edit;
/// Server/client environment classification.
pub mod environment;
/// Admissibility rules for require candidates.
pub mod gate;
/// Absolute and relative path expressions.
pub mod path;
/// Well-known service and container names.
pub mod services;
/// Current tree and configuration of a project.
pub mod session;
/// Sourcemap JSON parsing and tree construction.
pub mod snapshot;
/// Arena-backed instance tree.
pub mod tree;
/// Long-running sourcemap process integration.
pub mod watcher;

pub use completion::{Candidate, CandidateKind, CompletionProvider, CompletionRequest};
pub use edit::{Position, RequireEdits, TextEdit, apply_edits};
pub use environment::EnvironmentClassifier;
pub use gate::{GateOptions, Rejection};
pub use path::PathError;
pub use session::Session;
pub use snapshot::SnapshotError;
pub use tree::{ClassKind, Environment, Instance, InstanceTree, NodeId};
pub use watcher::{SourcemapWatcher, WatchCommand, WatchError, WatchSummary};
