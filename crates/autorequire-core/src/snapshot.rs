//! Snapshot parsing and tree construction.
//!
//! A snapshot is the sourcemap JSON emitted by the project build tool:
//!
//! ```json
//! { "name": "Game", "className": "DataModel",
//!   "children": [ { "name": "Util", "className": "ModuleScript",
//!                   "filePaths": ["src/shared/Util.luau"] } ] }
//! ```
//!
//! Construction is all-or-nothing. A payload that fails to parse or contains
//! an invalid node produces a [`SnapshotError`] and no tree at all.

use autorequire_config::{AutoRequireConfig, normalize_path};
use serde::{Deserialize, Serialize};

use crate::environment::EnvironmentClassifier;
use crate::tree::{ClassKind, Environment, Instance, InstanceTree, NodeId};

/// File extensions recognized as module source.
pub const SOURCE_EXTENSIONS: [&str; 2] = [".luau", ".lua"];

/// Extension of metadata files that sit beside sources.
pub const METADATA_EXTENSION: &str = ".json";

/// Errors from snapshot parsing and validation.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid snapshot: {0}")]
    Invalid(String),
}

/// One node of the raw snapshot, as serialized by the build tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotNode {
    pub name: String,
    pub class_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_paths: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<SnapshotNode>>,
}

impl InstanceTree {
    /// Parse a snapshot and classify every node under `config`.
    pub fn from_snapshot(text: &str, config: &AutoRequireConfig) -> Result<Self, SnapshotError> {
        let mut tree = build_unclassified(text)?;
        EnvironmentClassifier::new(config).apply(&mut tree);
        Ok(tree)
    }

    /// A copy of this tree with environments recomputed under `config`.
    pub fn reclassified(&self, config: &AutoRequireConfig) -> Self {
        let mut tree = self.clone();
        EnvironmentClassifier::new(config).apply(&mut tree);
        tree
    }
}

/// Parse a snapshot into a tree whose environments are all the default.
pub fn build_unclassified(text: &str) -> Result<InstanceTree, SnapshotError> {
    let root: SnapshotNode = serde_json::from_str(text)?;
    build(root)
}

/// Convert a parsed snapshot into an arena tree.
///
/// Nodes are laid out in pre-order so every parent precedes its children.
pub fn build(root: SnapshotNode) -> Result<InstanceTree, SnapshotError> {
    let mut nodes: Vec<Instance> = Vec::new();
    let mut stack: Vec<(SnapshotNode, Option<NodeId>)> = vec![(root, None)];

    while let Some((raw, parent)) = stack.pop() {
        if raw.name.is_empty() {
            let location = parent
                .map(|p| format!("child of {:?}", nodes[p.0].name))
                .unwrap_or_else(|| "root".to_string());
            return Err(SnapshotError::Invalid(format!(
                "node name must not be empty ({location})"
            )));
        }
        if raw.class_name.is_empty() {
            return Err(SnapshotError::Invalid(format!(
                "node {:?} has an empty className",
                raw.name
            )));
        }

        let id = NodeId(nodes.len());
        let file_paths: Vec<String> = raw
            .file_paths
            .unwrap_or_default()
            .iter()
            .map(|p| normalize_path(p))
            .collect();
        let main_file_path = select_main_file(&file_paths);

        nodes.push(Instance {
            class_kind: ClassKind::from_class_name(&raw.class_name),
            main_file_key: main_file_path.as_ref().map(|p| p.to_lowercase()),
            main_file_path,
            name: raw.name,
            class_name: raw.class_name,
            file_paths,
            parent,
            children: Vec::new(),
            environment: Environment::default(),
        });
        if let Some(parent) = parent {
            nodes[parent.0].children.push(id);
        }

        // Reverse so children pop, and are therefore numbered, in source order.
        let children = raw.children.unwrap_or_default();
        stack.extend(children.into_iter().rev().map(|child| (child, Some(id))));
    }

    Ok(InstanceTree { nodes })
}

/// First source file; otherwise the first file that is not metadata.
fn select_main_file(paths: &[String]) -> Option<String> {
    paths
        .iter()
        .find(|p| is_source_file(p))
        .or_else(|| paths.iter().find(|p| !is_metadata_file(p)))
        .cloned()
}

/// Whether `path` has a recognized module source extension.
pub fn is_source_file(path: &str) -> bool {
    let lower = path.to_lowercase();
    SOURCE_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

fn is_metadata_file(path: &str) -> bool {
    path.to_lowercase().ends_with(METADATA_EXTENSION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_build_minimal_root() {
        let tree = build_unclassified(r#"{ "name": "Game", "className": "DataModel" }"#).unwrap();
        assert_eq!(tree.len(), 1);
        assert!(tree[tree.root()].children().is_empty());
        assert_eq!(tree[tree.root()].class_kind, ClassKind::Container);
    }

    #[test]
    fn test_children_keep_source_order() {
        let tree = build_unclassified(
            r#"{ "name": "Game", "className": "DataModel", "children": [
                { "name": "A", "className": "Folder", "children": [
                    { "name": "A1", "className": "Folder" } ] },
                { "name": "B", "className": "Folder" },
                { "name": "C", "className": "Folder" }
            ] }"#,
        )
        .unwrap();
        let names: Vec<&str> = tree[tree.root()]
            .children()
            .iter()
            .map(|&c| tree[c].name.as_str())
            .collect();
        assert_eq!(names, vec!["A", "B", "C"]);
        let order: Vec<&str> = tree.ids().map(|id| tree[id].name.as_str()).collect();
        assert_eq!(order, vec!["Game", "A", "A1", "B", "C"]);
    }

    #[test]
    fn test_null_children_and_paths_default_to_empty() {
        let tree = build_unclassified(
            r#"{ "name": "Game", "className": "DataModel", "filePaths": null, "children": null }"#,
        )
        .unwrap();
        assert!(tree[tree.root()].file_paths.is_empty());
        assert_eq!(tree[tree.root()].main_file_path, None);
    }

    #[test]
    fn test_paths_are_normalized() {
        let tree = build_unclassified(
            r#"{ "name": "Util", "className": "ModuleScript",
                 "filePaths": ["src\\shared\\Util.meta.json", "src\\shared\\Util.luau"] }"#,
        )
        .unwrap();
        let root = &tree[tree.root()];
        assert_eq!(
            root.file_paths,
            vec![
                "src/shared/Util.meta.json".to_string(),
                "src/shared/Util.luau".to_string()
            ]
        );
        assert_eq!(root.main_file_path.as_deref(), Some("src/shared/Util.luau"));
        assert_eq!(root.main_file_key(), Some("src/shared/util.luau"));
    }

    #[test]
    fn test_main_file_prefers_first_source() {
        let paths = vec![
            "a.json".to_string(),
            "b.lua".to_string(),
            "c.luau".to_string(),
        ];
        assert_eq!(select_main_file(&paths).as_deref(), Some("b.lua"));
    }

    #[test]
    fn test_main_file_falls_back_to_non_metadata() {
        let paths = vec!["default.project.json".to_string(), "src/assets".to_string()];
        assert_eq!(select_main_file(&paths).as_deref(), Some("src/assets"));
        assert_eq!(select_main_file(&["x.json".to_string()]), None);
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        let err = build_unclassified("{ \"name\": ").unwrap_err();
        assert!(matches!(err, SnapshotError::Parse(_)));
    }

    #[test]
    fn test_missing_class_name_is_rejected() {
        let err = build_unclassified(r#"{ "name": "Game" }"#).unwrap_err();
        assert!(matches!(err, SnapshotError::Parse(_)));
    }

    #[test]
    fn test_empty_name_is_rejected() {
        let err = build_unclassified(
            r#"{ "name": "Game", "className": "DataModel",
                 "children": [ { "name": "", "className": "Folder" } ] }"#,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid snapshot: node name must not be empty (child of \"Game\")"
        );
    }

    #[test]
    fn test_is_source_file() {
        assert!(is_source_file("src/Util.luau"));
        assert!(is_source_file("src/Util.LUA"));
        assert!(!is_source_file("src/Util.json"));
    }
}
