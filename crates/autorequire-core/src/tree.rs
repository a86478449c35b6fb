//! Arena-backed instance tree.
//!
//! Every node of a snapshot lives in one `Vec`, addressed by [`NodeId`].
//! Parents are stored as optional indices and children as index lists, so
//! dropping a snapshot is a single deallocation and no reference cycles exist.
//! Nodes are stored top-down: a parent always has a smaller index than any of
//! its children.
//!
//! A [`NodeId`] is only meaningful for the tree that produced it.

use std::fmt;
use std::ops::Index;

use serde::{Deserialize, Serialize};

/// Index of a node inside an [`InstanceTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position of the node in the arena.
    pub fn index(self) -> usize {
        self.0
    }
}

/// What kind of runtime object a node mirrors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassKind {
    /// A requirable module (`ModuleScript`).
    Module,
    /// An executable script (`Script`, `LocalScript`).
    Script,
    /// Any other container.
    Container,
}

impl ClassKind {
    /// Classify a runtime class name.
    pub fn from_class_name(class_name: &str) -> Self {
        match class_name {
            "ModuleScript" => ClassKind::Module,
            "Script" | "LocalScript" => ClassKind::Script,
            _ => ClassKind::Container,
        }
    }

    /// Modules and executable scripts both carry source.
    pub fn has_source(self) -> bool {
        matches!(self, ClassKind::Module | ClassKind::Script)
    }
}

/// Runtime realm a node's code may execute in.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Environment {
    Server,
    Client,
    #[default]
    Shared,
    Both,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Environment::Server => write!(f, "SERVER"),
            Environment::Client => write!(f, "CLIENT"),
            Environment::Shared => write!(f, "SHARED"),
            Environment::Both => write!(f, "BOTH"),
        }
    }
}

/// A node in the tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instance {
    pub name: String,
    /// Runtime class name as it appeared in the snapshot.
    pub class_name: String,
    pub class_kind: ClassKind,
    /// Associated files, with normalized separators.
    pub file_paths: Vec<String>,
    /// The file holding this node's source, if any.
    pub main_file_path: Option<String>,
    #[serde(skip)]
    pub(crate) main_file_key: Option<String>,
    #[serde(skip)]
    pub(crate) parent: Option<NodeId>,
    #[serde(skip)]
    pub(crate) children: Vec<NodeId>,
    pub environment: Environment,
}

impl Instance {
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Lowercased main file path, for case-insensitive comparisons.
    pub fn main_file_key(&self) -> Option<&str> {
        self.main_file_key.as_deref()
    }

    pub fn is_module(&self) -> bool {
        self.class_kind == ClassKind::Module
    }
}

/// A complete, classified snapshot of the instance hierarchy.
#[derive(Debug, Clone)]
pub struct InstanceTree {
    pub(crate) nodes: Vec<Instance>,
}

impl InstanceTree {
    /// The single root node.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Look up a node, returning `None` for an id from another tree.
    pub fn get(&self, id: NodeId) -> Option<&Instance> {
        self.nodes.get(id.0)
    }

    /// Number of nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// A tree always holds at least its root; this exists for API symmetry.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All node ids, parents before children.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// All module nodes, in tree order.
    pub fn modules(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.ids().filter(|&id| self[id].is_module())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|node| node.parent)
    }

    /// Proper ancestors of `id`, nearest first, root last.
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
        }
    }

    /// Number of hops from the root to `id`.
    pub fn depth(&self, id: NodeId) -> usize {
        self.ancestors(id).count()
    }

    /// Whether `ancestor` is `node` or one of its ancestors.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        ancestor == node || self.ancestors(node).any(|a| a == ancestor)
    }

    /// Whether `ancestor` is a proper ancestor of `node`.
    pub fn is_descendant_of(&self, node: NodeId, ancestor: NodeId) -> bool {
        node != ancestor && self.is_ancestor_or_self(ancestor, node)
    }

    /// The top-level container owning `id`: the ancestor-or-self whose parent
    /// is the root. The root itself has none.
    pub fn service_of(&self, id: NodeId) -> Option<NodeId> {
        let root = self.root();
        if id == root {
            return None;
        }
        std::iter::once(id)
            .chain(self.ancestors(id))
            .find(|&n| self.parent(n) == Some(root))
    }

    /// The nearest proper ancestor that is a module, if any.
    pub fn nearest_module_ancestor(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id).find(|&a| self[a].is_module())
    }

    /// First child of `id` with the given name.
    pub fn child_named(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.get(id)?
            .children
            .iter()
            .copied()
            .find(|&c| self[c].name == name)
    }

    /// Whether any ancestor of `id` is named `name`.
    pub fn has_ancestor_named(&self, id: NodeId, name: &str) -> bool {
        self.ancestors(id).any(|a| self[a].name == name)
    }

    /// Find the script or module whose main file is `path`.
    ///
    /// `path` must already be project-relative and normalized; the comparison
    /// ignores case.
    pub fn find_by_file_path(&self, path: &str) -> Option<NodeId> {
        let key = path.to_lowercase();
        self.ids().find(|&id| {
            let node = &self[id];
            node.class_kind.has_source() && node.main_file_key.as_deref() == Some(key.as_str())
        })
    }

    /// Slash-joined names from the root's children down to `id`, for display.
    pub fn display_path(&self, id: NodeId) -> String {
        let mut names: Vec<&str> = std::iter::once(id)
            .chain(self.ancestors(id))
            .filter(|&n| n != self.root())
            .map(|n| self[n].name.as_str())
            .collect();
        names.reverse();
        names.join("/")
    }
}

impl Index<NodeId> for InstanceTree {
    type Output = Instance;

    fn index(&self, id: NodeId) -> &Instance {
        &self.nodes[id.0]
    }
}

/// Iterator over proper ancestors, see [`InstanceTree::ancestors`].
pub struct Ancestors<'a> {
    tree: &'a InstanceTree,
    next: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}
