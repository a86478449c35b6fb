//! Path expressions between nodes.
//!
//! An absolute path starts at a top-level service (`ReplicatedStorage.Util`);
//! a relative path starts at the requiring script itself
//! (`script.Parent.Util`). Both are pure functions of one tree.

use crate::services::{LEGACY_PLAYER_SCRIPTS, PLAYER_SCRIPTS_REDIRECT};
use crate::tree::{Environment, InstanceTree, NodeId};

/// First segment of every relative path.
pub const SCRIPT: &str = "script";

/// Segment for one hop toward the root.
pub const PARENT: &str = "Parent";

/// Errors from path resolution.
///
/// These only occur when the tree's single-parent structure is broken, which
/// a tree built by [`crate::snapshot::build`] never is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("no path from node {from} to node {to}")]
    Unresolved { from: usize, to: usize },
}

/// Names from the root's child down to `target`, root excluded.
///
/// Player scripts authored under `StarterPlayer.StarterPlayerScripts` are
/// rewritten to their runtime location `Players.LocalPlayer.PlayerScripts`
/// unless the target is server-only, since the server has no local player.
pub fn absolute_path(tree: &InstanceTree, target: NodeId) -> Result<Vec<String>, PathError> {
    let node = tree.get(target).ok_or(PathError::Unresolved {
        from: tree.root().index(),
        to: target.index(),
    })?;

    let mut segments: Vec<String> = std::iter::once(target)
        .chain(tree.ancestors(target))
        .filter(|&n| tree.parent(n).is_some())
        .map(|n| tree[n].name.clone())
        .collect();
    segments.reverse();

    let legacy = segments.len() >= 2
        && segments[0] == LEGACY_PLAYER_SCRIPTS[0]
        && segments[1] == LEGACY_PLAYER_SCRIPTS[1];
    if legacy && node.environment != Environment::Server {
        segments.splice(0..2, PLAYER_SCRIPTS_REDIRECT.iter().map(|s| s.to_string()));
    }
    Ok(segments)
}

/// Path from `origin` to `target` starting with `script`.
///
/// Climbs from `origin` one `Parent` at a time until reaching an ancestor of
/// `target`, then descends by name. In a tree this route is unique.
pub fn relative_path(
    tree: &InstanceTree,
    origin: NodeId,
    target: NodeId,
) -> Result<Vec<String>, PathError> {
    let unresolved = PathError::Unresolved {
        from: origin.index(),
        to: target.index(),
    };
    if tree.get(origin).is_none() || tree.get(target).is_none() {
        return Err(unresolved);
    }

    let mut segments = vec![SCRIPT.to_string()];

    if tree.is_ancestor_or_self(target, origin) {
        let hops = tree.depth(origin) - tree.depth(target);
        segments.extend(std::iter::repeat_n(PARENT.to_string(), hops));
        return Ok(segments);
    }

    let mut common = origin;
    while !tree.is_ancestor_or_self(common, target) {
        common = tree.parent(common).ok_or_else(|| unresolved.clone())?;
        segments.push(PARENT.to_string());
    }

    let mut descent = Vec::new();
    let mut node = target;
    while node != common {
        descent.push(tree[node].name.clone());
        node = tree.parent(node).ok_or_else(|| unresolved.clone())?;
    }
    descent.reverse();
    segments.extend(descent);
    Ok(segments)
}

/// The path `origin` uses to require `target`.
///
/// Relative when `target` is an ancestor or descendant of `origin`, or when
/// both share their nearest module ancestor. Otherwise absolute. A path with
/// no segments cannot be required and is an error.
pub fn require_path(
    tree: &InstanceTree,
    origin: NodeId,
    target: NodeId,
) -> Result<Vec<String>, PathError> {
    let same_owner = match (
        tree.nearest_module_ancestor(origin),
        tree.nearest_module_ancestor(target),
    ) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    };
    let related = tree.is_ancestor_or_self(target, origin) || tree.is_descendant_of(target, origin);

    let segments = if same_owner || related {
        relative_path(tree, origin, target)?
    } else {
        absolute_path(tree, target)?
    };
    if segments.is_empty() {
        return Err(PathError::Unresolved {
            from: origin.index(),
            to: target.index(),
        });
    }
    Ok(segments)
}

/// Follow a relative path from `origin`. Inverse of [`relative_path`].
pub fn resolve_relative(tree: &InstanceTree, origin: NodeId, segments: &[String]) -> Option<NodeId> {
    let (first, rest) = segments.split_first()?;
    if first != SCRIPT {
        return None;
    }

    let mut current = origin;
    let mut climbing = true;
    for segment in rest {
        if climbing && segment == PARENT {
            current = tree.parent(current)?;
            continue;
        }
        climbing = false;
        current = tree.child_named(current, segment)?;
    }
    Some(current)
}

/// Render segments as an index expression.
///
/// Segments that are not plain identifiers use bracket indexing:
/// `["ReplicatedStorage", "My Module"]` → `ReplicatedStorage["My Module"]`.
pub fn render_path(segments: &[String]) -> String {
    let mut out = String::new();
    for (i, segment) in segments.iter().enumerate() {
        if is_identifier(segment) {
            if i > 0 {
                out.push('.');
            }
            out.push_str(segment);
        } else {
            out.push_str("[\"");
            out.push_str(&segment.replace('\\', "\\\\").replace('"', "\\\""));
            out.push_str("\"]");
        }
    }
    out
}

/// Whether `name` can be written as a bare identifier.
pub fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}
