//! Admissibility of a module as a require candidate.
//!
//! A target is offered to an origin file only if every rule in
//! [`check`] passes. Rejections are normal results, not errors.

use std::fmt;

use autorequire_config::AutoRequireConfig;

use crate::path;
use crate::services::PACKAGE_INDEX;
use crate::tree::{Environment, InstanceTree, NodeId};

/// Switches that relax the gate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateOptions {
    /// Offer modules nested under another module from anywhere.
    pub always_show_sub_modules: bool,
    /// Skip the environment compatibility rule.
    pub ignore_environment: bool,
}

impl From<&AutoRequireConfig> for GateOptions {
    fn from(config: &AutoRequireConfig) -> Self {
        Self {
            always_show_sub_modules: config.always_show_sub_modules,
            ignore_environment: config.ignore_environment,
        }
    }
}

/// Why a target was not admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The target is the requesting file itself.
    SelfReference,
    /// The name would need bracket indexing to bind.
    WhitespaceName,
    /// The target is a vendored package internal.
    PackageIndex,
    /// No non-empty path leads from the origin to the target.
    NoPath,
    /// The document already binds the name with `require`.
    AlreadyRequired,
    /// The target cannot run where the origin runs.
    Environment { origin: Environment, target: Environment },
    /// The target is private to a module the origin is not part of.
    HiddenSubmodule,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::SelfReference => write!(f, "target is the origin"),
            Rejection::WhitespaceName => write!(f, "name contains whitespace"),
            Rejection::PackageIndex => write!(f, "inside the package index"),
            Rejection::NoPath => write!(f, "no require path to target"),
            Rejection::AlreadyRequired => write!(f, "already required"),
            Rejection::Environment { origin, target } => {
                write!(f, "{origin} code cannot require {target} code")
            }
            Rejection::HiddenSubmodule => write!(f, "submodule of an unrelated module"),
        }
    }
}

/// Decide whether `target` may be required from `origin`, whose current text
/// is `document`.
pub fn check(
    tree: &InstanceTree,
    origin: NodeId,
    target: NodeId,
    document: &str,
    options: GateOptions,
) -> Result<(), Rejection> {
    if origin == target {
        return Err(Rejection::SelfReference);
    }

    let target_node = &tree[target];
    if target_node.name.chars().any(char::is_whitespace) {
        return Err(Rejection::WhitespaceName);
    }
    if tree.has_ancestor_named(target, PACKAGE_INDEX) {
        return Err(Rejection::PackageIndex);
    }
    if path::require_path(tree, origin, target).is_err() {
        return Err(Rejection::NoPath);
    }
    if is_already_required(document, &target_node.name) {
        return Err(Rejection::AlreadyRequired);
    }

    if !options.ignore_environment {
        let origin_env = tree[origin].environment;
        let target_env = target_node.environment;
        if !environments_compatible(origin_env, target_env) {
            return Err(Rejection::Environment {
                origin: origin_env,
                target: target_env,
            });
        }
    }

    if !options.always_show_sub_modules && !submodule_visible(tree, origin, target) {
        return Err(Rejection::HiddenSubmodule);
    }

    Ok(())
}

/// Convenience wrapper over [`check`].
pub fn is_requirable(
    tree: &InstanceTree,
    origin: NodeId,
    target: NodeId,
    document: &str,
    options: GateOptions,
) -> bool {
    check(tree, origin, target, document, options).is_ok()
}

/// Whether code in `origin` may depend on code in `target`.
pub fn environments_compatible(origin: Environment, target: Environment) -> bool {
    match origin {
        Environment::Both => true,
        Environment::Server => target != Environment::Client,
        Environment::Client => target != Environment::Server,
        Environment::Shared => !matches!(target, Environment::Server | Environment::Client),
    }
}

/// Whether any line of `document` starts with `local <name> = require(`.
///
/// Literal prefix match only. `local Foo=require(` or an indented binding
/// is not seen.
pub fn is_already_required(document: &str, name: &str) -> bool {
    let needle = format!("local {name} = require(");
    document.lines().any(|line| line.starts_with(&needle))
}

/// A module nested under another module is only visible from inside that
/// module, or from the module itself.
fn submodule_visible(tree: &InstanceTree, origin: NodeId, target: NodeId) -> bool {
    match tree.nearest_module_ancestor(target) {
        None => true,
        Some(owner) => owner == origin || tree.nearest_module_ancestor(origin) == Some(owner),
    }
}
