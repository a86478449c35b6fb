//! Server/client environment classification.
//!
//! Each node is tagged from its main file path and the name of the top-level
//! container that owns it. Configured directory prefixes are consulted first;
//! only when none match does the naming convention apply.
//!
//! | Order | Condition | Result |
//! |-------|-----------|--------|
//! | 1 | path under a server **and** a client prefix | `Both` |
//! | 2 | path under a server prefix | `Server` |
//! | 3 | path under a client prefix | `Client` |
//! | 4 | server-only container, or under `src/server` | `Server` |
//! | 5 | client-only container, or under `src/client` | `Client` |
//! | 6 | otherwise | `Shared` |

use autorequire_config::AutoRequireConfig;
use tracing::debug;

use crate::services::{CLIENT_SERVICES, CLIENT_SOURCE_ROOT, SERVER_SERVICES, SERVER_SOURCE_ROOT};
use crate::tree::{Environment, InstanceTree, NodeId};

/// Classifier built from the configured directory prefixes.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentClassifier {
    server_prefixes: Vec<String>,
    client_prefixes: Vec<String>,
}

impl EnvironmentClassifier {
    pub fn new(config: &AutoRequireConfig) -> Self {
        Self {
            server_prefixes: config.server_prefixes(),
            client_prefixes: config.client_prefixes(),
        }
    }

    /// Classify from a lowercased main file path and the owning container.
    pub fn classify_parts(&self, path_key: Option<&str>, service: Option<&str>) -> Environment {
        let under_any = |prefixes: &[String]| {
            path_key.is_some_and(|path| prefixes.iter().any(|prefix| is_under(path, prefix)))
        };

        let in_server_dir = under_any(self.server_prefixes.as_slice());
        let in_client_dir = under_any(self.client_prefixes.as_slice());
        match (in_server_dir, in_client_dir) {
            (true, true) => return Environment::Both,
            (true, false) => return Environment::Server,
            (false, true) => return Environment::Client,
            (false, false) => {}
        }

        let service_in = |names: &[&str]| service.is_some_and(|s| names.contains(&s));
        let path_under = |root: &str| path_key.is_some_and(|path| is_under(path, root));

        if service_in(SERVER_SERVICES) || path_under(SERVER_SOURCE_ROOT) {
            Environment::Server
        } else if service_in(CLIENT_SERVICES) || path_under(CLIENT_SOURCE_ROOT) {
            Environment::Client
        } else {
            Environment::Shared
        }
    }

    /// Classify a single node of `tree` without modifying it.
    pub fn classify(&self, tree: &InstanceTree, id: NodeId) -> Environment {
        let service = tree.service_of(id).map(|s| tree[s].name.as_str());
        self.classify_parts(tree[id].main_file_key(), service)
    }

    /// Tag every node of `tree`, parents first.
    pub(crate) fn apply(&self, tree: &mut InstanceTree) {
        let tags: Vec<Environment> = tree.ids().map(|id| self.classify(tree, id)).collect();
        for (node, tag) in tree.nodes.iter_mut().zip(tags) {
            node.environment = tag;
        }
        debug!(nodes = tree.len(), "Classified instance tree");
    }
}

/// Whether `path` equals `prefix` or lies beneath it. Both must be lowercase.
fn is_under(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return false;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}
