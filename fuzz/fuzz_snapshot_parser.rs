//! Fuzz target for the sourcemap parser and classifier.
//!
//! Run with: cargo +nightly fuzz run fuzz_snapshot_parser
//!
//! Feeds arbitrary text through `InstanceTree::from_snapshot()` and, when a
//! tree comes out, checks the parent-before-child layout every other module
//! relies on.

#![no_main]

use autorequire_config::AutoRequireConfig;
use autorequire_core::InstanceTree;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let config = AutoRequireConfig {
        server_directories: vec!["src/server".to_string()],
        client_directories: vec!["src/client".to_string()],
        ..AutoRequireConfig::default()
    };
    let Ok(tree) = InstanceTree::from_snapshot(text, &config) else {
        return;
    };

    for id in tree.ids() {
        if let Some(parent) = tree.parent(id) {
            assert!(parent.index() < id.index());
            assert!(tree[parent].children().contains(&id));
        }
        assert_eq!(tree.ancestors(id).count(), tree.depth(id));
    }
});
