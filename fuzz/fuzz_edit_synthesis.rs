//! Fuzz target for require-edit synthesis.
//!
//! Run with: cargo +nightly fuzz run fuzz_edit_synthesis
//!
//! Uses arbitrary bytes as the document text for every admitted pair of a
//! fixed place, applies the edits, and checks that nothing was removed and
//! that the target is bound afterwards.

#![no_main]

use autorequire_config::AutoRequireConfig;
use autorequire_core::edit::require_edits;
use autorequire_core::gate::{self, GateOptions};
use autorequire_core::{InstanceTree, apply_edits};
use libfuzzer_sys::fuzz_target;

const PLACE: &str = r#"{"name":"Game","className":"DataModel","children":[
    {"name":"ReplicatedStorage","className":"ReplicatedStorage","children":[
        {"name":"Util","className":"ModuleScript","filePaths":["src/shared/Util/init.luau"],"children":[
            {"name":"Strings","className":"ModuleScript","filePaths":["src/shared/Util/Strings.luau"]}]},
        {"name":"My Module","className":"ModuleScript","filePaths":["src/shared/My Module.luau"]}]},
    {"name":"ServerScriptService","className":"ServerScriptService","children":[
        {"name":"Main","className":"Script","filePaths":["src/server/Main.server.luau"]}]},
    {"name":"StarterPlayer","className":"StarterPlayer","children":[
        {"name":"StarterPlayerScripts","className":"StarterPlayerScripts","children":[
            {"name":"Bar","className":"ModuleScript","filePaths":["src/client/Bar.luau"]}]}]}]}"#;

fuzz_target!(|data: &[u8]| {
    let Ok(document) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(tree) = InstanceTree::from_snapshot(PLACE, &AutoRequireConfig::default()) else {
        return;
    };
    let options = GateOptions {
        always_show_sub_modules: true,
        ignore_environment: true,
    };

    for origin in tree.ids() {
        for target in tree.modules() {
            if !gate::is_requirable(&tree, origin, target, document, options) {
                continue;
            }
            let edits = require_edits(&tree, document, origin, target)
                .expect("paths always resolve in a valid tree");
            let applied = apply_edits(document, &edits.edits);

            assert!(applied.len() >= document.len());
            assert!(gate::is_already_required(&applied, &tree[target].name));

            // Every original line survives, in order.
            let mut remaining = applied.lines();
            for line in document.lines() {
                assert!(remaining.any(|l| l == line), "lost line {line:?}");
            }
        }
    }
});
