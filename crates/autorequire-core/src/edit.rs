//! Text edits that add a require binding to a document.
//!
//! Edits are insertions only: nothing is deleted or rewritten, and each edit
//! is positioned against the document text as it was when the edits were
//! computed. Documents are scanned line by line, not parsed.
//!
//! A document is expected to open with a header of three optional blocks, in
//! this order:
//!
//! ```text
//! --!strict                                                  <- tag comments
//!
//! local ReplicatedStorage = game:GetService("ReplicatedStorage")  <- service fetches
//!
//! local Util = require(ReplicatedStorage.Util)                <- requires
//! ```
//!
//! New lines are appended to the end of their block, creating the block
//! (padded by blank lines) when it does not exist yet.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::gate;
use crate::path::{self, PathError, SCRIPT};
use crate::tree::{InstanceTree, NodeId};

static SERVICE_FETCH_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^local\s+\w+\s*=\s*game:GetService\("[^"]+"\)"#).unwrap());

/// Zero-based line and character offset into a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Self { line, character }
    }
}

/// An insertion of `new_text` at `position`. The replaced range is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextEdit {
    pub position: Position,
    pub new_text: String,
}

impl TextEdit {
    fn insert_at_line(line: usize, new_text: String) -> Self {
        Self {
            position: Position::new(line as u32, 0),
            new_text,
        }
    }
}

/// Last line index of each header block found in a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderScan {
    pub last_tag: Option<usize>,
    pub last_service_fetch: Option<usize>,
    pub last_require: Option<usize>,
}

impl HeaderScan {
    pub fn scan(document: &str) -> Self {
        let mut scan = HeaderScan::default();
        for (i, raw) in document.split('\n').enumerate() {
            let line = raw.strip_suffix('\r').unwrap_or(raw);
            if line.trim().starts_with("--!") {
                scan.last_tag = Some(i);
            }
            if SERVICE_FETCH_LINE.is_match(line) {
                scan.last_service_fetch = Some(i);
            }
            if line.starts_with("local ") && line.contains("require(") {
                scan.last_require = Some(i);
            }
        }
        scan
    }
}

/// Name of the variable already bound to `game:GetService("<service>")`.
pub fn service_variable_name(document: &str, service: &str) -> Option<String> {
    let pattern = format!(
        r#"(?m)^local\s+(\w+)\s*=\s*game:GetService\("{}"\)"#,
        regex::escape(service)
    );
    let re = Regex::new(&pattern).ok()?;
    re.captures(document)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Insert `local <service> = game:GetService("<service>")` at the end of the
/// service block, or open a new block after any tag comments.
pub fn service_fetch_edit(document: &str, service: &str) -> TextEdit {
    let scan = HeaderScan::scan(document);
    let line = line_after([scan.last_tag, scan.last_service_fetch]);

    let opens_block = scan.last_service_fetch.is_none();
    let before = if opens_block && line != 0 { 1 } else { 0 };
    let after = if opens_block { 2 } else { 1 };

    TextEdit::insert_at_line(
        line,
        format!(
            "{}local {service} = game:GetService(\"{service}\"){}",
            "\n".repeat(before),
            "\n".repeat(after)
        ),
    )
}

/// The edits that make `target` available in the document of `origin`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequireEdits {
    /// The expression passed to `require`.
    pub expression: String,
    /// Service fetch (if needed) first, then the require line.
    pub edits: Vec<TextEdit>,
    /// Whether a service fetch edit is part of `edits`.
    pub bundles_service_fetch: bool,
}

/// Build the edits that bind `target` with `require` in `document`.
///
/// Nothing is inserted when the document already binds the target's name.
/// The path comes from [`path::require_path`]. An absolute path starts at a
/// service, reusing an existing service variable or fetching a new one.
pub fn require_edits(
    tree: &InstanceTree,
    document: &str,
    origin: NodeId,
    target: NodeId,
) -> Result<RequireEdits, PathError> {
    let mut segments = path::require_path(tree, origin, target)?;

    let name = &tree[target].name;
    if gate::is_already_required(document, name) {
        return Ok(RequireEdits {
            expression: path::render_path(&segments),
            edits: Vec::new(),
            bundles_service_fetch: false,
        });
    }

    let mut edits = Vec::with_capacity(2);
    let mut service_edit_line = None;
    if let Some(first) = segments.first_mut()
        && *first != SCRIPT
    {
        match service_variable_name(document, first) {
            Some(variable) => *first = variable,
            None => {
                let edit = service_fetch_edit(document, first);
                if edit.new_text.ends_with("\n\n") {
                    service_edit_line = Some(edit.position.line);
                }
                edits.push(edit);
            }
        }
    }
    let bundles_service_fetch = !edits.is_empty();

    let expression = path::render_path(&segments);

    let scan = HeaderScan::scan(document);
    let line = line_after([scan.last_tag, scan.last_service_fetch, scan.last_require]);

    let opens_block = scan.last_require.is_none();
    // A freshly opened service block already ends in a blank line here.
    let follows_new_services = service_edit_line == Some(line as u32);
    let before = if opens_block && line != 0 && !follows_new_services { 1 } else { 0 };
    let after = if opens_block { 2 } else { 1 };

    edits.push(TextEdit::insert_at_line(
        line,
        format!(
            "{}local {name} = require({expression}){}",
            "\n".repeat(before),
            "\n".repeat(after)
        ),
    ));

    Ok(RequireEdits {
        expression,
        edits,
        bundles_service_fetch,
    })
}

/// One past the last line of the latest block present, or 0.
fn line_after<const N: usize>(blocks: [Option<usize>; N]) -> usize {
    blocks.into_iter().flatten().max().map_or(0, |last| last + 1)
}

/// Apply insertion edits computed against `text`.
///
/// Edits at the same position are applied in the order given. Positions past
/// the last line append to the end, starting a new line if needed; character
/// offsets past the end of a line clamp to it.
pub fn apply_edits(text: &str, edits: &[TextEdit]) -> String {
    let mut ordered: Vec<&TextEdit> = edits.iter().collect();
    ordered.sort_by_key(|edit| edit.position);

    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let mut out = String::with_capacity(text.len() + edits.iter().map(|e| e.new_text.len()).sum::<usize>());
    let mut pending = ordered.into_iter().peekable();

    for (index, line) in lines.iter().enumerate() {
        let mut consumed = 0;
        while let Some(edit) = pending.next_if(|e| e.position.line as usize == index) {
            let offset = char_offset(line, edit.position.character as usize);
            out.push_str(&line[consumed..offset.max(consumed)]);
            consumed = offset.max(consumed);
            out.push_str(&edit.new_text);
        }
        out.push_str(&line[consumed..]);
    }

    if pending.peek().is_some() && !out.is_empty() && !out.ends_with('\n') {
        out.push('\n');
    }
    for edit in pending {
        out.push_str(&edit.new_text);
    }
    out
}

/// Byte offset of the `character`-th char of `line`, before any line ending.
fn char_offset(line: &str, character: usize) -> usize {
    let content = line.trim_end_matches(['\n', '\r']);
    content
        .char_indices()
        .nth(character)
        .map_or(content.len(), |(offset, _)| offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use autorequire_config::AutoRequireConfig;
    use pretty_assertions::assert_eq;

    const PLACE: &str = r#"{
        "name": "Game", "className": "DataModel",
        "children": [
            { "name": "ReplicatedStorage", "className": "ReplicatedStorage", "children": [
                { "name": "Util", "className": "ModuleScript",
                  "filePaths": ["src/shared/Util/init.luau"], "children": [
                    { "name": "Strings", "className": "ModuleScript",
                      "filePaths": ["src/shared/Util/Strings.luau"] },
                    { "name": "Tables", "className": "ModuleScript",
                      "filePaths": ["src/shared/Util/Tables.luau"] } ] } ] },
            { "name": "ServerScriptService", "className": "ServerScriptService", "children": [
                { "name": "Main", "className": "Script",
                  "filePaths": ["src/server/Main.server.luau"] } ] }
        ]
    }"#;

    fn tree() -> InstanceTree {
        InstanceTree::from_snapshot(PLACE, &AutoRequireConfig::default()).unwrap()
    }

    fn id(tree: &InstanceTree, name: &str) -> NodeId {
        tree.ids().find(|&id| tree[id].name == name).unwrap()
    }

    fn accept(document: &str, origin: &str, target: &str) -> (RequireEdits, String) {
        let tree = tree();
        let edits = require_edits(&tree, document, id(&tree, origin), id(&tree, target)).unwrap();
        let applied = apply_edits(document, &edits.edits);
        (edits, applied)
    }

    #[test]
    fn test_header_scan() {
        let scan = HeaderScan::scan(
            "--!strict\n--!native\nlocal RS = game:GetService(\"ReplicatedStorage\")\n\nlocal A = require(RS.A)\nprint(A)\n",
        );
        assert_eq!(
            scan,
            HeaderScan {
                last_tag: Some(1),
                last_service_fetch: Some(2),
                last_require: Some(4),
            }
        );
        assert_eq!(HeaderScan::scan(""), HeaderScan::default());
    }

    #[test]
    fn test_header_scan_ignores_indented_service_fetch() {
        let document = "local RS = game:GetService(\"ReplicatedStorage\")\n\nlocal function f()\n\tlocal Players = game:GetService(\"Players\")\nend\n";
        assert_eq!(HeaderScan::scan(document).last_service_fetch, Some(0));

        let edit = service_fetch_edit(document, "Teams");
        assert_eq!(edit.position, Position::new(1, 0));
    }

    #[test]
    fn test_service_variable_name() {
        let document = "local RS = game:GetService(\"ReplicatedStorage\")\nlocal Players = game:GetService(\"Players\")\n";
        assert_eq!(
            service_variable_name(document, "ReplicatedStorage").as_deref(),
            Some("RS")
        );
        assert_eq!(service_variable_name(document, "Players").as_deref(), Some("Players"));
        assert_eq!(service_variable_name(document, "Teams"), None);
        assert_eq!(
            service_variable_name("  local RS = game:GetService(\"ReplicatedStorage\")", "ReplicatedStorage"),
            None
        );
    }

    #[test]
    fn test_service_fetch_edit_in_empty_document() {
        let edit = service_fetch_edit("", "Players");
        assert_eq!(edit.position, Position::new(0, 0));
        assert_eq!(edit.new_text, "local Players = game:GetService(\"Players\")\n\n");
    }

    #[test]
    fn test_service_fetch_edit_after_tags() {
        let edit = service_fetch_edit("--!strict\nprint(1)\n", "Players");
        assert_eq!(edit.position, Position::new(1, 0));
        assert_eq!(edit.new_text, "\nlocal Players = game:GetService(\"Players\")\n\n");
    }

    #[test]
    fn test_service_fetch_edit_appends_to_block() {
        let document = "--!strict\n\nlocal RS = game:GetService(\"ReplicatedStorage\")\n\nprint(1)\n";
        let edit = service_fetch_edit(document, "Players");
        assert_eq!(edit.position, Position::new(3, 0));
        assert_eq!(edit.new_text, "local Players = game:GetService(\"Players\")\n");
    }

    #[test]
    fn test_require_into_empty_document() {
        let (edits, applied) = accept("", "Main", "Util");
        assert!(edits.bundles_service_fetch);
        assert_eq!(edits.expression, "ReplicatedStorage.Util");
        assert_eq!(
            applied,
            "local ReplicatedStorage = game:GetService(\"ReplicatedStorage\")\n\nlocal Util = require(ReplicatedStorage.Util)\n\n"
        );
    }

    #[test]
    fn test_require_after_tag_comment() {
        let (_, applied) = accept("--!strict\nprint(\"hi\")\n", "Main", "Util");
        assert_eq!(
            applied,
            "--!strict\n\nlocal ReplicatedStorage = game:GetService(\"ReplicatedStorage\")\n\nlocal Util = require(ReplicatedStorage.Util)\n\nprint(\"hi\")\n"
        );
    }

    #[test]
    fn test_require_reuses_service_variable() {
        let document = "local RS = game:GetService(\"ReplicatedStorage\")\n\nreturn nil\n";
        let (edits, applied) = accept(document, "Main", "Util");
        assert!(!edits.bundles_service_fetch);
        assert_eq!(edits.edits.len(), 1);
        assert_eq!(edits.expression, "RS.Util");
        assert_eq!(
            applied,
            "local RS = game:GetService(\"ReplicatedStorage\")\n\nlocal Util = require(RS.Util)\n\n\nreturn nil\n"
        );
    }

    #[test]
    fn test_require_appends_to_existing_block() {
        let document = "local RS = game:GetService(\"ReplicatedStorage\")\n\nlocal A = require(RS.A)\nlocal B = require(RS.B)\n\nreturn nil\n";
        let (edits, applied) = accept(document, "Main", "Util");
        assert_eq!(edits.edits[0].position, Position::new(4, 0));
        assert_eq!(
            applied,
            "local RS = game:GetService(\"ReplicatedStorage\")\n\nlocal A = require(RS.A)\nlocal B = require(RS.B)\nlocal Util = require(RS.Util)\n\nreturn nil\n"
        );
    }

    #[test]
    fn test_require_with_new_service_below_existing_services() {
        let document = "local Players = game:GetService(\"Players\")\n\nreturn nil\n";
        let (edits, applied) = accept(document, "Main", "Util");
        assert!(edits.bundles_service_fetch);
        assert_eq!(
            applied,
            "local Players = game:GetService(\"Players\")\nlocal ReplicatedStorage = game:GetService(\"ReplicatedStorage\")\n\nlocal Util = require(ReplicatedStorage.Util)\n\n\nreturn nil\n"
        );
    }

    #[test]
    fn test_sibling_submodules_use_relative_path() {
        let (edits, applied) = accept("return {}\n", "Strings", "Tables");
        assert!(!edits.bundles_service_fetch);
        assert_eq!(edits.expression, "script.Parent.Tables");
        assert_eq!(applied, "local Tables = require(script.Parent.Tables)\n\nreturn {}\n");
    }

    #[test]
    fn test_descendant_uses_relative_path() {
        let (edits, _) = accept("", "Util", "Strings");
        assert_eq!(edits.expression, "script.Strings");
    }

    #[test]
    fn test_ancestor_module_uses_relative_path() {
        let (edits, _) = accept("", "Strings", "Util");
        assert!(!edits.bundles_service_fetch);
        assert_eq!(edits.expression, "script.Parent");
    }

    #[test]
    fn test_root_module_is_required_by_climbing() {
        let snapshot = r#"{
            "name": "Lib", "className": "ModuleScript", "filePaths": ["src/init.luau"],
            "children": [
                { "name": "Folder", "className": "Folder", "children": [
                    { "name": "Inner", "className": "ModuleScript",
                      "filePaths": ["src/Folder/Inner.luau"] } ] } ]
        }"#;
        let tree = InstanceTree::from_snapshot(snapshot, &AutoRequireConfig::default()).unwrap();
        let inner = id(&tree, "Inner");

        let edits = require_edits(&tree, "", inner, tree.root()).unwrap();
        assert_eq!(edits.expression, "script.Parent.Parent");
        assert_eq!(
            apply_edits("", &edits.edits),
            "local Lib = require(script.Parent.Parent)\n\n"
        );
    }

    #[test]
    fn test_existing_require_yields_no_edits() {
        let document = "local Util = require(game.ReplicatedStorage.Util)\n";
        for _ in 0..2 {
            let (edits, applied) = accept(document, "Main", "Util");
            assert!(edits.edits.is_empty());
            assert!(!edits.bundles_service_fetch);
            assert_eq!(applied, document);
        }
    }

    #[test]
    fn test_apply_edits_past_end_starts_new_line() {
        let edit = TextEdit::insert_at_line(5, "local A = 1\n".to_string());
        assert_eq!(apply_edits("--!strict", &[edit]), "--!strict\nlocal A = 1\n");
    }

    #[test]
    fn test_apply_edits_keeps_order_at_same_position() {
        let edits = vec![
            TextEdit::insert_at_line(1, "a\n".to_string()),
            TextEdit::insert_at_line(1, "b\n".to_string()),
        ];
        assert_eq!(apply_edits("x\ny\n", &edits), "x\na\nb\ny\n");
    }

    #[test]
    fn test_apply_edits_mid_line() {
        let edit = TextEdit {
            position: Position::new(0, 3),
            new_text: "-".to_string(),
        };
        assert_eq!(apply_edits("abcdef\n", &[edit]), "abc-def\n");
    }

    #[test]
    fn test_apply_edits_handles_crlf() {
        let edit = TextEdit::insert_at_line(1, "local A = 1\r\n".to_string());
        assert_eq!(apply_edits("--!strict\r\nx\r\n", &[edit]), "--!strict\r\nlocal A = 1\r\nx\r\n");
    }
}
