//! Sourcemap fixtures.
//!
//! Builders produce the JSON a sourcemap process would print, so tests can
//! feed them through the real parser instead of constructing trees by hand.

use serde_json::{Map, Value, json};

/// One sourcemap node under construction.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    name: String,
    class_name: String,
    file_paths: Vec<String>,
    children: Vec<SnapshotBuilder>,
}

/// Start a node with the given name and class.
pub fn node(name: &str, class_name: &str) -> SnapshotBuilder {
    SnapshotBuilder {
        name: name.to_string(),
        class_name: class_name.to_string(),
        file_paths: Vec::new(),
        children: Vec::new(),
    }
}

impl SnapshotBuilder {
    /// A `DataModel` root named `Game`.
    pub fn game() -> Self {
        node("Game", "DataModel")
    }

    /// A top-level service, named after its class.
    pub fn service(name: &str) -> Self {
        node(name, name)
    }

    pub fn folder(name: &str) -> Self {
        node(name, "Folder")
    }

    pub fn module(name: &str, path: &str) -> Self {
        node(name, "ModuleScript").file(path)
    }

    pub fn script(name: &str, path: &str) -> Self {
        node(name, "Script").file(path)
    }

    pub fn local_script(name: &str, path: &str) -> Self {
        node(name, "LocalScript").file(path)
    }

    pub fn file(mut self, path: &str) -> Self {
        self.file_paths.push(path.to_string());
        self
    }

    pub fn child(mut self, child: SnapshotBuilder) -> Self {
        self.children.push(child);
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = SnapshotBuilder>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn to_value(&self) -> Value {
        let mut object = Map::new();
        object.insert("name".to_string(), json!(self.name));
        object.insert("className".to_string(), json!(self.class_name));
        if !self.file_paths.is_empty() {
            object.insert("filePaths".to_string(), json!(self.file_paths));
        }
        if !self.children.is_empty() {
            let children = self.children.iter().map(SnapshotBuilder::to_value).collect();
            object.insert("children".to_string(), Value::Array(children));
        }
        Value::Object(object)
    }

    /// Single-line JSON, as the watch process prints it.
    pub fn to_json(&self) -> String {
        self.to_value().to_string()
    }
}

/// A small place covering every classification and path rule.
///
/// ```text
/// Game
/// ├── ReplicatedStorage
/// │   ├── Util             src/shared/Util/init.luau
/// │   │   ├── Strings      src/shared/Util/Strings.luau
/// │   │   └── Tables       src/shared/Util/Tables.luau
/// │   ├── Combat           src/game/Combat.luau
/// │   └── Packages
/// │       ├── _Index
/// │       │   └── Signal   Packages/_Index/Signal/init.lua
/// │       └── Signal       Packages/Signal.lua
/// ├── ServerScriptService
/// │   ├── Main (Script)    src/server/Main.server.luau
/// │   └── Users            src/server/Users.luau
/// └── StarterPlayer
///     └── StarterPlayerScripts
///         ├── Foo (LocalScript)  src/client/Foo.client.luau
///         └── Bar                src/client/Bar.luau
/// ```
pub fn sample_place() -> SnapshotBuilder {
    SnapshotBuilder::game().children([
        SnapshotBuilder::service("ReplicatedStorage").children([
            SnapshotBuilder::module("Util", "src/shared/Util/init.luau").children([
                SnapshotBuilder::module("Strings", "src/shared/Util/Strings.luau"),
                SnapshotBuilder::module("Tables", "src/shared/Util/Tables.luau"),
            ]),
            SnapshotBuilder::module("Combat", "src/game/Combat.luau"),
            SnapshotBuilder::folder("Packages").children([
                SnapshotBuilder::folder("_Index").child(SnapshotBuilder::module(
                    "Signal",
                    "Packages/_Index/Signal/init.lua",
                )),
                SnapshotBuilder::module("Signal", "Packages/Signal.lua"),
            ]),
        ]),
        SnapshotBuilder::service("ServerScriptService").children([
            SnapshotBuilder::script("Main", "src/server/Main.server.luau"),
            SnapshotBuilder::module("Users", "src/server/Users.luau"),
        ]),
        SnapshotBuilder::service("StarterPlayer").child(
            SnapshotBuilder::service("StarterPlayerScripts").children([
                SnapshotBuilder::local_script("Foo", "src/client/Foo.client.luau"),
                SnapshotBuilder::module("Bar", "src/client/Bar.luau"),
            ]),
        ),
    ])
}
