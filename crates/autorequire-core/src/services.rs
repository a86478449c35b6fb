//! Well-known runtime container names.

/// Top-level services offered as completions and fetched by name.
pub const SERVICES: &[&str] = &[
    "AnalyticsService",
    "AssetService",
    "BadgeService",
    "ChangeHistoryService",
    "CollectionService",
    "ContentProvider",
    "ContextActionService",
    "DataStoreService",
    "Debris",
    "GamepadService",
    "GroupService",
    "GuiService",
    "HapticService",
    "HttpService",
    "Lighting",
    "LocalizationService",
    "LogService",
    "MarketplaceService",
    "MemoryStoreService",
    "PhysicsService",
    "Players",
    "PolicyService",
    "ReplicatedFirst",
    "ReplicatedStorage",
    "RunService",
    "ServerScriptService",
    "ServerStorage",
    "SoundService",
    "StarterGui",
    "StarterPack",
    "StarterPlayer",
    "Teams",
    "TeleportService",
    "TextService",
    "TouchInputService",
    "TweenService",
    "VRService",
    "UserInputService",
    "SocialService",
];

/// Containers whose contents only exist on the server.
pub const SERVER_SERVICES: &[&str] = &["ServerStorage", "ServerScriptService"];

/// Containers whose contents only run on the client.
pub const CLIENT_SERVICES: &[&str] = &["StarterPlayer", "StarterGui"];

/// Conventional source root for server code.
pub const SERVER_SOURCE_ROOT: &str = "src/server";

/// Conventional source root for client code.
pub const CLIENT_SOURCE_ROOT: &str = "src/client";

/// Design-time location of player scripts.
pub const LEGACY_PLAYER_SCRIPTS: [&str; 2] = ["StarterPlayer", "StarterPlayerScripts"];

/// Where player scripts actually live at runtime on the client.
pub const PLAYER_SCRIPTS_REDIRECT: [&str; 3] = ["Players", "LocalPlayer", "PlayerScripts"];

/// Container that holds vendored third-party packages.
pub const PACKAGE_INDEX: &str = "_Index";

/// Whether `name` is a fetchable top-level service.
pub fn is_service(name: &str) -> bool {
    SERVICES.contains(&name)
}
