#![deny(unsafe_code)]

//! Shared test utilities for the autorequire workspace.
//!
//! Provides sourcemap fixtures, config builders, and temporary projects so
//! that individual crate tests stay concise and consistent.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! autorequire-test-utils = { workspace = true }
//! ```

pub mod config;
pub mod project;
pub mod snapshot;

pub use config::TestConfigBuilder;
pub use project::TestProject;
pub use snapshot::{SnapshotBuilder, node, sample_place};
