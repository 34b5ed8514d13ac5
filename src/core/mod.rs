//! Core data structures.
//!
//! - `rebar.config` dependency extraction
//! - Package metadata shared with the workspace orchestrator

pub mod manifest;
pub mod metadata;

pub use manifest::{extract_dependencies, is_rebar3_project, RebarConfig, MANIFEST_NAME};
pub use metadata::{Dependencies, DependencyKind, PackageMetadata};

/// Ecosystem type tag for rebar3 packages.
pub const PACKAGE_TYPE: &str = "rebar3";
