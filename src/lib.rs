//! colcon-rebar3 - build rebar3 (Erlang) packages in colcon workspaces
//!
//! This crate identifies rebar3 packages by their `rebar.config`, builds
//! them with `rebar3 compile` and `rebar3 release`, installs the release
//! into a colcon install prefix and writes the environment hooks that let
//! dependent packages find it.

pub mod builder;
pub mod core;
pub mod environment;
pub mod ops;
pub mod util;

pub use builder::{BuildContext, BuildError, BuildEvent, BuildPhase, EventSink, Rebar3Locator};
pub use core::{PackageMetadata, PACKAGE_TYPE};
pub use environment::{EnvironmentHook, InstalledDependency};
pub use ops::{BuildOutcome, Rebar3BuildTask};
pub use util::context::GlobalContext;
