//! rebar3 build driver.
//!
//! This module holds the pieces the build sequence is assembled from: the
//! per-build context, event reporting and rebar3 command construction.

pub mod context;
pub mod errors;
pub mod events;
pub mod rebar3;

pub use context::BuildContext;
pub use errors::BuildError;
pub use events::{BuildEvent, BuildPhase, EventSink, NullSink, RecordingSink};
pub use rebar3::{build_command, release_dir, Rebar3Locator, Verb};
