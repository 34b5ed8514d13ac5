//! Build error types.

use thiserror::Error;

/// Unrecoverable error during a package build.
///
/// A subprocess exiting non-zero is not an error here; it is reported as a
/// failed [`BuildOutcome`](crate::ops::build::BuildOutcome).
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("could not find `{executable}` executable; install rebar3 or set {variable}")]
    ExecutableNotFound {
        variable: String,
        executable: String,
    },

    #[error("failed to run `{command}`")]
    Spawn {
        command: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to install package `{package}`")]
    Install {
        package: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("failed to create environment scripts for `{package}`")]
    Hooks {
        package: String,
        #[source]
        source: anyhow::Error,
    },
}
