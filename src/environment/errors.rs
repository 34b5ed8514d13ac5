//! Environment resolution error types.

use std::path::PathBuf;

use thiserror::Error;

/// Error while composing the command environment of a build.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("package script of dependency `{package}` not found at `{}`; has `{package}` been built?", path.display())]
    MissingPackageScript { package: String, path: PathBuf },

    #[error("failed to read environment file `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed line {line} in `{}`: {content:?}", path.display())]
    MalformedLine {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("failed to write `{}`", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("environment files sourced too deeply from `{}` (cycle?)", path.display())]
    SourceDepthExceeded { path: PathBuf },

    #[error("cannot join values for `{variable}`: {message}")]
    InvalidValue { variable: String, message: String },
}
