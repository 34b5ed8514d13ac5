//! rebar3 executable discovery and command construction.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use crate::builder::errors::BuildError;
use crate::util::process::which_executable;

/// Environment variable overriding the rebar3 executable.
pub const REBAR3_COMMAND_ENVIRONMENT_VARIABLE: &str = "REBAR3_COMMAND";

/// Name of the rebar3 executable searched on the PATH.
pub const REBAR3_EXECUTABLE_NAME: &str = "rebar3";

/// Directory, relative to the package source, where `rebar3 release` puts
/// the release tree.
pub const RELEASE_OUTPUT_DIR: [&str; 3] = ["_build", "default", "rel"];

/// rebar3 verbs used by the build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Compile,
    Release,
}

impl Verb {
    pub fn as_str(&self) -> &'static str {
        match self {
            Verb::Compile => "compile",
            Verb::Release => "release",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the argument vector `<rebar3> <verb> [extra...]`.
pub fn build_command(executable: &Path, verb: Verb, extra_args: Option<&[String]>) -> Vec<String> {
    let mut argv = vec![
        executable.display().to_string(),
        verb.as_str().to_string(),
    ];
    argv.extend(extra_args.unwrap_or_default().iter().cloned());
    argv
}

/// Release output directory of a package.
pub fn release_dir(source: &Path) -> PathBuf {
    RELEASE_OUTPUT_DIR
        .iter()
        .fold(source.to_path_buf(), |path, part| path.join(part))
}

/// Lazily resolved location of the rebar3 executable.
///
/// Resolution happens on first use and is remembered for the lifetime of the
/// locator, so packages that never build do not pay for the PATH search.
pub struct Rebar3Locator {
    resolver: Box<dyn Fn() -> Option<PathBuf> + Send + Sync>,
    resolved: OnceLock<Option<PathBuf>>,
}

impl Rebar3Locator {
    /// Resolve from `REBAR3_COMMAND`, falling back to a PATH search.
    pub fn new() -> Self {
        Self::with_resolver(|| {
            which_executable(REBAR3_COMMAND_ENVIRONMENT_VARIABLE, REBAR3_EXECUTABLE_NAME)
        })
    }

    /// Use an explicit executable path when given, otherwise [`Rebar3Locator::new`].
    pub fn with_override(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => Self::fixed(path),
            None => Self::new(),
        }
    }

    /// Always resolve to `path`.
    pub fn fixed(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self::with_resolver(move || Some(path.clone()))
    }

    /// Resolve with a custom strategy.
    pub fn with_resolver<F>(resolver: F) -> Self
    where
        F: Fn() -> Option<PathBuf> + Send + Sync + 'static,
    {
        Rebar3Locator {
            resolver: Box::new(resolver),
            resolved: OnceLock::new(),
        }
    }

    /// Resolved executable, if any.
    pub fn resolve(&self) -> Option<&Path> {
        self.resolved
            .get_or_init(|| {
                let found = (self.resolver)();
                match &found {
                    Some(path) => tracing::debug!("using rebar3 at {}", path.display()),
                    None => tracing::debug!("rebar3 executable not found"),
                }
                found
            })
            .as_deref()
    }

    /// Resolved executable or a configuration error.
    pub fn require(&self) -> Result<&Path, BuildError> {
        self.resolve().ok_or_else(|| BuildError::ExecutableNotFound {
            variable: REBAR3_COMMAND_ENVIRONMENT_VARIABLE.to_string(),
            executable: REBAR3_EXECUTABLE_NAME.to_string(),
        })
    }
}

impl Default for Rebar3Locator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Rebar3Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rebar3Locator")
            .field("resolved", &self.resolved.get())
            .finish()
    }
}
