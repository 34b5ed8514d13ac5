//! Package metadata shared with the workspace orchestrator.
//!
//! The orchestrator owns a `PackageMetadata` per candidate directory and lets
//! each identification extension fill it in.

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Kind of dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyKind {
    Build,
    Run,
    Test,
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DependencyKind::Build => write!(f, "build"),
            DependencyKind::Run => write!(f, "run"),
            DependencyKind::Test => write!(f, "test"),
        }
    }
}

/// Dependency sets by kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Dependencies {
    pub build: BTreeSet<String>,
    pub run: BTreeSet<String>,
    pub test: BTreeSet<String>,
}

impl Dependencies {
    /// Get the mutable set for a dependency kind.
    pub fn get_mut(&mut self, kind: DependencyKind) -> &mut BTreeSet<String> {
        match kind {
            DependencyKind::Build => &mut self.build,
            DependencyKind::Run => &mut self.run,
            DependencyKind::Test => &mut self.test,
        }
    }

    /// Union `names` into the set for `kind`. Existing entries are kept.
    pub fn extend<I, S>(&mut self, kind: DependencyKind, names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.get_mut(kind).extend(names.into_iter().map(Into::into));
    }

    /// All dependency names regardless of kind.
    pub fn all(&self) -> BTreeSet<&str> {
        self.build
            .iter()
            .chain(&self.run)
            .chain(&self.test)
            .map(String::as_str)
            .collect()
    }
}

/// Metadata for one candidate package directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageMetadata {
    /// Package directory
    pub path: PathBuf,

    /// Ecosystem type tag (e.g. `rebar3`), if already decided
    #[serde(rename = "type")]
    pub package_type: Option<String>,

    /// Package name, if already decided
    pub name: Option<String>,

    /// Declared dependencies
    pub dependencies: Dependencies,
}

impl PackageMetadata {
    /// Create empty metadata for a directory.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PackageMetadata {
            path: path.into(),
            package_type: None,
            name: None,
            dependencies: Dependencies::default(),
        }
    }

    /// Pin the metadata to an ecosystem type before identification.
    pub fn with_type(mut self, package_type: impl Into<String>) -> Self {
        self.package_type = Some(package_type.into());
        self
    }

    /// Get the package directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether an identification extension claimed this package.
    pub fn is_identified(&self) -> bool {
        self.package_type.is_some() && self.name.is_some()
    }
}
