//! Build context - paths, dependencies and arguments of one package build.

use std::path::PathBuf;

use crate::environment::InstalledDependency;

/// Everything a single package build needs from the orchestrator.
///
/// Created per build invocation and dropped when it ends.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// Package name
    pub package: String,

    /// Package source directory (contains `rebar.config`)
    pub source_path: PathBuf,

    /// Build output base directory
    pub build_base: PathBuf,

    /// Install prefix
    pub install_base: PathBuf,

    /// Installed dependencies, in topological order
    pub dependencies: Vec<InstalledDependency>,

    /// Extra arguments for `rebar3 compile`
    pub build_args: Option<Vec<String>>,

    /// Extra arguments for `rebar3 release`
    pub release_args: Option<Vec<String>>,

    /// Do not write environment scripts after install
    pub skip_hook_creation: bool,
}

impl BuildContext {
    /// Create a new build context.
    pub fn new(
        package: impl Into<String>,
        source_path: PathBuf,
        build_base: PathBuf,
        install_base: PathBuf,
    ) -> Self {
        BuildContext {
            package: package.into(),
            source_path,
            build_base,
            install_base,
            dependencies: Vec::new(),
            build_args: None,
            release_args: None,
            skip_hook_creation: false,
        }
    }

    /// Add an installed dependency.
    pub fn with_dependency(mut self, dependency: InstalledDependency) -> Self {
        self.dependencies.push(dependency);
        self
    }

    /// Set the installed dependencies.
    pub fn with_dependencies(mut self, dependencies: Vec<InstalledDependency>) -> Self {
        self.dependencies = dependencies;
        self
    }

    /// Set extra `rebar3 compile` arguments.
    pub fn with_build_args(mut self, args: Option<Vec<String>>) -> Self {
        self.build_args = args;
        self
    }

    /// Set extra `rebar3 release` arguments.
    pub fn with_release_args(mut self, args: Option<Vec<String>>) -> Self {
        self.release_args = args;
        self
    }

    /// Skip environment script generation.
    pub fn with_skip_hook_creation(mut self, skip: bool) -> Self {
        self.skip_hook_creation = skip;
        self
    }
}
