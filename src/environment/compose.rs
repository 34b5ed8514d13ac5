//! Command environment composition.
//!
//! The environment of a build subprocess is the current process environment
//! plus the contributions of every already-installed dependency, applied in
//! dependency order from each dependency's `share/<name>/package.dsv`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::{debug, trace, warn};

use crate::environment::dsv::{self, DsvEntry};
use crate::environment::errors::EnvironmentError;
use crate::environment::hook::package_dsv_path;

/// Nesting limit for `source` lines.
const MAX_SOURCE_DEPTH: usize = 16;

/// An already-installed dependency of the package being built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledDependency {
    /// Package name
    pub name: String,
    /// Install prefix the dependency was installed into
    pub prefix: PathBuf,
}

impl InstalledDependency {
    pub fn new(name: impl Into<String>, prefix: impl Into<PathBuf>) -> Self {
        InstalledDependency {
            name: name.into(),
            prefix: prefix.into(),
        }
    }
}

/// Snapshot of the current process environment.
///
/// Variables that are not valid UTF-8 are left out; the process builder
/// passes them to the child unchanged.
pub fn process_environment() -> BTreeMap<String, String> {
    std::env::vars_os()
        .filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
            (Ok(key), Ok(value)) => Some((key, value)),
            (key, _) => {
                warn!(
                    variable = ?key,
                    "non UTF-8 environment variable is passed through without dependency hooks"
                );
                None
            }
        })
        .collect()
}

async fn load_dsv(path: &Path) -> Result<Vec<DsvEntry>, EnvironmentError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| EnvironmentError::Read {
            path: path.to_path_buf(),
            source,
        })?;
    dsv::parse(&content, path)
}

/// Apply one dependency's package script to `env`.
pub async fn apply_dependency(
    env: &mut BTreeMap<String, String>,
    dependency: &InstalledDependency,
) -> Result<(), EnvironmentError> {
    let package_dsv = dependency.prefix.join(package_dsv_path(&dependency.name));
    if !package_dsv.is_file() {
        return Err(EnvironmentError::MissingPackageScript {
            package: dependency.name.clone(),
            path: package_dsv,
        });
    }

    // Depth-first over `source` lines, preserving line order
    let mut stack = vec![load_dsv(&package_dsv).await?.into_iter()];
    while let Some(entries) = stack.last_mut() {
        let Some(entry) = entries.next() else {
            stack.pop();
            continue;
        };

        match entry {
            DsvEntry::Source { path } => {
                let sourced = dependency.prefix.join(&path);
                if sourced.extension().and_then(|e| e.to_str()) != Some("dsv") {
                    trace!(path = %sourced.display(), "ignoring non-dsv source");
                    continue;
                }
                if stack.len() >= MAX_SOURCE_DEPTH {
                    return Err(EnvironmentError::SourceDepthExceeded { path: package_dsv });
                }
                stack.push(load_dsv(&sourced).await?.into_iter());
            }
            variable => dsv::apply(env, &dependency.prefix, &variable)?,
        }
    }

    Ok(())
}

/// Compose the environment for a build subprocess.
///
/// `dependencies` must be in topological order; later entries end up first
/// in prepended path lists. The result is also written to
/// `<build_base>/colcon_command_prefix_<task>.env` for inspection.
pub async fn get_command_environment(
    task_name: &str,
    build_base: &Path,
    base: BTreeMap<String, String>,
    dependencies: &[InstalledDependency],
) -> Result<BTreeMap<String, String>, EnvironmentError> {
    let mut env = base;
    for dependency in dependencies {
        apply_dependency(&mut env, dependency).await?;
    }

    let snapshot = build_base.join(format!("colcon_command_prefix_{}.env", task_name));
    write_snapshot(&snapshot, &env)
        .await
        .map_err(|source| EnvironmentError::Write {
            path: snapshot.clone(),
            source,
        })?;

    debug!(
        task = task_name,
        dependencies = dependencies.len(),
        snapshot = %snapshot.display(),
        "composed command environment"
    );
    Ok(env)
}

async fn write_snapshot(path: &Path, env: &BTreeMap<String, String>) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let mut content = String::new();
    for (key, value) in env {
        content.push_str(key);
        content.push('=');
        content.push_str(value);
        content.push('\n');
    }
    tokio::fs::write(path, content).await
}
