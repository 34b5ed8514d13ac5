//! Workspace scan - find rebar3 packages under a root and order them.
//!
//! Directories that are hidden, named `_build` or `target`, or contain a
//! `COLCON_IGNORE` file are skipped. Identified package directories are not
//! descended into.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use thiserror::Error;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::core::metadata::PackageMetadata;
use crate::ops::identify::{identify_path, IdentifyError};

/// File that excludes a directory tree from scanning.
pub const IGNORE_MARKER: &str = "COLCON_IGNORE";

const SKIPPED_DIRS: &[&str] = &["_build", "target"];

#[derive(Debug, Error)]
pub enum ScanError {
    #[error(transparent)]
    Identify(#[from] IdentifyError),

    #[error("failed to walk `{}`", root.display())]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    #[error("duplicate package `{name}` in `{}` and `{}`", first.display(), second.display())]
    DuplicatePackage {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("dependency cycle between packages: {}", packages.join(", "))]
    Cycle { packages: Vec<String> },
}

/// Packages found in a workspace and their internal dependency edges.
#[derive(Debug, Clone)]
pub struct PackageGraph {
    /// Edge `a -> b` means `b` depends on `a`
    graph: DiGraph<String, ()>,
    nodes: HashMap<String, NodeIndex>,
    packages: BTreeMap<String, PackageMetadata>,
}

impl PackageGraph {
    /// Build the graph over `packages`, keeping only edges between them.
    pub fn new(packages: Vec<PackageMetadata>) -> Result<Self, ScanError> {
        let mut by_name: BTreeMap<String, PackageMetadata> = BTreeMap::new();
        for package in packages {
            let name = package.name.clone().unwrap_or_default();
            if let Some(existing) = by_name.get(&name) {
                return Err(ScanError::DuplicatePackage {
                    name,
                    first: existing.path.clone(),
                    second: package.path,
                });
            }
            by_name.insert(name, package);
        }

        let mut graph = DiGraph::new();
        let mut nodes = HashMap::new();
        for name in by_name.keys() {
            nodes.insert(name.clone(), graph.add_node(name.clone()));
        }
        for (name, package) in &by_name {
            for dep in package.dependencies.all() {
                if let Some(&from) = nodes.get(dep) {
                    if dep != name.as_str() {
                        graph.update_edge(from, nodes[name], ());
                    }
                }
            }
        }

        Ok(PackageGraph {
            graph,
            nodes,
            packages: by_name,
        })
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&PackageMetadata> {
        self.packages.get(name)
    }

    /// Workspace packages that `name` directly depends on, sorted.
    pub fn workspace_dependencies(&self, name: &str) -> Vec<&str> {
        let Some(&node) = self.nodes.get(name) else {
            return Vec::new();
        };
        let mut deps: Vec<&str> = self
            .graph
            .neighbors_directed(node, Direction::Incoming)
            .map(|n| self.graph[n].as_str())
            .collect();
        deps.sort_unstable();
        deps
    }

    /// Packages with dependencies before dependents; ties break by name.
    pub fn build_order(&self) -> Result<Vec<&PackageMetadata>, ScanError> {
        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|n| (n, self.graph.neighbors_directed(n, Direction::Incoming).count()))
            .collect();

        let mut ready: BTreeSet<&str> = in_degree
            .iter()
            .filter(|(_, &d)| d == 0)
            .map(|(&n, _)| self.graph[n].as_str())
            .collect();

        let mut order = Vec::with_capacity(self.packages.len());
        while let Some(name) = ready.pop_first() {
            order.push(&self.packages[name]);
            let node = self.nodes[name];
            for dependent in self.graph.neighbors_directed(node, Direction::Outgoing) {
                if let Some(d) = in_degree.get_mut(&dependent) {
                    *d -= 1;
                    if *d == 0 {
                        ready.insert(self.graph[dependent].as_str());
                    }
                }
            }
            in_degree.remove(&node);
        }

        if !in_degree.is_empty() {
            let mut packages: Vec<String> = in_degree
                .keys()
                .map(|&n| self.graph[n].clone())
                .collect();
            packages.sort();
            return Err(ScanError::Cycle { packages });
        }

        Ok(order)
    }
}

fn is_skipped(path: &Path, root: &Path) -> bool {
    if path == root {
        return false;
    }
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    name.starts_with('.') || SKIPPED_DIRS.contains(&name.as_ref()) || path.join(IGNORE_MARKER).exists()
}

/// Identify every rebar3 package under `root`.
///
/// An identification error aborts the scan.
pub fn scan_packages(root: &Path) -> Result<Vec<PackageMetadata>, ScanError> {
    let mut packages = Vec::new();
    let mut walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter();

    while let Some(entry) = walker.next() {
        let entry = entry.map_err(|source| ScanError::Walk {
            root: root.to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_dir() {
            continue;
        }
        if is_skipped(entry.path(), root) {
            trace!(path = %entry.path().display(), "skipping");
            walker.skip_current_dir();
            continue;
        }

        if let Some(metadata) = identify_path(entry.path())? {
            debug!(path = %entry.path().display(), "found package");
            packages.push(metadata);
            walker.skip_current_dir();
        }
    }

    Ok(packages)
}

/// Scan `root` and order the packages found for building.
pub fn scan_workspace(root: &Path) -> Result<PackageGraph, ScanError> {
    let graph = PackageGraph::new(scan_packages(root)?)?;
    // Surface cycles at scan time
    graph.build_order()?;
    Ok(graph)
}
