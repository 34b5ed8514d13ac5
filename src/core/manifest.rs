//! `rebar.config` dependency extraction.
//!
//! A `rebar.config` is a list of Erlang terms, so it is never parsed into a
//! full syntax tree here. Only dependency tuples whose second element is a
//! `{ros2, ...}` sub-tuple are picked out, e.g.
//!
//! ```erlang
//! {deps, [
//!     {rclerl, {ros2, []}},      % workspace package, extracted
//!     {jsx, "3.1.0"}             % hex package, ignored
//! ]}.
//! ```

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// File name of the rebar3 manifest at a project root.
pub const MANIFEST_NAME: &str = "rebar.config";

/// Dependency tuple tagged for the ROS 2 integration driver.
static ROS2_DEPENDENCY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{(\w+)\s*,\s*\{ros2").expect("valid dependency pattern"));

/// Errors raised while turning a manifest into a [`RebarConfig`].
#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read `{}`", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Data extracted from a `rebar.config`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RebarConfig {
    /// Workspace packages this project depends on.
    pub depends: BTreeSet<String>,
}

impl RebarConfig {
    /// Extract data from manifest text.
    pub fn parse(content: &str) -> Self {
        RebarConfig {
            depends: extract_dependencies(content),
        }
    }

    /// Read and extract a manifest file.
    ///
    /// Reading is the only step that can fail; content that matches nothing
    /// yields an empty dependency set.
    pub fn from_path(path: &Path) -> Result<Self, ManifestError> {
        let content = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&content))
    }
}

/// Collect the names of all `{name, {ros2...}` dependencies in `content`.
pub fn extract_dependencies(content: &str) -> BTreeSet<String> {
    ROS2_DEPENDENCY
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Check if a directory contains a rebar3 project.
pub fn is_rebar3_project(dir: &Path) -> bool {
    dir.join(MANIFEST_NAME).is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_no_tagged_dependencies() {
        assert!(extract_dependencies("").is_empty());
        assert!(extract_dependencies("{erl_opts, [debug_info]}.\n{deps, []}.").is_empty());
    }

    #[test]
    fn test_untagged_dependency_excluded() {
        let deps = extract_dependencies("{foo, {ros2, []}}, {bar, \"1.0\"}");
        assert_eq!(deps, BTreeSet::from(["foo".to_string()]));
    }

    #[test]
    fn test_duplicate_dependency_collapsed() {
        let deps = extract_dependencies("{dep_a, {ros2}}\n{dep_a, {ros2}}");
        assert_eq!(deps.len(), 1);
        assert!(deps.contains("dep_a"));
    }

    #[test]
    fn test_whitespace_tolerance() {
        let content = r#"
{deps, [
    {rclerl ,
        {ros2, []}},
    {std_msgs,{ros2_msgs}},
    {jsx, {git, "https://github.com/talentdeficit/jsx.git", {tag, "v3.1.0"}}}
]}.
"#;
        let deps = extract_dependencies(content);
        assert_eq!(
            deps,
            BTreeSet::from(["rclerl".to_string(), "std_msgs".to_string()])
        );
    }

    #[test]
    fn test_non_word_names_not_matched() {
        assert!(extract_dependencies("{'quoted-name', {ros2, []}}").is_empty());
        assert!(extract_dependencies("{ spaced, {ros2, []}}").is_empty());
    }

    #[test]
    fn test_from_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(MANIFEST_NAME);
        std::fs::write(&path, "{deps, [{rclerl, {ros2, []}}]}.").unwrap();

        let config = RebarConfig::from_path(&path).unwrap();
        assert!(config.depends.contains("rclerl"));
        assert!(is_rebar3_project(tmp.path()));
    }

    #[test]
    fn test_from_path_unreadable() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(MANIFEST_NAME);
        std::fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        let err = RebarConfig::from_path(&path).unwrap_err();
        assert!(matches!(err, ManifestError::Read { .. }));
    }
}
