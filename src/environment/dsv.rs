//! DSV environment descriptions.
//!
//! A `.dsv` file is the shell-independent form of an environment hook: one
//! operation per line, fields separated by `;`.
//!
//! ```text
//! prepend-non-duplicate;AMENT_PREFIX_PATH;
//! set;DEMO_HOME;share/demo
//! source;share/demo/hook/rebar3_demo_ament_prefix_path.dsv
//! ```
//!
//! Values are relative to the install prefix that contains the file; an empty
//! value stands for the prefix itself.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::environment::errors::EnvironmentError;

/// Operation performed by one DSV line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DsvOperation {
    PrependNonDuplicate,
    PrependNonDuplicateIfExists,
    AppendNonDuplicate,
    Set,
    SetIfUnset,
    Source,
}

impl DsvOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            DsvOperation::PrependNonDuplicate => "prepend-non-duplicate",
            DsvOperation::PrependNonDuplicateIfExists => "prepend-non-duplicate-if-exists",
            DsvOperation::AppendNonDuplicate => "append-non-duplicate",
            DsvOperation::Set => "set",
            DsvOperation::SetIfUnset => "set-if-unset",
            DsvOperation::Source => "source",
        }
    }
}

impl fmt::Display for DsvOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DsvOperation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prepend-non-duplicate" => Ok(DsvOperation::PrependNonDuplicate),
            "prepend-non-duplicate-if-exists" => Ok(DsvOperation::PrependNonDuplicateIfExists),
            "append-non-duplicate" => Ok(DsvOperation::AppendNonDuplicate),
            "set" => Ok(DsvOperation::Set),
            "set-if-unset" => Ok(DsvOperation::SetIfUnset),
            "source" => Ok(DsvOperation::Source),
            other => Err(format!("unknown operation `{}`", other)),
        }
    }
}

/// One parsed DSV line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DsvEntry {
    /// Modify an environment variable
    Variable {
        operation: DsvOperation,
        name: String,
        values: Vec<String>,
    },
    /// Source another file, relative to the prefix
    Source { path: String },
}

impl DsvEntry {
    /// Prepend `value` (relative to the prefix) to `name`, skipping duplicates.
    pub fn prepend(name: impl Into<String>, value: impl Into<String>) -> Self {
        DsvEntry::Variable {
            operation: DsvOperation::PrependNonDuplicate,
            name: name.into(),
            values: vec![value.into()],
        }
    }

    /// Source another DSV file.
    pub fn source(path: impl Into<String>) -> Self {
        DsvEntry::Source { path: path.into() }
    }
}

impl fmt::Display for DsvEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DsvEntry::Variable {
                operation,
                name,
                values,
            } => write!(f, "{};{};{}", operation, name, values.join(";")),
            DsvEntry::Source { path } => write!(f, "source;{}", path),
        }
    }
}

/// Parse the contents of a DSV file. `path` is only used for error messages.
pub fn parse(content: &str, path: &Path) -> Result<Vec<DsvEntry>, EnvironmentError> {
    let mut entries = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        let malformed = || EnvironmentError::MalformedLine {
            path: path.to_path_buf(),
            line: idx + 1,
            content: line.to_string(),
        };

        let mut fields = line.split(';');
        let operation: DsvOperation = fields
            .next()
            .and_then(|op| op.parse().ok())
            .ok_or_else(malformed)?;
        let name = fields.next().ok_or_else(malformed)?;
        if name.is_empty() {
            return Err(malformed());
        }

        if operation == DsvOperation::Source {
            entries.push(DsvEntry::source(name));
        } else {
            entries.push(DsvEntry::Variable {
                operation,
                name: name.to_string(),
                values: fields.map(str::to_string).collect(),
            });
        }
    }

    Ok(entries)
}

/// Render entries back into DSV text.
pub fn render(entries: &[DsvEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&entry.to_string());
        out.push('\n');
    }
    out
}

fn resolve_value(prefix: &Path, value: &str) -> PathBuf {
    if value.is_empty() {
        prefix.to_path_buf()
    } else {
        prefix.join(value)
    }
}

fn split_path_list(value: &str) -> Vec<PathBuf> {
    std::env::split_paths(value)
        .filter(|p| !p.as_os_str().is_empty())
        .collect()
}

fn join_path_list(variable: &str, paths: &[PathBuf]) -> Result<String, EnvironmentError> {
    let joined = std::env::join_paths(paths).map_err(|e| EnvironmentError::InvalidValue {
        variable: variable.to_string(),
        message: e.to_string(),
    })?;
    Ok(joined.to_string_lossy().into_owned())
}

/// Apply a variable entry installed under `prefix` to `env`.
///
/// `Source` entries are ignored here; following them needs file access.
pub fn apply(
    env: &mut BTreeMap<String, String>,
    prefix: &Path,
    entry: &DsvEntry,
) -> Result<(), EnvironmentError> {
    let DsvEntry::Variable {
        operation,
        name,
        values,
    } = entry
    else {
        return Ok(());
    };

    match operation {
        DsvOperation::PrependNonDuplicate
        | DsvOperation::PrependNonDuplicateIfExists
        | DsvOperation::AppendNonDuplicate => {
            let mut new_paths: Vec<PathBuf> = values
                .iter()
                .map(|v| resolve_value(prefix, v))
                .collect();
            if *operation == DsvOperation::PrependNonDuplicateIfExists {
                new_paths.retain(|p| p.exists());
                if new_paths.is_empty() {
                    return Ok(());
                }
            }

            let existing: Vec<PathBuf> = env
                .get(name)
                .map(|v| split_path_list(v))
                .unwrap_or_default()
                .into_iter()
                .filter(|p| !new_paths.contains(p))
                .collect();

            let combined: Vec<PathBuf> = if *operation == DsvOperation::AppendNonDuplicate {
                existing.into_iter().chain(new_paths).collect()
            } else {
                new_paths.into_iter().chain(existing).collect()
            };
            let joined = join_path_list(name, &combined)?;
            env.insert(name.clone(), joined);
        }
        DsvOperation::Set | DsvOperation::SetIfUnset => {
            if *operation == DsvOperation::SetIfUnset && env.contains_key(name) {
                return Ok(());
            }
            let raw = values.join(";");
            let candidate = resolve_value(prefix, &raw);
            let value = if raw.is_empty() || candidate.exists() {
                candidate.to_string_lossy().into_owned()
            } else {
                raw
            };
            env.insert(name.clone(), value);
        }
        DsvOperation::Source => {}
    }

    Ok(())
}
