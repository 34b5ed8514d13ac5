//! Package identification.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use crate::core::manifest::{is_rebar3_project, ManifestError, RebarConfig, MANIFEST_NAME};
use crate::core::metadata::{DependencyKind, PackageMetadata};
use crate::core::PACKAGE_TYPE;

/// Fatal identification error. Aborts the whole identification pass.
#[derive(Debug, Error)]
pub enum IdentifyError {
    #[error("failed to extract rebar3 package information from \"{}\"", path.display())]
    ExtractionFailed {
        path: PathBuf,
        #[source]
        source: ManifestError,
    },

    #[error("cannot derive a package name from \"{}\"", path.display())]
    InvalidName { path: PathBuf },
}

/// An identification extension.
///
/// Returns `Ok(true)` when it claimed the package, `Ok(false)` when the
/// package is not of its type. Claiming mutates `metadata` additively.
pub trait PackageIdentification: Send + Sync {
    /// Ecosystem type tag this extension assigns.
    fn package_type(&self) -> &'static str;

    fn identify(&self, metadata: &mut PackageMetadata) -> Result<bool, IdentifyError>;
}

/// Identifies rebar3 packages by their `rebar.config`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Rebar3Identification;

impl PackageIdentification for Rebar3Identification {
    fn package_type(&self) -> &'static str {
        PACKAGE_TYPE
    }

    fn identify(&self, metadata: &mut PackageMetadata) -> Result<bool, IdentifyError> {
        if let Some(ref ty) = metadata.package_type {
            if ty != self.package_type() {
                return Ok(false);
            }
        }

        if !is_rebar3_project(&metadata.path) {
            return Ok(false);
        }
        let rebar_config = metadata.path.join(MANIFEST_NAME);

        let data = RebarConfig::from_path(&rebar_config).map_err(|source| {
            IdentifyError::ExtractionFailed {
                path: absolute(&rebar_config),
                source,
            }
        })?;

        // The name always comes from the directory, never from the manifest
        let name = directory_name(&metadata.path)?;
        metadata.package_type = Some(self.package_type().to_string());
        metadata.name = Some(name);
        metadata
            .dependencies
            .extend(DependencyKind::Build, data.depends.iter().cloned());
        metadata
            .dependencies
            .extend(DependencyKind::Run, data.depends.iter().cloned());

        debug!(
            name = metadata.name.as_deref().unwrap_or_default(),
            dependencies = data.depends.len(),
            "identified rebar3 package"
        );
        Ok(true)
    }
}

/// Identify the directory at `path` as a fresh, unpinned candidate.
pub fn identify_path(path: &Path) -> Result<Option<PackageMetadata>, IdentifyError> {
    let mut metadata = PackageMetadata::new(path);
    if Rebar3Identification.identify(&mut metadata)? {
        Ok(Some(metadata))
    } else {
        Ok(None)
    }
}

/// Final segment of the resolved directory path.
///
/// Resolving first turns `.` and `..` into a real segment. A path with no
/// usable final segment (such as `/`) cannot name a package.
fn directory_name(path: &Path) -> Result<String, IdentifyError> {
    let resolved = std::fs::canonicalize(path).unwrap_or_else(|_| absolute(path));
    match resolved.file_name().and_then(|n| n.to_str()) {
        Some(name) if !name.is_empty() => Ok(name.to_string()),
        _ => Err(IdentifyError::InvalidName { path: resolved }),
    }
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}
