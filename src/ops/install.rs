//! Install a built release into the install prefix.
//!
//! ```text
//! <install_base>/lib/<pkg>/                                      release tree
//! <install_base>/share/ament_index/resource_index/packages/<pkg> marker
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use tracing::{debug, info};

use crate::util::fs::{copy_dir_all, ensure_dir, remove_dir_all_if_exists, touch};

/// Discovery index directory relative to the install prefix.
pub const PACKAGE_INDEX_DIR: [&str; 4] = ["share", "ament_index", "resource_index", "packages"];

/// Files produced by an install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallLayout {
    /// `<install_base>/lib/<pkg>`
    pub lib_dir: PathBuf,
    /// Discovery marker of the package
    pub marker: PathBuf,
}

/// Discovery index directory under `install_base`.
pub fn package_index_dir(install_base: &Path) -> PathBuf {
    PACKAGE_INDEX_DIR
        .iter()
        .fold(install_base.to_path_buf(), |path, part| path.join(part))
}

/// Reject names that would not resolve to their own entry under `lib/`.
fn check_package_name(package: &str) -> Result<()> {
    let invalid = package.is_empty()
        || package == "."
        || package == ".."
        || package.contains(['/', '\\']);
    if invalid {
        bail!("invalid package name `{}`", package);
    }
    Ok(())
}

/// Replace `<install_base>/lib/<package>` with a copy of `release_dir` and
/// register the package in the discovery index.
///
/// The lib directory is removed before copying, so nothing from a previous
/// install survives. The index directory is shared with other packages and
/// is only ever created, never cleared. A failure part way through leaves
/// whatever was already copied.
pub fn install_release(release_dir: &Path, install_base: &Path, package: &str) -> Result<InstallLayout> {
    check_package_name(package)?;
    if !release_dir.is_dir() {
        bail!(
            "release directory `{}` does not exist; did `rebar3 release` succeed?",
            release_dir.display()
        );
    }

    let lib_dir = install_base.join("lib").join(package);
    remove_dir_all_if_exists(&lib_dir)?;
    copy_dir_all(release_dir, &lib_dir)?;
    debug!(
        "copied {} to {}",
        release_dir.display(),
        lib_dir.display()
    );

    let marker = register_package(install_base, package)?;
    info!(package, prefix = %install_base.display(), "installed");

    Ok(InstallLayout { lib_dir, marker })
}

/// Create the discovery marker for `package`, leaving other markers alone.
pub fn register_package(install_base: &Path, package: &str) -> Result<PathBuf> {
    check_package_name(package)?;
    let index_dir = package_index_dir(install_base);
    ensure_dir(&index_dir)?;

    let marker = index_dir.join(package);
    touch(&marker)?;
    Ok(marker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn make_release(root: &Path, files: &[(&str, &str)]) -> PathBuf {
        let rel = root.join("_build/default/rel");
        for (path, content) in files {
            let full = rel.join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        rel
    }

    #[test]
    fn test_install_layout() {
        let tmp = TempDir::new().unwrap();
        let rel = make_release(
            &tmp.path().join("src"),
            &[("demo/bin/demo", "#!/bin/sh"), ("demo/releases/0.1.0/vm.args", "-sname demo")],
        );
        let install = tmp.path().join("install");

        let layout = install_release(&rel, &install, "demo").unwrap();

        assert_eq!(layout.lib_dir, install.join("lib/demo"));
        assert!(install.join("lib/demo/demo/bin/demo").is_file());
        assert!(install
            .join("lib/demo/demo/releases/0.1.0/vm.args")
            .is_file());
        assert_eq!(
            layout.marker,
            install.join("share/ament_index/resource_index/packages/demo")
        );
        assert_eq!(fs::metadata(&layout.marker).unwrap().len(), 0);
    }

    #[test]
    fn test_reinstall_removes_stale_files() {
        let tmp = TempDir::new().unwrap();
        let install = tmp.path().join("install");
        let stale = install.join("lib/demo/old_release/stale.beam");
        fs::create_dir_all(stale.parent().unwrap()).unwrap();
        fs::write(&stale, "old").unwrap();

        let rel = make_release(&tmp.path().join("src"), &[("demo/new.beam", "new")]);
        install_release(&rel, &install, "demo").unwrap();

        assert!(!stale.exists());
        assert!(install.join("lib/demo/demo/new.beam").is_file());
        let entries: Vec<_> = fs::read_dir(install.join("lib/demo")).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_markers_are_additive() {
        let tmp = TempDir::new().unwrap();
        let install = tmp.path().join("install");

        let alpha = make_release(&tmp.path().join("alpha"), &[("alpha/a", "a")]);
        let beta = make_release(&tmp.path().join("beta"), &[("beta/b", "b")]);
        install_release(&alpha, &install, "alpha").unwrap();
        install_release(&beta, &install, "beta").unwrap();
        // Reinstalling one package keeps the sibling marker
        install_release(&alpha, &install, "alpha").unwrap();

        let index = package_index_dir(&install);
        let mut markers: Vec<_> = fs::read_dir(&index)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        markers.sort();
        assert_eq!(markers, ["alpha", "beta"]);
    }

    #[test]
    fn test_missing_release_dir() {
        let tmp = TempDir::new().unwrap();
        let err = install_release(
            &tmp.path().join("_build/default/rel"),
            &tmp.path().join("install"),
            "demo",
        )
        .unwrap_err();
        assert!(err.to_string().contains("rebar3 release"));
        assert!(!tmp.path().join("install/lib/demo").exists());
    }

    #[test]
    fn test_invalid_package_name_touches_nothing() {
        let tmp = TempDir::new().unwrap();
        let install = tmp.path().join("install");
        let sibling = install.join("lib/other/other/bin/other");
        fs::create_dir_all(sibling.parent().unwrap()).unwrap();
        fs::write(&sibling, "#!/bin/sh").unwrap();
        let rel = make_release(&tmp.path().join("src"), &[("demo/a", "a")]);

        for name in ["", ".", "..", "nested/demo", "nested\\demo"] {
            let err = install_release(&rel, &install, name).unwrap_err();
            assert!(err.to_string().contains("invalid package name"), "{}", name);
        }

        assert!(sibling.is_file());
        assert!(!package_index_dir(&install).exists());
    }
}
