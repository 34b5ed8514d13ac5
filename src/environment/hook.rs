//! Environment hooks and package scripts.
//!
//! Hooks are registered in memory while a build prepares and written to the
//! install prefix once the package is installed:
//!
//! ```text
//! <install_base>/share/<pkg>/hook/<hook>.dsv
//! <install_base>/share/<pkg>/hook/<hook>.sh
//! <install_base>/share/<pkg>/package.dsv
//! <install_base>/share/<pkg>/package.sh
//! ```

use std::path::{Path, PathBuf};

use anyhow::Result;
use tracing::debug;

use crate::environment::dsv::{self, DsvEntry, DsvOperation};
use crate::util::fs::write_atomic;

const GENERATED_BY: &str = "# generated by colcon-rebar3";

/// How a hook modifies its variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookMode {
    Prepend,
    Append,
}

/// A fragment that makes an installed package visible to consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentHook {
    /// Hook file stem
    pub name: String,

    /// Package the hook belongs to
    pub package: String,

    /// Variable to modify
    pub variable: String,

    /// Path relative to the install prefix; empty means the prefix itself
    pub subdirectory: String,

    pub mode: HookMode,
}

impl EnvironmentHook {
    /// Create a hook prepending `<prefix>/<subdirectory>` to `variable`.
    pub fn prepend(
        name: impl Into<String>,
        package: impl Into<String>,
        variable: impl Into<String>,
        subdirectory: impl Into<String>,
    ) -> Self {
        EnvironmentHook {
            name: name.into(),
            package: package.into(),
            variable: variable.into(),
            subdirectory: subdirectory.into(),
            mode: HookMode::Prepend,
        }
    }

    /// Create a hook appending `<prefix>/<subdirectory>` to `variable`.
    pub fn append(
        name: impl Into<String>,
        package: impl Into<String>,
        variable: impl Into<String>,
        subdirectory: impl Into<String>,
    ) -> Self {
        EnvironmentHook {
            mode: HookMode::Append,
            ..Self::prepend(name, package, variable, subdirectory)
        }
    }

    /// Hook file path relative to the install prefix.
    pub fn relative_path(&self, extension: &str) -> PathBuf {
        hook_dir(&self.package).join(format!("{}.{}", self.name, extension))
    }

    /// DSV description of this hook.
    pub fn to_dsv(&self) -> DsvEntry {
        let operation = match self.mode {
            HookMode::Prepend => DsvOperation::PrependNonDuplicate,
            HookMode::Append => DsvOperation::AppendNonDuplicate,
        };
        DsvEntry::Variable {
            operation,
            name: self.variable.clone(),
            values: vec![self.subdirectory.clone()],
        }
    }

    /// POSIX shell form of this hook.
    ///
    /// Expects `COLCON_CURRENT_PREFIX` to point at the install prefix.
    pub fn to_sh(&self) -> String {
        let value = if self.subdirectory.is_empty() {
            "$COLCON_CURRENT_PREFIX".to_string()
        } else {
            format!("$COLCON_CURRENT_PREFIX/{}", self.subdirectory)
        };
        let (function, body) = match self.mode {
            HookMode::Prepend => (
                "_colcon_prepend_unique_value",
                r#"  eval _values=\"\$$1\"
  _all_values="$2"
  _ifs="$IFS"; IFS=":"
  for _item in $_values; do
    if [ -n "$_item" ] && [ "$_item" != "$2" ]; then
      _all_values="$_all_values:$_item"
    fi
  done
  IFS="$_ifs"
  eval export $1=\"\$_all_values\"
  unset _values _all_values _item _ifs"#,
            ),
            HookMode::Append => (
                "_colcon_append_unique_value",
                r#"  eval _values=\"\$$1\"
  _all_values=""
  _ifs="$IFS"; IFS=":"
  for _item in $_values; do
    if [ -n "$_item" ] && [ "$_item" != "$2" ]; then
      _all_values="${_all_values:+$_all_values:}$_item"
    fi
  done
  IFS="$_ifs"
  _all_values="${_all_values:+$_all_values:}$2"
  eval export $1=\"\$_all_values\"
  unset _values _all_values _item _ifs"#,
            ),
        };

        format!(
            "{GENERATED_BY}\n\n{function}() {{\n{body}\n}}\n\n{function} {var} \"{value}\"\n\nunset -f {function}\n",
            var = self.variable,
        )
    }
}

fn hook_dir(package: &str) -> PathBuf {
    Path::new("share").join(package).join("hook")
}

fn relative_str(path: &Path) -> String {
    // DSV and sh files always use forward slashes
    path.components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Path of a package's DSV script relative to the install prefix.
pub fn package_dsv_path(package: &str) -> PathBuf {
    Path::new("share").join(package).join("package.dsv")
}

/// Path of a package's sh script relative to the install prefix.
pub fn package_sh_path(package: &str) -> PathBuf {
    Path::new("share").join(package).join("package.sh")
}

/// Write hook and package scripts for `package` into `install_base`.
///
/// Returns the written files.
pub fn create_environment_scripts(
    install_base: &Path,
    package: &str,
    hooks: &[EnvironmentHook],
) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    let mut package_dsv = Vec::new();
    let mut package_sh = format!(
        "{GENERATED_BY}\n\n_colcon_package_sh_saved_prefix=\"$COLCON_CURRENT_PREFIX\"\nCOLCON_CURRENT_PREFIX=\"{}\"\n",
        install_base.display()
    );

    for hook in hooks {
        let dsv_rel = hook.relative_path("dsv");
        let sh_rel = hook.relative_path("sh");

        let dsv_path = install_base.join(&dsv_rel);
        write_atomic(&dsv_path, &dsv::render(&[hook.to_dsv()]))?;
        written.push(dsv_path);

        let sh_path = install_base.join(&sh_rel);
        write_atomic(&sh_path, &hook.to_sh())?;
        written.push(sh_path);

        package_dsv.push(DsvEntry::source(relative_str(&dsv_rel)));
        package_sh.push_str(&format!(
            ". \"$COLCON_CURRENT_PREFIX/{}\"\n",
            relative_str(&sh_rel)
        ));
    }

    package_sh.push_str(
        "\nCOLCON_CURRENT_PREFIX=\"$_colcon_package_sh_saved_prefix\"\nunset _colcon_package_sh_saved_prefix\n",
    );

    let dsv_path = install_base.join(package_dsv_path(package));
    write_atomic(&dsv_path, &dsv::render(&package_dsv))?;
    written.push(dsv_path);

    let sh_path = install_base.join(package_sh_path(package));
    write_atomic(&sh_path, &package_sh)?;
    written.push(sh_path);

    debug!(package, files = written.len(), "wrote environment scripts");
    Ok(written)
}
