//! High-level operations behind the `colcon-rebar3` commands.

pub mod build;
pub mod identify;
pub mod install;
pub mod scan;

pub use build::{BuildOutcome, Rebar3BuildTask};
pub use identify::{identify_path, IdentifyError, PackageIdentification, Rebar3Identification};
pub use install::{install_release, register_package, InstallLayout};
pub use scan::{scan_packages, scan_workspace, PackageGraph, ScanError};
