//! Environment hooks, package scripts and command environment composition.

pub mod compose;
pub mod dsv;
pub mod errors;
pub mod hook;

pub use compose::{get_command_environment, process_environment, InstalledDependency};
pub use errors::EnvironmentError;
pub use hook::{create_environment_scripts, EnvironmentHook, HookMode};
