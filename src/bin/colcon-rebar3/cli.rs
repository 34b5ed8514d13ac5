//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// colcon-rebar3 - build rebar3 (Erlang) packages in colcon workspaces
#[derive(Parser)]
#[command(name = "colcon-rebar3")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check whether a directory is a rebar3 package
    Identify(IdentifyArgs),

    /// Find rebar3 packages under a directory and list them in build order
    Scan(ScanArgs),

    /// Build and install one rebar3 package
    Build(BuildArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct IdentifyArgs {
    /// Package directory (defaults to the current directory)
    pub path: Option<PathBuf>,

    /// Package type already assigned by another identifier
    #[arg(long = "type", value_name = "TYPE")]
    pub package_type: Option<String>,

    /// Print the package metadata as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ScanArgs {
    /// Workspace root (defaults to the current directory)
    pub root: Option<PathBuf>,

    /// Print the packages as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct BuildArgs {
    /// Package directory (defaults to the current directory)
    pub path: Option<PathBuf>,

    /// Base directory for build output
    #[arg(long, value_name = "DIR")]
    pub build_base: PathBuf,

    /// Install prefix
    #[arg(long, value_name = "DIR")]
    pub install_base: PathBuf,

    /// Installed dependency, in dependency order (repeatable)
    #[arg(long = "dependency", value_name = "NAME=PREFIX", value_parser = parse_dependency)]
    pub dependencies: Vec<(String, PathBuf)>,

    /// Pass arguments to `rebar3 compile`. Arguments matching other
    /// options must be prefixed by a space, e.g.
    /// --rebar3-build-args " --help"
    #[arg(long, num_args = 0.., value_name = "ARG", value_parser = strip_leading_whitespace)]
    pub rebar3_build_args: Option<Vec<String>>,

    /// Pass arguments to `rebar3 release`. Arguments matching other
    /// options must be prefixed by a space, e.g.
    /// --rebar3-release-args " --help"
    #[arg(long, num_args = 0.., value_name = "ARG", value_parser = strip_leading_whitespace)]
    pub rebar3_release_args: Option<Vec<String>>,

    /// Do not write environment scripts after install
    #[arg(long, overrides_with = "no_skip_hook_creation")]
    pub skip_hook_creation: bool,

    /// Write environment scripts even if configuration skips them
    #[arg(long, overrides_with = "skip_hook_creation")]
    pub no_skip_hook_creation: bool,

    /// Output format for build progress
    #[arg(long, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,
}

impl BuildArgs {
    /// `--skip-hook-creation` / `--no-skip-hook-creation`, if either was given.
    pub fn skip_hook_creation_flag(&self) -> Option<bool> {
        match (self.skip_hook_creation, self.no_skip_hook_creation) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    Human,
    Json,
}

fn strip_leading_whitespace(value: &str) -> Result<String, String> {
    Ok(value.trim_start().to_string())
}

fn parse_dependency(value: &str) -> Result<(String, PathBuf), String> {
    match value.split_once('=') {
        Some((name, prefix)) if !name.is_empty() && !prefix.is_empty() => {
            Ok((name.to_string(), PathBuf::from(prefix)))
        }
        _ => Err(format!("expected NAME=PREFIX, got `{}`", value)),
    }
}
