//! `colcon-rebar3 build` command

use std::sync::Arc;

use anyhow::{bail, Result};

use crate::cli::{BuildArgs, MessageFormat};
use colcon_rebar3::builder::{BuildContext, Rebar3Locator};
use colcon_rebar3::environment::InstalledDependency;
use colcon_rebar3::ops::build::Rebar3BuildTask;
use colcon_rebar3::ops::identify::identify_path;
use colcon_rebar3::util::{GlobalContext, Shell};

/// Build one package and return the process exit code.
pub async fn execute(args: BuildArgs, verbose: bool) -> Result<i32> {
    let mut ctx = GlobalContext::new()?;
    ctx.set_verbose(verbose);

    let source = args
        .path
        .as_deref()
        .map(|p| ctx.resolve(p))
        .unwrap_or_else(|| ctx.cwd().to_path_buf());

    let Some(metadata) = identify_path(&source)? else {
        bail!("`{}` is not a rebar3 package", source.display());
    };
    let package = metadata.name.unwrap_or_default();

    // Load configuration (global + project); CLI flags win
    let config = ctx.config();
    let skip_hook_creation = args
        .skip_hook_creation_flag()
        .or(config.build.skip_hook_creation)
        .unwrap_or(false);
    let build_args = args.rebar3_build_args.or(config.rebar3.build_args);
    let release_args = args.rebar3_release_args.or(config.rebar3.release_args);

    let dependencies = args
        .dependencies
        .into_iter()
        .map(|(name, prefix)| InstalledDependency::new(name, ctx.resolve(&prefix)))
        .collect();

    let build_ctx = BuildContext::new(
        package,
        source,
        ctx.resolve(&args.build_base),
        ctx.resolve(&args.install_base),
    )
    .with_dependencies(dependencies)
    .with_build_args(build_args)
    .with_release_args(release_args)
    .with_skip_hook_creation(skip_hook_creation);

    let json = args.message_format == MessageFormat::Json;
    let shell = Arc::new(Shell::from_flags(ctx.is_verbose(), json));
    // stdout carries one JSON event per line; rebar3's own output goes to stderr
    let task = Rebar3BuildTask::new(Rebar3Locator::with_override(config.rebar3.command))
        .with_events(shell)
        .with_stdout_to_stderr(json);

    let outcome = task.build(&build_ctx, Vec::new()).await?;
    Ok(outcome.exit_code())
}
