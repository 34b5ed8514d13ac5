//! Build a rebar3 package.
//!
//! A build runs these phases in order, each only if the previous one
//! succeeded:
//!
//! 1. prepare - compose the command environment, register hooks
//! 2. compile - `rebar3 compile [--rebar3-build-args]`
//! 3. package - `rebar3 release [--rebar3-release-args]`
//! 4. install - copy the release into `lib/<pkg>`, register the package
//! 5. hook generation - write environment scripts (unless skipped)

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info};

use crate::builder::rebar3::{build_command, release_dir, Rebar3Locator, Verb};
use crate::builder::{BuildContext, BuildError, BuildEvent, BuildPhase, EventSink, NullSink};
use crate::environment::{
    create_environment_scripts, get_command_environment, process_environment, EnvironmentHook,
};
use crate::ops::install::install_release;
use crate::util::process::{exit_code, ProcessBuilder};

/// Variable listing install prefixes for package discovery.
pub const AMENT_PREFIX_PATH: &str = "AMENT_PREFIX_PATH";

/// Exit code reported when the command environment cannot be composed.
pub const ENVIRONMENT_FAILURE_CODE: i32 = 1;

/// Exit code reported when a build stops on an error rather than a phase status.
pub const BUILD_ERROR_CODE: i32 = 1;

/// Terminal state of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Success,
    Failed { phase: BuildPhase, code: i32 },
}

impl BuildOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, BuildOutcome::Success)
    }

    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildOutcome::Success => 0,
            BuildOutcome::Failed { code, .. } => *code,
        }
    }

    /// Phase that failed, if any.
    pub fn failed_phase(&self) -> Option<BuildPhase> {
        match self {
            BuildOutcome::Success => None,
            BuildOutcome::Failed { phase, .. } => Some(*phase),
        }
    }
}

impl fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildOutcome::Success => write!(f, "success"),
            BuildOutcome::Failed { phase, code } => {
                write!(f, "{} failed with exit code {}", phase, code)
            }
        }
    }
}

/// Name of the hook advertising a package's install prefix.
pub fn ament_prefix_path_hook_name(package: &str) -> String {
    format!("rebar3_{}_ament_prefix_path", package)
}

/// Builds rebar3 packages.
///
/// One task can build many packages concurrently; it holds no per-build
/// state besides the memoized rebar3 location.
pub struct Rebar3BuildTask {
    locator: Rebar3Locator,
    events: Arc<dyn EventSink>,
    stdout_to_stderr: bool,
}

impl Rebar3BuildTask {
    /// Create a build task using `locator` to find rebar3.
    pub fn new(locator: Rebar3Locator) -> Self {
        Rebar3BuildTask {
            locator,
            events: Arc::new(NullSink),
            stdout_to_stderr: false,
        }
    }

    /// Send progress events to `events`.
    pub fn with_events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    /// Send rebar3's stdout to stderr, keeping stdout for machine output.
    pub fn with_stdout_to_stderr(mut self, enabled: bool) -> Self {
        self.stdout_to_stderr = enabled;
        self
    }

    fn progress(&self, ctx: &BuildContext, phase: BuildPhase) {
        if let Some(marker) = phase.progress_label() {
            self.events.emit(BuildEvent::progress(&ctx.package, marker));
        }
    }

    fn finished(&self, ctx: &BuildContext, outcome: &BuildOutcome, start: Instant) {
        self.events.emit(BuildEvent::BuildFinished {
            package: ctx.package.clone(),
            success: outcome.is_success(),
            exit_code: outcome.exit_code(),
            failed_phase: outcome.failed_phase(),
            duration_ms: start.elapsed().as_millis() as u64,
        });
    }

    /// Build, package and install one package.
    ///
    /// `additional_hooks` are written together with the package's own hook.
    /// Returns `Err` only for errors that are not a phase's exit status:
    /// a missing rebar3, a process that cannot be spawned, or a filesystem
    /// failure during install or hook generation. A finished event is sent
    /// in every case.
    pub async fn build(
        &self,
        ctx: &BuildContext,
        additional_hooks: Vec<EnvironmentHook>,
    ) -> Result<BuildOutcome, BuildError> {
        let start = Instant::now();
        self.events.emit(BuildEvent::started(&ctx.package));

        let mut phase = BuildPhase::Prepare;
        let outcome = match self.run_phases(ctx, additional_hooks, &mut phase).await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(package = %ctx.package, %phase, "build aborted: {}", e);
                let failed = BuildOutcome::Failed {
                    phase,
                    code: BUILD_ERROR_CODE,
                };
                self.finished(ctx, &failed, start);
                return Err(e);
            }
        };

        if let BuildOutcome::Failed { phase, code } = outcome {
            error!(package = %ctx.package, %phase, code, "build failed");
        }
        self.finished(ctx, &outcome, start);
        Ok(outcome)
    }

    async fn run_phases(
        &self,
        ctx: &BuildContext,
        additional_hooks: Vec<EnvironmentHook>,
        phase: &mut BuildPhase,
    ) -> Result<BuildOutcome, BuildError> {
        info!(
            "Building rebar3 package in '{}'",
            ctx.source_path.display()
        );

        let env = match get_command_environment(
            "build",
            &ctx.build_base,
            process_environment(),
            &ctx.dependencies,
        )
        .await
        {
            Ok(env) => env,
            Err(e) => {
                error!("{}", e);
                return Ok(BuildOutcome::Failed {
                    phase: BuildPhase::Prepare,
                    code: ENVIRONMENT_FAILURE_CODE,
                });
            }
        };

        self.progress(ctx, BuildPhase::Prepare);
        let hooks = self.prepare(ctx, additional_hooks);

        *phase = BuildPhase::Compile;
        let rebar3 = self.locator.require()?;

        self.progress(ctx, BuildPhase::Compile);
        let code = self
            .invoke(rebar3, Verb::Compile, ctx.build_args.as_deref(), ctx, &env)
            .await?;
        if code != 0 {
            return Ok(BuildOutcome::Failed {
                phase: BuildPhase::Compile,
                code,
            });
        }

        *phase = BuildPhase::Package;
        self.progress(ctx, BuildPhase::Package);
        let code = self
            .invoke(rebar3, Verb::Release, ctx.release_args.as_deref(), ctx, &env)
            .await?;
        if code != 0 {
            return Ok(BuildOutcome::Failed {
                phase: BuildPhase::Package,
                code,
            });
        }

        *phase = BuildPhase::Install;
        self.progress(ctx, BuildPhase::Install);
        install_release(&release_dir(&ctx.source_path), &ctx.install_base, &ctx.package)
            .map_err(|source| BuildError::Install {
                package: ctx.package.clone(),
                source,
            })?;

        if !ctx.skip_hook_creation {
            *phase = BuildPhase::HookGeneration;
            create_environment_scripts(&ctx.install_base, &ctx.package, &hooks).map_err(
                |source| BuildError::Hooks {
                    package: ctx.package.clone(),
                    source,
                },
            )?;
        }

        Ok(BuildOutcome::Success)
    }

    /// Register the package's own hooks ahead of any additional ones.
    fn prepare(
        &self,
        ctx: &BuildContext,
        additional_hooks: Vec<EnvironmentHook>,
    ) -> Vec<EnvironmentHook> {
        let mut hooks = vec![EnvironmentHook::prepend(
            ament_prefix_path_hook_name(&ctx.package),
            &ctx.package,
            AMENT_PREFIX_PATH,
            "",
        )];
        hooks.extend(additional_hooks);
        hooks
    }

    async fn invoke(
        &self,
        rebar3: &Path,
        verb: Verb,
        extra_args: Option<&[String]>,
        ctx: &BuildContext,
        env: &BTreeMap<String, String>,
    ) -> Result<i32, BuildError> {
        let argv = build_command(rebar3, verb, extra_args);
        let command = argv.join(" ");

        let Some(process) = ProcessBuilder::from_argv(&argv) else {
            return Err(BuildError::Spawn {
                command,
                source: anyhow::anyhow!("empty command line"),
            });
        };

        info!("Invoking '{}' in '{}'", command, ctx.source_path.display());
        let status = process
            .cwd(&ctx.source_path)
            .envs(env.clone())
            .stdout_to_stderr(self.stdout_to_stderr)
            .status()
            .await
            .map_err(|source| BuildError::Spawn {
                command: command.clone(),
                source,
            })?;

        Ok(exit_code(status))
    }
}

impl Default for Rebar3BuildTask {
    fn default() -> Self {
        Self::new(Rebar3Locator::new())
    }
}
