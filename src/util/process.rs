//! Subprocess execution utilities.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Output, Stdio};

use anyhow::{Context, Result};
use tokio::process::Command;

/// Builder for subprocess execution.
#[derive(Debug, Clone)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    env: Option<BTreeMap<String, String>>,
    cwd: Option<PathBuf>,
    stdout_to_stderr: bool,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: None,
            cwd: None,
            stdout_to_stderr: false,
        }
    }

    /// Create a process builder from an argument vector (`argv[0]` is the program).
    pub fn from_argv(argv: &[String]) -> Option<Self> {
        let (program, args) = argv.split_first()?;
        Some(ProcessBuilder::new(program).args(args))
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Replace the whole child environment.
    ///
    /// Without this the child inherits the current process environment.
    /// Inherited variables that are not valid UTF-8 cannot appear in `env`
    /// and are passed through unchanged.
    pub fn envs(mut self, env: BTreeMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Write the child's stdout to our stderr when running with [`status`].
    ///
    /// [`status`]: ProcessBuilder::status
    pub fn stdout_to_stderr(mut self, enabled: bool) -> Self {
        self.stdout_to_stderr = enabled;
        self
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Build the Command.
    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        if let Some(ref env) = self.env {
            cmd.env_clear();
            cmd.envs(non_utf8_vars(std::env::vars_os(), env));
            cmd.envs(env);
        }

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        // Dropping the future (e.g. an aborted build task) terminates the child.
        cmd.kill_on_drop(true);
        cmd
    }

    /// Execute the command, capturing stdout and stderr.
    pub async fn exec(&self) -> Result<Output> {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        cmd.output()
            .await
            .with_context(|| format!("failed to execute `{}`", self.display_command()))
    }

    /// Execute with inherited stdio and return the exit status only.
    pub async fn status(&self) -> Result<ExitStatus> {
        let mut cmd = self.build_command();
        cmd.stdin(Stdio::null());
        if self.stdout_to_stderr {
            cmd.stdout(std::io::stderr());
        }

        cmd.status()
            .await
            .with_context(|| format!("failed to execute `{}`", self.display_command()))
    }

    /// Display the command for error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

/// Variables from `vars` that a `String` map cannot hold and `replaced` does
/// not already set.
fn non_utf8_vars<I>(vars: I, replaced: &BTreeMap<String, String>) -> Vec<(OsString, OsString)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter(|(key, value)| match key.to_str() {
            Some(key) => value.to_str().is_none() && !replaced.contains_key(key),
            None => true,
        })
        .collect()
}

/// Exit code of a finished child.
///
/// A child terminated by a signal has no code and is reported as `1`.
pub fn exit_code(status: ExitStatus) -> i32 {
    match status.code() {
        Some(code) => code,
        None => {
            tracing::warn!("process terminated without an exit code: {}", status);
            1
        }
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Determine the path of an executable.
///
/// A non-empty `environment_variable` overrides the location instead of
/// searching the PATH for `executable_name`.
pub fn which_executable(environment_variable: &str, executable_name: &str) -> Option<PathBuf> {
    which_executable_with(
        |key| std::env::var(key).ok(),
        environment_variable,
        executable_name,
    )
}

/// Same as [`which_executable`] with an explicit environment lookup.
pub fn which_executable_with<F>(
    lookup: F,
    environment_variable: &str,
    executable_name: &str,
) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(environment_variable) {
        Some(value) if !value.is_empty() => Some(PathBuf::from(value)),
        _ => find_executable(executable_name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_builder() {
        let output = ProcessBuilder::new("echo").arg("hello").exec().await.unwrap();

        assert!(output.status.success());
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert_eq!(stdout.trim(), "hello");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_replaced_environment() {
        let mut env = BTreeMap::new();
        env.insert("PATH".to_string(), std::env::var("PATH").unwrap_or_default());
        env.insert("REBAR3_TEST_VALUE".to_string(), "42".to_string());

        let output = ProcessBuilder::new("sh")
            .args(["-c", "echo $REBAR3_TEST_VALUE"])
            .envs(env)
            .exec()
            .await
            .unwrap();

        assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "42");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_status_exit_code() {
        let status = ProcessBuilder::new("sh")
            .args(["-c", "exit 3"])
            .status()
            .await
            .unwrap();

        assert_eq!(exit_code(status), 3);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_vars_pass_through() {
        use std::os::unix::ffi::OsStringExt;

        let raw = || OsString::from_vec(vec![b'a', 0xff]);
        let vars = vec![
            (OsString::from("PLAIN"), OsString::from("ok")),
            (OsString::from("RAW_VALUE"), raw()),
            (raw(), OsString::from("raw key")),
            (OsString::from("OVERRIDDEN"), raw()),
        ];
        let mut replaced = BTreeMap::new();
        replaced.insert("OVERRIDDEN".to_string(), "composed".to_string());

        let kept = non_utf8_vars(vars, &replaced);
        assert_eq!(
            kept,
            vec![
                (OsString::from("RAW_VALUE"), raw()),
                (raw(), OsString::from("raw key")),
            ]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_stdout_to_stderr_keeps_exit_code() {
        let status = ProcessBuilder::new("sh")
            .args(["-c", "echo redirected; exit 4"])
            .stdout_to_stderr(true)
            .status()
            .await
            .unwrap();

        assert_eq!(exit_code(status), 4);
    }

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("rebar3").args(["release", "-n", "demo"]);

        assert_eq!(pb.display_command(), "rebar3 release -n demo");
    }

    #[test]
    fn test_from_argv() {
        let argv = vec!["rebar3".to_string(), "compile".to_string()];
        let pb = ProcessBuilder::from_argv(&argv).unwrap();
        assert_eq!(pb.get_program(), Path::new("rebar3"));
        assert_eq!(pb.get_args(), ["compile"]);

        assert!(ProcessBuilder::from_argv(&[]).is_none());
    }

    #[test]
    fn test_which_executable_override() {
        let found = which_executable_with(
            |key| (key == "REBAR3_COMMAND").then(|| "/opt/rebar3/bin/rebar3".to_string()),
            "REBAR3_COMMAND",
            "rebar3-binary-that-does-not-exist",
        );
        assert_eq!(found, Some(PathBuf::from("/opt/rebar3/bin/rebar3")));
    }

    #[test]
    fn test_which_executable_empty_override_falls_back() {
        let found = which_executable_with(
            |_| Some(String::new()),
            "REBAR3_COMMAND",
            "rebar3-binary-that-does-not-exist",
        );
        assert_eq!(found, None);
    }
}
