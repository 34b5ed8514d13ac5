//! Terminal output for commands.
//!
//! Human mode prints right-aligned status lines on stderr and shows a
//! spinner while a build runs. JSON mode prints one build event per line
//! on stdout and nothing else.

use std::fmt::Display;
use std::io::{self, IsTerminal, Write};
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

use crate::builder::events::{BuildEvent, EventSink};

/// Output mode. Human and Json are mutually exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellMode {
    Human { verbose: bool, color: bool },
    Json,
}

impl Default for ShellMode {
    fn default() -> Self {
        ShellMode::Human {
            verbose: false,
            color: false,
        }
    }
}

/// Status words printed in front of human messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Building,
    Finished,
    Found,
    Failed,
    Warning,
}

impl Status {
    fn as_str(&self) -> &'static str {
        match self {
            Status::Building => "Building",
            Status::Finished => "Finished",
            Status::Found => "Found",
            Status::Failed => "Failed",
            Status::Warning => "Warning",
        }
    }

    fn color_code(&self) -> &'static str {
        match self {
            Status::Finished | Status::Found => "\x1b[1;32m",
            Status::Building => "\x1b[1;36m",
            Status::Warning => "\x1b[1;33m",
            Status::Failed => "\x1b[1;31m",
        }
    }
}

const STATUS_WIDTH: usize = 12;

/// Central output handle for the CLI.
#[derive(Debug)]
pub struct Shell {
    mode: ShellMode,
    spinner: Mutex<Option<ProgressBar>>,
}

impl Shell {
    pub fn new(mode: ShellMode) -> Self {
        Shell {
            mode,
            spinner: Mutex::new(None),
        }
    }

    /// Create a shell from CLI flags. JSON takes precedence over verbose.
    pub fn from_flags(verbose: bool, json: bool) -> Self {
        if json {
            Shell::new(ShellMode::Json)
        } else {
            Shell::new(ShellMode::Human {
                verbose,
                color: io::stderr().is_terminal(),
            })
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.mode, ShellMode::Json)
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self.mode, ShellMode::Human { verbose: true, .. })
    }

    fn use_color(&self) -> bool {
        matches!(self.mode, ShellMode::Human { color: true, .. })
    }

    /// Print `{status:>12} {msg}` to stderr. Ignored in JSON mode.
    pub fn status(&self, status: Status, msg: impl Display) {
        if self.is_json() {
            return;
        }
        let line = format!("{} {}", self.format_status(status), msg);
        match self.spinner.lock().ok().as_deref().and_then(Option::as_ref) {
            Some(pb) => pb.println(line),
            None => eprintln!("{}", line),
        }
    }

    /// Print one JSON line to stdout. Ignored in human mode.
    pub fn json_line(&self, line: &str) {
        if !self.is_json() {
            return;
        }
        let mut out = io::stdout().lock();
        let _ = writeln!(out, "{}", line);
        let _ = out.flush();
    }

    fn format_status(&self, status: Status) -> String {
        if self.use_color() {
            format!(
                "{}{:>width$}\x1b[0m",
                status.color_code(),
                status.as_str(),
                width = STATUS_WIDTH
            )
        } else {
            format!("{:>width$}", status.as_str(), width = STATUS_WIDTH)
        }
    }

    fn start_spinner(&self, package: &str) {
        // Verbose output interleaves with log lines; no spinner there
        if self.is_json() || self.is_verbose() || !io::stderr().is_terminal() {
            return;
        }
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {prefix} {msg}") {
            pb.set_style(style);
        }
        pb.set_prefix(package.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        if let Ok(mut slot) = self.spinner.lock() {
            *slot = Some(pb);
        }
    }

    fn set_spinner_message(&self, msg: &str) {
        if let Some(pb) = self.spinner.lock().ok().as_deref().and_then(Option::as_ref) {
            pb.set_message(msg.to_string());
        }
    }

    fn finish_spinner(&self) {
        if let Some(pb) = self.spinner.lock().ok().and_then(|mut slot| slot.take()) {
            pb.finish_and_clear();
        }
    }
}

impl Default for Shell {
    fn default() -> Self {
        Shell::new(ShellMode::default())
    }
}

impl EventSink for Shell {
    fn emit(&self, event: BuildEvent) {
        if self.is_json() {
            self.json_line(&event.to_json());
            return;
        }

        match event {
            BuildEvent::BuildStarted { package } => {
                self.status(Status::Building, &package);
                self.start_spinner(&package);
            }
            BuildEvent::Progress { marker, .. } => {
                if self.is_verbose() {
                    eprintln!("{:>width$} {}", "", marker, width = STATUS_WIDTH);
                }
                self.set_spinner_message(&marker);
            }
            BuildEvent::BuildFinished {
                package,
                success,
                exit_code,
                failed_phase,
                duration_ms,
            } => {
                self.finish_spinner();
                let secs = duration_ms as f64 / 1000.0;
                if success {
                    self.status(Status::Finished, format!("{} in {:.2}s", package, secs));
                } else {
                    let phase = failed_phase
                        .map(|p| p.to_string())
                        .unwrap_or_else(|| "build".to_string());
                    self.status(
                        Status::Failed,
                        format!("{} ({} exited with code {}) after {:.2}s", package, phase, exit_code, secs),
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modes() {
        let shell = Shell::from_flags(true, false);
        assert!(shell.is_verbose());
        assert!(!shell.is_json());

        // JSON wins over verbose
        let shell = Shell::from_flags(true, true);
        assert!(shell.is_json());
        assert!(!shell.is_verbose());
    }

    #[test]
    fn test_status_formatting() {
        let shell = Shell::new(ShellMode::Human {
            verbose: false,
            color: false,
        });
        let formatted = shell.format_status(Status::Found);
        assert_eq!(formatted.trim(), "Found");
        assert_eq!(formatted.len(), STATUS_WIDTH);

        let colored = Shell::new(ShellMode::Human {
            verbose: false,
            color: true,
        })
        .format_status(Status::Failed);
        assert!(colored.starts_with("\x1b[1;31m"));
        assert!(colored.ends_with("\x1b[0m"));
    }

    #[test]
    fn test_events_without_terminal() {
        // No spinner without a terminal; events must not panic
        let shell = Shell::default();
        shell.emit(BuildEvent::started("demo"));
        shell.emit(BuildEvent::progress("demo", "build"));
        shell.finish_spinner();
    }
}
