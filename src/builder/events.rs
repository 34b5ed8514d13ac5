//! Build event types.
//!
//! Events are side-effect notifications for observability; nothing in the
//! build sequence depends on whether or how they are consumed. With
//! `--message-format=json` each event is printed as one JSON object per line.
//!
//! # Event Types
//!
//! - `build-started`: A package build began
//! - `build-progress`: A phase of the package build began
//! - `build-finished`: The package build ended (success or failure)

use std::fmt;
use std::sync::Mutex;

use serde::Serialize;

/// Phases of a package build, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BuildPhase {
    Prepare,
    Compile,
    Package,
    Install,
    HookGeneration,
}

impl BuildPhase {
    /// Progress marker reported when the phase starts.
    pub fn progress_label(&self) -> Option<&'static str> {
        match self {
            BuildPhase::Prepare => Some("prepare"),
            BuildPhase::Compile => Some("build"),
            BuildPhase::Package => Some("build binary"),
            BuildPhase::Install => Some("install"),
            BuildPhase::HookGeneration => None,
        }
    }
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildPhase::Prepare => "prepare",
            BuildPhase::Compile => "compile",
            BuildPhase::Package => "package",
            BuildPhase::Install => "install",
            BuildPhase::HookGeneration => "hook generation",
        };
        f.write_str(name)
    }
}

/// A build event emitted during a package build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason")]
pub enum BuildEvent {
    /// A package build began.
    #[serde(rename = "build-started")]
    BuildStarted {
        /// Package name
        package: String,
    },

    /// A build phase began.
    #[serde(rename = "build-progress")]
    Progress {
        /// Package name
        package: String,
        /// Progress marker (`prepare`, `build`, `build binary`, `install`)
        marker: String,
    },

    /// The package build ended.
    #[serde(rename = "build-finished")]
    BuildFinished {
        /// Package name
        package: String,
        /// Whether the build succeeded
        success: bool,
        /// Exit code of the build (0 on success)
        exit_code: i32,
        /// Phase that failed
        #[serde(skip_serializing_if = "Option::is_none")]
        failed_phase: Option<BuildPhase>,
        /// Total build duration in milliseconds
        duration_ms: u64,
    },
}

impl BuildEvent {
    /// Create a build started event.
    pub fn started(package: impl Into<String>) -> Self {
        BuildEvent::BuildStarted {
            package: package.into(),
        }
    }

    /// Create a progress event.
    pub fn progress(package: impl Into<String>, marker: impl Into<String>) -> Self {
        BuildEvent::Progress {
            package: package.into(),
            marker: marker.into(),
        }
    }

    /// Serialize this event to a JSON string.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Receiver of build events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: BuildEvent);
}

/// Sink that drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: BuildEvent) {}
}

/// Sink that keeps events in memory.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<BuildEvent>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events received so far.
    pub fn events(&self) -> Vec<BuildEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Progress markers received so far, in order.
    pub fn markers(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                BuildEvent::Progress { marker, .. } => Some(marker),
                _ => None,
            })
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: BuildEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}
