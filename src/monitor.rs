use crate::buffer::{LogBuffer, LogLine, StreamKind};
use crate::event::{ProcessEvent, STATE_RUNNING};

/// Status line shown after a clean exit
const STATUS_COMPLETE: &str = "packaging complete";
/// Status line shown when the tool could not run at all
const STATUS_TOOL_ERROR: &str = "tool error";
/// Logged alongside a tool error
const REMEDIATION_HINT: &str = "verify correct tool version is installed";

/// User-facing action offered by the hosting view
///
/// `Cancel` kills a running process; `Dismiss` and `Close` only put the view
/// away once the run is already over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionLabel {
    /// Stop the running process
    Cancel,
    /// Reveal the packaged output
    OpenOutput,
    /// Put the view away after a failed exit
    Dismiss,
    /// Put the view away after a tool error
    Close,
}

impl ActionLabel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cancel => "cancel",
            Self::OpenOutput => "open output location",
            Self::Dismiss => "dismiss",
            Self::Close => "close",
        }
    }
}

impl std::fmt::Display for ActionLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// No event delivered yet
    Idle,
    /// Events are flowing
    Running,
    /// Exited with code 0
    Succeeded,
    /// Exited non-zero or crashed
    Failed,
    /// Hosting view was dismissed
    Closed,
}

impl RunPhase {
    /// Terminal phases accept no further events
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Closed)
    }
}

/// Why a termination was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationCause {
    UserCancelled,
}

/// Command object asking the process runner to stop the tool
///
/// Advisory and fire-and-forget: the runner treats it as a no-op when
/// nothing is running anymore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminationRequest {
    pub cause: TerminationCause,
}

/// View-facing state derived from the event stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentationState {
    status_text: String,
    action_label: Option<ActionLabel>,
    log: LogBuffer,
}

impl PresentationState {
    fn new(max_log_lines: usize) -> Self {
        Self {
            status_text: String::new(),
            action_label: None,
            log: LogBuffer::new(max_log_lines),
        }
    }

    /// Current status line
    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// Action currently offered to the user, if any
    pub fn action_label(&self) -> Option<ActionLabel> {
        self.action_label
    }

    /// Full output log, stdout and stderr merged in arrival order
    pub fn log(&self) -> &LogBuffer {
        &self.log
    }

    /// Log line texts in arrival order
    pub fn log_lines(&self) -> impl Iterator<Item = &str> {
        self.log.iter().map(LogLine::text)
    }
}

/// Folds tool process events into a `PresentationState`
///
/// Owns the state for one run; the hosting view reads it for rendering and
/// forwards user actions back here. Single-threaded by contract: the host
/// serializes `on_event` and `on_close` calls.
pub struct ProcessMonitor {
    phase: RunPhase,
    state: PresentationState,
}

impl ProcessMonitor {
    /// Create a monitor with an unlimited log
    pub fn new() -> Self {
        Self::with_log_cap(0)
    }

    /// Create a monitor with a capped log (0 for unlimited)
    pub fn with_log_cap(max_log_lines: usize) -> Self {
        Self {
            phase: RunPhase::Idle,
            state: PresentationState::new(max_log_lines),
        }
    }

    /// Current lifecycle phase
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Read access for rendering
    pub fn state(&self) -> &PresentationState {
        &self.state
    }

    /// Apply one event and return the updated state for rendering.
    ///
    /// Events delivered after a terminal phase are ignored; the producer
    /// contract says they will not happen, but they must not corrupt state.
    pub fn on_event(&mut self, event: ProcessEvent) -> &PresentationState {
        if self.phase.is_terminal() {
            tracing::trace!(?event, phase = ?self.phase, "event after terminal phase ignored");
            return &self.state;
        }
        match event {
            ProcessEvent::State(text) => {
                if text == STATE_RUNNING {
                    self.state.action_label = Some(ActionLabel::Cancel);
                }
                self.state.status_text = text;
                self.phase = RunPhase::Running;
            }
            ProcessEvent::Output(kind, text) => {
                self.state.log.push(LogLine::new(kind, text));
                self.phase = RunPhase::Running;
            }
            ProcessEvent::Finished(0) => {
                tracing::debug!("run succeeded");
                self.state.status_text = STATUS_COMPLETE.to_string();
                self.state.action_label = Some(ActionLabel::OpenOutput);
                self.phase = RunPhase::Succeeded;
            }
            ProcessEvent::Finished(code) => {
                tracing::debug!(code, "run failed");
                self.state.status_text = format!("finished with errors, exit code = {code}");
                self.state.action_label = Some(ActionLabel::Dismiss);
                self.phase = RunPhase::Failed;
            }
            ProcessEvent::Error(message) => {
                tracing::debug!(%message, "tool error");
                self.state.status_text = STATUS_TOOL_ERROR.to_string();
                self.state.log.push(LogLine::new(StreamKind::Stderr, message));
                self.state
                    .log
                    .push(LogLine::new(StreamKind::Stderr, REMEDIATION_HINT.to_string()));
                self.state.action_label = Some(ActionLabel::Close);
                self.phase = RunPhase::Failed;
            }
        }
        &self.state
    }

    /// Dismissal hook for the hosting view.
    ///
    /// Reclaims the buffered log and asks the runner to stop the tool.
    /// Unconditional and idempotent: calling it after the run already
    /// finished is harmless, the runner makes the request a no-op.
    pub fn on_close(&mut self) -> TerminationRequest {
        self.state.log.clear();
        self.phase = RunPhase::Closed;
        TerminationRequest {
            cause: TerminationCause::UserCancelled,
        }
    }
}

impl Default for ProcessMonitor {
    fn default() -> Self {
        Self::new()
    }
}
