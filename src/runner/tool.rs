use std::process::Stdio;

use nix::errno::Errno;
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::buffer::StreamKind;
use crate::event::{ProcessEvent, STATE_RUNNING, STATE_STARTING};
use crate::monitor::TerminationRequest;

/// Handle for a running tool process
pub struct ToolHandle {
    pid: Option<u32>,
    receiver: mpsc::Receiver<ProcessEvent>,
}

impl ToolHandle {
    /// Receive the next event asynchronously
    ///
    /// Returns `None` once the final `Finished`/`Error` event has been
    /// delivered and the channel closed behind it.
    pub async fn next_event(&mut self) -> Option<ProcessEvent> {
        self.receiver.recv().await
    }

    /// Get the process ID
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Advisory stop: deliver SIGTERM to the tool process.
    ///
    /// Fire-and-forget, does not wait for the process to die. Succeeds as a
    /// no-op when the process is already gone.
    pub fn terminate(&self, request: TerminationRequest) -> std::io::Result<()> {
        tracing::debug!(cause = ?request.cause, pid = ?self.pid, "termination requested");
        self.signal(Signal::SIGTERM)
    }

    /// Kill the process with SIGKILL
    pub fn kill(&self) -> std::io::Result<()> {
        self.signal(Signal::SIGKILL)
    }

    fn signal(&self, signal: Signal) -> std::io::Result<()> {
        let Some(pid) = self.pid else {
            return Ok(());
        };
        match signal::kill(Pid::from_raw(pid as i32), signal) {
            // ESRCH means the process already exited
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(errno) => Err(std::io::Error::from_raw_os_error(errno as i32)),
        }
    }
}

/// Tool process execution manager
pub struct ToolRunner;

impl ToolRunner {
    /// Spawn the packaging tool with piped stdout/stderr.
    ///
    /// Lifecycle states, output lines, and the exit all arrive as events on
    /// the returned handle, with `Finished`/`Error` always last. A spawn
    /// failure is returned directly; the caller decides how to surface it.
    pub async fn spawn(program: &str, args: &[String]) -> std::io::Result<ToolHandle> {
        let mut child = Command::new(program)
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let pid = child.id();
        tracing::debug!(program, ?pid, "tool process spawned");

        let (tx, rx) = mpsc::channel(1000);

        let _ = tx
            .send(ProcessEvent::State(STATE_STARTING.to_string()))
            .await;
        let _ = tx.send(ProcessEvent::State(STATE_RUNNING.to_string())).await;

        // Capture stdout
        let stdout_reader = child.stdout.take().map(|stdout| {
            let tx_stdout = tx.clone();
            tokio::spawn(async move {
                let reader = BufReader::new(stdout);
                let mut lines = reader.lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    let _ = tx_stdout
                        .send(ProcessEvent::Output(StreamKind::Stdout, line))
                        .await;
                }
            })
        });

        // Capture stderr
        let stderr_reader = child.stderr.take().map(|stderr| {
            let tx_stderr = tx.clone();
            tokio::spawn(async move {
                let reader = BufReader::new(stderr);
                let mut lines = reader.lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    let _ = tx_stderr
                        .send(ProcessEvent::Output(StreamKind::Stderr, line))
                        .await;
                }
            })
        });

        // The pipes must drain before the exit is reported, so the final
        // event is always last.
        tokio::spawn(async move {
            join_reader(stdout_reader).await;
            join_reader(stderr_reader).await;
            let event = match child.wait().await {
                Ok(status) => ProcessEvent::Finished(status.code().unwrap_or(-1)),
                Err(e) => ProcessEvent::Error(e.to_string()),
            };
            let _ = tx.send(event).await;
        });

        Ok(ToolHandle { pid, receiver: rx })
    }
}

async fn join_reader(handle: Option<JoinHandle<()>>) {
    if let Some(handle) = handle {
        let _ = handle.await;
    }
}
