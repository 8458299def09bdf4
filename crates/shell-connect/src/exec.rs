//! Remote command execution with buffered, demultiplexed output

use crate::channel::{ExecEvent, StreamKind};
use crate::error::{Error, Result};
use crate::operation::{Completion, CompletionState};
use async_channel::Receiver;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use tracing::debug;

/// Options for a remote command, passed through to the transport
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecOptions {
    /// Environment variables to set for the remote command
    pub env: HashMap<String, String>,
    /// Transport-specific options, passed through verbatim
    pub extra: HashMap<String, Value>,
}

/// Captured result of a completed remote command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Everything the command wrote to its primary stream
    pub stdout: String,
    /// Everything the command wrote to its error stream
    pub stderr: String,
    /// Exit code, if the channel reported one before closing
    pub exit_code: Option<i32>,
    /// Signal that terminated the process, if any
    pub exit_signal: Option<String>,
}

impl CommandOutput {
    /// Whether the command completed successfully
    ///
    /// Only a literal non-zero exit code counts as failure; a channel that
    /// closed without reporting a code is treated as clean.
    pub fn success(&self) -> bool {
        !matches!(self.exit_code, Some(code) if code != 0)
    }
}

/// Terminal notification emitted to an exec observer
///
/// `Exit` marks logical process completion and `Close` marks the channel
/// fully drained; both carry the same code/signal payload. Neither is
/// emitted before the channel has closed, so observers never see output
/// truncated by late data events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecNotification {
    /// The remote process completed
    Exit {
        /// Exit code, if reported
        code: Option<i32>,
        /// Terminating signal, if any
        signal: Option<String>,
    },
    /// The channel is fully drained
    Close {
        /// Exit code, if reported
        code: Option<i32>,
        /// Terminating signal, if any
        signal: Option<String>,
    },
}

/// A command execution in flight
///
/// Awaiting the operation drives it to completion and yields the
/// [`CommandOutput`]; a callback registered with [`Exec::on_complete`]
/// observes the same terminal outcome, exactly once.
#[must_use = "an exec does nothing until awaited"]
pub struct Exec {
    host: String,
    port: u16,
    username: Option<String>,
    setup: Result<Receiver<ExecEvent>>,
    completion: Completion<CommandOutput>,
    notify: Option<Box<dyn FnMut(ExecNotification) + Send>>,
}

impl Exec {
    pub(crate) fn new(
        host: String,
        port: u16,
        username: Option<String>,
        setup: Result<Receiver<ExecEvent>>,
    ) -> Self {
        Self {
            host,
            port,
            username,
            setup,
            completion: Completion::new(),
            notify: None,
        }
    }

    /// Register a completion callback, invoked once with the terminal
    /// outcome
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&Result<CommandOutput>) + Send + 'static,
    {
        self.completion.set_callback(callback);
        self
    }

    /// Register an observer for terminal [`ExecNotification`]s
    pub fn on_notification<F>(mut self, observer: F) -> Self
    where
        F: FnMut(ExecNotification) + Send + 'static,
    {
        self.notify = Some(Box::new(observer));
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> CompletionState {
        self.completion.state()
    }

    /// Drive the exec channel to completion and return the outcome
    pub async fn wait(self) -> Result<CommandOutput> {
        let Exec {
            host,
            port,
            username,
            setup,
            mut completion,
            mut notify,
        } = self;
        let user = username.as_deref().unwrap_or("-").to_string();

        let events = match setup {
            Ok(events) => events,
            Err(err) => return completion.finish(Err(err)),
        };

        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let mut exit_code = None;
        let mut exit_signal: Option<String> = None;

        loop {
            match events.recv().await {
                Ok(ExecEvent::Data { kind, bytes }) => {
                    debug!("{}@{}:{} {}", user, host, port, String::from_utf8_lossy(&bytes));
                    match kind {
                        StreamKind::Stdout => stdout.extend_from_slice(&bytes),
                        StreamKind::Stderr => stderr.extend_from_slice(&bytes),
                    }
                }
                Ok(ExecEvent::Exit { code, signal }) => {
                    debug!("{}@{}:{} exit {{{:?}, {:?}}}", user, host, port, code, signal);
                    // Channels are known to deliver data after the exit
                    // notification. Hold the status until close so the
                    // buffers are complete.
                    exit_code = code;
                    exit_signal = signal;
                }
                // A dropped sender counts as a close; a channel that never
                // reported an exit still finalizes with what it had.
                Ok(ExecEvent::Close) | Err(_) => break,
            }
        }

        let stdout = String::from_utf8_lossy(&stdout).into_owned();
        let stderr = String::from_utf8_lossy(&stderr).into_owned();

        let result = match exit_code {
            Some(code) if code != 0 => Err(Error::CommandFailed {
                code,
                signal: exit_signal.clone(),
                message: stderr.trim().to_string(),
                stdout,
            }),
            _ => Ok(CommandOutput {
                stdout,
                stderr,
                exit_code,
                exit_signal: exit_signal.clone(),
            }),
        };

        let outcome = completion.finish(result);
        if let Some(observer) = notify.as_mut() {
            observer(ExecNotification::Exit {
                code: exit_code,
                signal: exit_signal.clone(),
            });
            observer(ExecNotification::Close {
                code: exit_code,
                signal: exit_signal,
            });
        }
        outcome
    }
}

impl IntoFuture for Exec {
    type Output = Result<CommandOutput>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}
