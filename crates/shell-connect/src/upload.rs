//! File upload over a dedicated transfer sub-channel

use crate::channel::{TransferChannel, TransferEvent};
use crate::error::{Error, Result};
use crate::operation::{Completion, CompletionState};
use futures::{FutureExt, pin_mut, select};
use serde::{Deserialize, Serialize};
use std::future::{Future, IntoFuture};
use std::pin::Pin;
use tracing::debug;

/// A progress notification for an upload in flight
///
/// Notifications are emitted only when the integer percentage changes, so
/// observers are not flooded with per-chunk noise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadProgress {
    /// Bytes sent so far
    pub bytes_sent: u64,
    /// Total bytes to send
    pub bytes_total: u64,
    /// Derived integer percentage
    pub percent: u8,
}

/// A file upload in flight
///
/// Awaiting the operation drives the transfer and resolves to the
/// destination path; a callback registered with [`Upload::on_complete`]
/// observes the same terminal outcome, exactly once. The transfer
/// sub-channel is always released before the operation finalizes,
/// whatever the outcome.
#[must_use = "an upload does nothing until awaited"]
pub struct Upload {
    host: String,
    port: u16,
    username: Option<String>,
    src: String,
    dest: String,
    setup: Result<Box<dyn TransferChannel>>,
    completion: Completion<String>,
    on_progress: Option<Box<dyn FnMut(UploadProgress) + Send>>,
    on_done: Option<Box<dyn FnMut() + Send>>,
    last_percent: Option<u8>,
}

impl Upload {
    pub(crate) fn new(
        host: String,
        port: u16,
        username: Option<String>,
        src: String,
        dest: String,
        setup: Result<Box<dyn TransferChannel>>,
    ) -> Self {
        Self {
            host,
            port,
            username,
            src,
            dest,
            setup,
            completion: Completion::new(),
            on_progress: None,
            on_done: None,
            last_percent: None,
        }
    }

    /// Register a completion callback, invoked once with the terminal
    /// outcome
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&Result<String>) + Send + 'static,
    {
        self.completion.set_callback(callback);
        self
    }

    /// Register an observer for percentage-change progress notifications
    pub fn on_progress<F>(mut self, observer: F) -> Self
    where
        F: FnMut(UploadProgress) + Send + 'static,
    {
        self.on_progress = Some(Box::new(observer));
        self
    }

    /// Register an observer for the terminal done notification, fired when
    /// the transfer's own completion path runs (not on an out-of-band
    /// timeout or transport error)
    pub fn on_done<F>(mut self, observer: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        self.on_done = Some(Box::new(observer));
        self
    }

    /// Current lifecycle state
    pub fn state(&self) -> CompletionState {
        self.completion.state()
    }

    /// Drive the transfer to completion and return the destination path
    pub async fn wait(self) -> Result<String> {
        let Upload {
            host,
            port,
            username,
            src,
            dest,
            setup,
            mut completion,
            mut on_progress,
            mut on_done,
            mut last_percent,
        } = self;
        let user = username.as_deref().unwrap_or("-").to_string();

        let mut chan = match setup {
            Ok(chan) => chan,
            // No sub-channel was opened, so there is nothing to release.
            Err(err) => return completion.finish(Err(err)),
        };
        let events = chan.events();

        let (result, via_transfer) = {
            let mut progress = |bytes_sent: u64, bytes_total: u64| {
                // A zero-length transfer is complete by definition.
                let percent = if bytes_total == 0 {
                    100
                } else {
                    (bytes_sent.saturating_mul(100) / bytes_total).min(100) as u8
                };
                if last_percent != Some(percent) {
                    last_percent = Some(percent);
                    if let Some(observer) = on_progress.as_mut() {
                        observer(UploadProgress {
                            bytes_sent,
                            bytes_total,
                            percent,
                        });
                    }
                }
            };

            let transfer = chan.transfer(&src, &dest, &mut progress).fuse();
            pin_mut!(transfer);
            let fatal = events.recv().fuse();
            pin_mut!(fatal);

            loop {
                select! {
                    result = transfer => break (result, true),
                    event = fatal => match event {
                        Ok(TransferEvent::Timeout) => break (Err(Error::TransferTimeout), false),
                        Ok(TransferEvent::Error { reason }) => {
                            break (Err(Error::TransferFailed { reason }), false);
                        }
                        // The transport closed its event channel without a
                        // fatal condition; the transfer outcome decides.
                        Err(_) => {}
                    },
                }
            }
        };

        // Release the sub-channel before finalizing, whatever happened.
        chan.release().await;
        debug!("{}@{}:{} PUT {} {} finished", user, host, port, src, dest);

        let outcome = completion.finish(result.map(|()| dest));
        if via_transfer {
            if let Some(observer) = on_done.as_mut() {
                observer();
            }
        }
        outcome
    }
}

impl IntoFuture for Upload {
    type Output = Result<String>;
    type IntoFuture = Pin<Box<dyn Future<Output = Self::Output> + Send>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(self.wait())
    }
}
