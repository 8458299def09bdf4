//! Transport-facing channel contracts
//!
//! A [`Connection`] is the opaque handle a connector places inside a
//! session. It opens the per-operation channels: an exec channel delivering
//! [`ExecEvent`]s, and a transfer sub-channel driving one bulk upload.

use crate::error::Result;
use crate::exec::ExecOptions;
use async_channel::Receiver;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Which remote stream a data chunk belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamKind {
    /// The primary output stream
    Stdout,
    /// The error output stream
    Stderr,
}

/// An event on an exec channel
///
/// The channel contract is: zero or more `Data` events, then exactly one
/// `Exit`, then exactly one `Close`. Transports are known to deliver `Data`
/// after `Exit`, so consumers must keep reading until `Close`. A dropped
/// sender counts as a close.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ExecEvent {
    /// A chunk of stream data, in arrival order
    Data {
        /// The stream the chunk arrived on
        kind: StreamKind,
        /// The raw bytes
        bytes: Vec<u8>,
    },
    /// The remote process exited; no payload accompanies the later `Close`,
    /// so the code and signal must be remembered from here
    Exit {
        /// Exit code, if the process exited normally
        code: Option<i32>,
        /// Signal that terminated the process, if any
        signal: Option<String>,
    },
    /// The channel is fully drained; no further events follow
    Close,
}

/// An out-of-band fatal condition on a transfer sub-channel
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TransferEvent {
    /// The transfer stalled
    Timeout,
    /// The transport reported an error
    Error {
        /// The reason reported by the transport
        reason: String,
    },
}

/// The opaque transport handle owned by a session
#[async_trait]
pub trait Connection: Send {
    /// Run a command remotely, returning the channel its events arrive on
    async fn exec(&mut self, command: &str, options: &ExecOptions) -> Result<Receiver<ExecEvent>>;

    /// Open the sub-channel for one bulk file transfer
    async fn open_transfer(&mut self) -> Result<Box<dyn TransferChannel>>;
}

/// A sub-channel driving one bulk file transfer
#[async_trait]
pub trait TransferChannel: Send {
    /// Perform the transfer, reporting `(bytes_sent, bytes_total)` through
    /// `progress` as chunks go out. Resolves when the transfer finishes.
    async fn transfer(
        &mut self,
        src: &str,
        dest: &str,
        progress: &mut (dyn FnMut(u64, u64) + Send),
    ) -> Result<()>;

    /// Receiver for out-of-band fatal conditions. May be read concurrently
    /// with an in-flight `transfer`.
    fn events(&self) -> Receiver<TransferEvent>;

    /// Release the sub-channel. The owning upload calls this exactly once,
    /// whatever the outcome.
    async fn release(&mut self);
}
