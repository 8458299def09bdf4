//! Protocol-agnostic remote shell connections
//!
//! This crate provides a unified interface for opening a remote
//! command-execution session against a host, running commands on it, and
//! uploading files to it, with automatic fallback across multiple
//! transport protocols.
//!
//! Wire-level transports are supplied by the embedder as [`Connector`]
//! implementations registered on a [`ShellFactory`]; the factory tries
//! them in order, suppressing only connection refusals, and yields a
//! [`Session`] from the first one that succeeds.

pub mod channel;
pub mod connector;
pub mod error;
pub mod exec;
pub mod factory;
pub mod operation;
pub mod session;
pub mod upload;

pub use channel::{Connection, ExecEvent, StreamKind, TransferChannel, TransferEvent};
pub use connector::{ConnectOptions, Connector};
pub use error::{Error, Result};
pub use exec::{CommandOutput, Exec, ExecNotification, ExecOptions};
pub use factory::ShellFactory;
pub use operation::CompletionState;
pub use session::Session;
pub use upload::{Upload, UploadProgress};
