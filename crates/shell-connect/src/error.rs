//! Error types for connection and remote operations

use thiserror::Error;

/// Unified error type for connecting and running remote operations
#[derive(Error, Debug)]
pub enum Error {
    /// Nothing is listening for this protocol on the target port.
    ///
    /// This is the only error the factory suppresses while falling back to
    /// the next registered protocol. Connectors must reserve it for the
    /// connection-refused case and report every other failure through a
    /// different variant.
    #[error("connection refused: no {protocol} listener on {host}:{port}")]
    TransportUnavailable {
        /// The protocol that found nothing listening
        protocol: String,
        /// The target host
        host: String,
        /// The target port
        port: u16,
    },

    /// The connection attempt failed for a non-recoverable reason
    /// (authentication, protocol negotiation, anything that is not a
    /// plain refusal)
    #[error("connection to {host} failed: {reason}")]
    ConnectionFailed {
        /// The target host
        host: String,
        /// The detailed reason for the failure
        reason: String,
    },

    /// Every candidate protocol was tried (or skipped as unknown) without
    /// a successful connection
    #[error("unable to connect to \"{host}\"; attempted protocols: {}", .attempted.join(", "))]
    ExhaustedProtocols {
        /// The target host
        host: String,
        /// The protocols actually attempted, in trial order
        attempted: Vec<String>,
    },

    /// A remote command exited with a non-zero code
    #[error("command failed: {message}")]
    CommandFailed {
        /// The non-zero exit code
        code: i32,
        /// The signal that terminated the process, if any
        signal: Option<String>,
        /// Trimmed stderr text captured from the command
        message: String,
        /// Primary-stream output captured before the failure
        stdout: String,
    },

    /// The exec or transfer channel could not be opened before any
    /// streaming began
    #[error("channel setup failed: {reason}")]
    ChannelSetup {
        /// The reason the channel could not be opened
        reason: String,
    },

    /// The transfer sub-channel stalled
    #[error("transfer timed out")]
    TransferTimeout,

    /// The transfer sub-channel reported a transport error
    #[error("transfer failed: {reason}")]
    TransferFailed {
        /// The reason reported by the transport
        reason: String,
    },

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// For convenience, re-export specific error constructors
impl Error {
    /// Create a transport-unavailable (connection refused) error
    pub fn transport_unavailable(
        protocol: impl Into<String>,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self::TransportUnavailable {
            protocol: protocol.into(),
            host: host.into(),
            port,
        }
    }

    /// Create a connection-failed error
    pub fn connection_failed(host: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ConnectionFailed {
            host: host.into(),
            reason: reason.into(),
        }
    }

    /// Create a channel-setup error
    pub fn channel_setup(reason: impl Into<String>) -> Self {
        Self::ChannelSetup {
            reason: reason.into(),
        }
    }

    /// Create a transfer-failed error
    pub fn transfer_failed(reason: impl Into<String>) -> Self {
        Self::TransferFailed {
            reason: reason.into(),
        }
    }

    /// Whether this error is the recoverable connection-refused class that
    /// the factory may suppress during protocol fallback
    pub fn is_transport_unavailable(&self) -> bool {
        matches!(self, Error::TransportUnavailable { .. })
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
