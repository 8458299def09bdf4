//! Connector trait for establishing sessions over a specific transport

use crate::error::Result;
use crate::session::Session;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Connection parameters handed to every connector attempt
///
/// Protocol-specific settings travel in `extra` and are passed through
/// verbatim; the factory itself only looks at `host`, `port` and the
/// optional `protocols` trial-order override.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConnectOptions {
    /// Target host (hostname or IP)
    pub host: String,
    /// Target port
    pub port: u16,
    /// Username to authenticate as, if the transport needs one
    pub username: Option<String>,
    /// Ordered protocol names restricting or reordering the trial order
    /// for this connect call; `None` uses the factory's registration order
    pub protocols: Option<Vec<String>>,
    /// Protocol-specific options, passed through to connectors untouched
    pub extra: HashMap<String, Value>,
}

impl ConnectOptions {
    /// Create options for the given host and port
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            username: None,
            protocols: None,
            extra: HashMap::new(),
        }
    }

    /// Set the username
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    /// Restrict or reorder the protocols tried for this connect call
    pub fn with_protocols<I, S>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.protocols = Some(protocols.into_iter().map(Into::into).collect());
        self
    }

    /// Add a protocol-specific option, passed through to connectors verbatim
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}

/// A connector that can establish a session using one specific transport
///
/// Implementations must report a plain connection refusal (nothing
/// listening on the port) as [`Error::TransportUnavailable`] so the factory
/// can fall back to the next protocol, and any other failure through a
/// different variant.
///
/// [`Error::TransportUnavailable`]: crate::error::Error::TransportUnavailable
#[async_trait]
pub trait Connector: Send + Sync {
    /// Attempt to connect, yielding a ready-to-use session
    async fn connect(&self, port: u16, host: &str, options: &ConnectOptions) -> Result<Session>;
}
