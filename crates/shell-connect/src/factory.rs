//! Connection factory with ordered multi-protocol fallback

use crate::connector::{ConnectOptions, Connector};
use crate::error::{Error, Result};
use crate::session::Session;
use std::collections::HashMap;
use tracing::debug;

/// A registry of named connectors, tried in order until one succeeds
///
/// Protocol order matters: register the preferred transport first and the
/// legacy fallbacks after it. During a connect, a connector failing with
/// the connection-refused class is suppressed and the next candidate is
/// tried; any other failure aborts the whole attempt immediately.
#[derive(Default)]
pub struct ShellFactory {
    order: Vec<String>,
    protocols: HashMap<String, Box<dyn Connector>>,
}

impl ShellFactory {
    /// Create an empty factory
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a connector under a protocol name
    ///
    /// `name` must be non-empty. Registration order defines the default
    /// trial order. Registering the same name again replaces the connector
    /// (last write wins) but keeps the name's original trial position.
    pub fn register(&mut self, name: impl Into<String>, connector: impl Connector + 'static) {
        let name = name.into();
        debug_assert!(!name.is_empty(), "protocol name must be non-empty");
        if !self.protocols.contains_key(&name) {
            self.order.push(name.clone());
        }
        self.protocols.insert(name, Box::new(connector));
    }

    /// The default trial order
    pub fn protocols(&self) -> &[String] {
        &self.order
    }

    /// Establish a session, falling back across protocols
    ///
    /// The trial order is `options.protocols` when given, the registration
    /// order otherwise. Names with no registered connector are skipped
    /// silently and do not count as attempts. Connectors run strictly
    /// sequentially; the first success wins and nothing further is tried.
    pub async fn connect(&self, options: &ConnectOptions) -> Result<Session> {
        let order = options.protocols.as_deref().unwrap_or(&self.order);
        let mut attempted = Vec::new();

        for name in order {
            let Some(connector) = self.protocols.get(name) else {
                continue;
            };
            // Recorded before the attempt so the log reflects intent even
            // if the connector fails straight away.
            attempted.push(name.clone());
            debug!("trying {} to {}:{}", name, options.host, options.port);

            match connector.connect(options.port, &options.host, options).await {
                Ok(session) => return Ok(session),
                Err(err) if err.is_transport_unavailable() => {
                    debug!("{} connection refused", name);
                }
                Err(err) => return Err(err),
            }
        }

        Err(Error::ExhaustedProtocols {
            host: options.host.clone(),
            attempted,
        })
    }
}
