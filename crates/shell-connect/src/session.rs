//! Session capability returned by a successful connect

use crate::channel::Connection;
use crate::exec::{Exec, ExecOptions};
use crate::upload::Upload;
use tracing::debug;

/// An established remote shell session
///
/// Created once per successful connect and exclusively owned by the
/// caller; the factory keeps no reference to it. A session is meant to
/// live for one logical unit of remote work and is not pooled.
pub struct Session {
    host: String,
    port: u16,
    username: Option<String>,
    connection: Box<dyn Connection>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Create a session around an established transport connection
    ///
    /// Called by connectors once their transport is ready.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        username: Option<String>,
        connection: Box<dyn Connection>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            username,
            connection,
        }
    }

    /// The host this session is connected to
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The port this session is connected to
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The username this session authenticated as, if any
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    fn user(&self) -> &str {
        self.username.as_deref().unwrap_or("-")
    }

    /// Run a command on the remote host, buffering its output
    ///
    /// The returned [`Exec`] resolves when the command's channel has fully
    /// closed; a channel that fails to open resolves it immediately with
    /// the setup error.
    pub async fn exec(&mut self, command: &str, options: ExecOptions) -> Exec {
        debug!("{}@{}:{}$ {}", self.user(), self.host, self.port, command);
        let setup = self.connection.exec(command, &options).await;
        Exec::new(self.host.clone(), self.port, self.username.clone(), setup)
    }

    /// Upload a file to the remote host
    ///
    /// The returned [`Upload`] resolves to `dest` once the transfer
    /// sub-channel has been driven to completion and released.
    pub async fn upload(&mut self, src: &str, dest: &str) -> Upload {
        debug!("{}@{}:{}$ PUT {} {}", self.user(), self.host, self.port, src, dest);
        let setup = self.connection.open_transfer().await;
        Upload::new(
            self.host.clone(),
            self.port,
            self.username.clone(),
            src.to_string(),
            dest.to_string(),
            setup,
        )
    }
}
