//! Shared mocks for integration tests
#![allow(dead_code)]

use async_channel::{Receiver, unbounded};
use async_trait::async_trait;
use shell_connect::{
    Connection, Error, ExecEvent, ExecOptions, Result, TransferChannel, TransferEvent,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

/// Build an exec channel pre-loaded with a fixed event script.
pub fn scripted_events(script: Vec<ExecEvent>) -> Receiver<ExecEvent> {
    let (tx, rx) = unbounded();
    for event in script {
        tx.try_send(event).unwrap();
    }
    rx
}

/// A connection whose exec channel and transfer sub-channel are handed in
/// up front; a missing one reports a setup failure.
pub struct ScriptedConnection {
    pub events: Option<Receiver<ExecEvent>>,
    pub transfer: Option<Box<dyn TransferChannel>>,
}

#[async_trait]
impl Connection for ScriptedConnection {
    async fn exec(&mut self, _command: &str, _options: &ExecOptions) -> Result<Receiver<ExecEvent>> {
        self.events
            .take()
            .ok_or_else(|| Error::channel_setup("exec channel unavailable"))
    }

    async fn open_transfer(&mut self) -> Result<Box<dyn TransferChannel>> {
        self.transfer
            .take()
            .ok_or_else(|| Error::channel_setup("transfer sub-channel unavailable"))
    }
}

/// A transfer sub-channel with a scripted progress sequence and outcome.
pub struct MockTransfer {
    /// `(bytes_sent, bytes_total)` pairs reported through the progress hook
    pub steps: Vec<(u64, u64)>,
    /// Error to complete with; `None` completes successfully
    pub fail: Option<Error>,
    /// Never complete the transfer (so an out-of-band event decides)
    pub hang: bool,
    /// Out-of-band fatal event channel
    pub events: Receiver<TransferEvent>,
    /// Incremented on every `release` call
    pub released: Arc<AtomicUsize>,
}

impl MockTransfer {
    pub fn succeeding(steps: Vec<(u64, u64)>, released: Arc<AtomicUsize>) -> Self {
        let (_tx, rx) = unbounded();
        Self {
            steps,
            fail: None,
            hang: false,
            events: rx,
            released,
        }
    }
}

#[async_trait]
impl TransferChannel for MockTransfer {
    async fn transfer(
        &mut self,
        _src: &str,
        _dest: &str,
        progress: &mut (dyn FnMut(u64, u64) + Send),
    ) -> Result<()> {
        for (sent, total) in &self.steps {
            progress(*sent, *total);
        }
        if self.hang {
            futures::future::pending::<()>().await;
        }
        match self.fail.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    fn events(&self) -> Receiver<TransferEvent> {
        self.events.clone()
    }

    async fn release(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}
