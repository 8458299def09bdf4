//! Shared finalization machinery for remote operations
//!
//! Every operation completes through a [`Completion`]: a one-shot latch
//! that delivers the terminal outcome to the optional completion callback
//! and hands the same outcome back to the awaiting future. Underlying
//! transports may deliver duplicate terminal events; the latch guarantees
//! the callback observes exactly one outcome.

use crate::error::Result;

/// Where an operation is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionState {
    /// The operation has not reached a terminal outcome yet
    Pending,
    /// The operation finished successfully
    Succeeded,
    /// The operation finished with an error
    Failed,
}

/// Completion callback, invoked once with the terminal outcome
pub(crate) type Callback<T> = Box<dyn FnOnce(&Result<T>) + Send>;

/// One-shot finalization latch shared by exec and upload operations
pub(crate) struct Completion<T> {
    callback: Option<Callback<T>>,
    state: CompletionState,
}

impl<T> Completion<T> {
    pub(crate) fn new() -> Self {
        Self {
            callback: None,
            state: CompletionState::Pending,
        }
    }

    pub(crate) fn set_callback<F>(&mut self, callback: F)
    where
        F: FnOnce(&Result<T>) + Send + 'static,
    {
        self.callback = Some(Box::new(callback));
    }

    pub(crate) fn state(&self) -> CompletionState {
        self.state
    }

    /// Finalize with `outcome`, passing it back for the future side.
    ///
    /// Only the first call transitions the state and invokes the callback;
    /// later calls pass the outcome through untouched.
    pub(crate) fn finish(&mut self, outcome: Result<T>) -> Result<T> {
        if self.state == CompletionState::Pending {
            self.state = if outcome.is_ok() {
                CompletionState::Succeeded
            } else {
                CompletionState::Failed
            };
            if let Some(callback) = self.callback.take() {
                callback(&outcome);
            }
        }
        outcome
    }
}
