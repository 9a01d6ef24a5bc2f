//! Listeners that record their invocations.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on poisoned locks

use std::sync::{Arc, Mutex};
use tx_listeners_core::{ListenerError, TransactionListener};

/// Hands out listeners that record the context they were executed with.
///
/// All listeners created from one recorder (and its clones) share the same
/// log, so a test can register several and assert on the combined result.
///
/// # Example
///
/// ```
/// use tx_listeners_core::TransactionListener;
/// use tx_listeners_testing::RecordingListener;
///
/// let recorder = RecordingListener::<u32>::new();
/// recorder.listener().execute(&7).unwrap();
///
/// assert_eq!(recorder.calls(), vec![7]);
/// ```
#[derive(Debug)]
pub struct RecordingListener<C> {
    calls: Arc<Mutex<Vec<C>>>,
}

impl<C> Clone for RecordingListener<C> {
    fn clone(&self) -> Self {
        Self {
            calls: Arc::clone(&self.calls),
        }
    }
}

impl<C> Default for RecordingListener<C> {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<C: Clone + Send + 'static> RecordingListener<C> {
    /// Create a recorder with an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A listener that records its context and succeeds.
    #[must_use]
    pub fn listener(&self) -> Box<dyn TransactionListener<C>> {
        let calls = Arc::clone(&self.calls);
        Box::new(move |context: &C| {
            calls.lock().unwrap().push(context.clone());
            Ok(())
        })
    }

    /// A listener that records its context and then fails with `message`.
    #[must_use]
    pub fn failing_listener(&self, message: &str) -> Box<dyn TransactionListener<C>> {
        let calls = Arc::clone(&self.calls);
        let message = message.to_string();
        Box::new(move |context: &C| {
            calls.lock().unwrap().push(context.clone());
            Err(ListenerError::msg(message))
        })
    }

    /// Contexts of all executions so far, in execution order.
    #[must_use]
    pub fn calls(&self) -> Vec<C> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of executions so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Whether no listener has run yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.calls.lock().unwrap().is_empty()
    }
}
