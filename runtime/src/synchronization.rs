//! Two-phase dispatch from manager callbacks to listener states.
//!
//! The manager only knows two moments: *before completion* and *after
//! completion* (with a raw status). A [`StateSynchronization`] re-dispatches
//! those into the four [`TransactionState`]s:
//!
//! | requested state | fires from                 | condition                  |
//! |-----------------|----------------------------|----------------------------|
//! | `Committing`    | `before_completion`        | always                     |
//! | `RollingBack`   | `before_completion`        | always                     |
//! | `Committed`     | `after_completion(status)` | status is `COMMITTED`      |
//! | `RolledBack`    | `after_completion(status)` | status is `ROLLED_BACK`    |
//!
//! Pre-completion listeners are not told apart: at `before_completion` the
//! outcome is not final yet, so both fire. Managers that call
//! `before_completion` on the rollback path too will therefore run
//! `Committing` listeners for a transaction that is about to roll back.

use crate::metrics::{ListenerMetrics, Phase};
use tx_listeners_core::{
    CompletionStatus, ListenerError, Synchronization, TransactionListener, TransactionState,
};

/// A listener bound to a requested state and the context captured when it was
/// registered.
///
/// The listener is consumed the first time it runs, so it runs at most once
/// even if a manager invokes a callback more than once.
pub struct StateSynchronization<C> {
    state: TransactionState,
    listener: Option<Box<dyn TransactionListener<C>>>,
    context: C,
    record_metrics: bool,
}

impl<C> StateSynchronization<C> {
    /// Bind `listener` to `state`, capturing `context`.
    #[must_use]
    pub fn new(
        state: TransactionState,
        listener: Box<dyn TransactionListener<C>>,
        context: C,
    ) -> Self {
        Self {
            state,
            listener: Some(listener),
            context,
            record_metrics: true,
        }
    }

    /// Enable or disable metric recording for this registration.
    #[must_use]
    pub const fn with_metrics(mut self, enabled: bool) -> Self {
        self.record_metrics = enabled;
        self
    }

    /// The state the listener was registered for.
    #[must_use]
    pub const fn requested_state(&self) -> TransactionState {
        self.state
    }

    /// Whether the listener has already run.
    #[must_use]
    pub const fn has_fired(&self) -> bool {
        self.listener.is_none()
    }

    /// The context handed to the listener.
    #[must_use]
    pub const fn context(&self) -> &C {
        &self.context
    }

    fn fire(&mut self, phase: Phase) -> Result<(), ListenerError> {
        let Some(listener) = self.listener.take() else {
            tracing::trace!(state = %self.state, "Listener already executed, skipping");
            return Ok(());
        };

        tracing::debug!(state = %self.state, phase = ?phase, "Executing transaction listener");
        if self.record_metrics {
            ListenerMetrics::record_executed(self.state, phase);
        }

        listener.execute(&self.context).inspect_err(|error| {
            tracing::debug!(state = %self.state, %error, "Transaction listener failed");
            if self.record_metrics {
                ListenerMetrics::record_failed(self.state);
            }
        })
    }
}

impl<C: Send> Synchronization for StateSynchronization<C> {
    fn before_completion(&mut self) -> Result<(), ListenerError> {
        if self.state.is_pre_completion() {
            self.fire(Phase::Before)
        } else {
            Ok(())
        }
    }

    fn after_completion(&mut self, status: CompletionStatus) -> Result<(), ListenerError> {
        match status.outcome() {
            Some(outcome) if outcome == self.state => self.fire(Phase::After),
            Some(_) => Ok(()),
            None => {
                tracing::trace!(%status, state = %self.state, "Completion status has no outcome, ignoring");
                Ok(())
            }
        }
    }
}

impl<C> std::fmt::Debug for StateSynchronization<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateSynchronization")
            .field("state", &self.state)
            .field("fired", &self.has_fired())
            .finish_non_exhaustive()
    }
}
