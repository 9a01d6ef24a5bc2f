//! In-memory transaction manager for fast, deterministic testing.
//!
//! [`InMemoryTransactionManager`] simulates a JTA-style manager closely
//! enough to drive registered synchronizations through a full lifecycle:
//!
//! - `commit()` calls `before_completion` on every synchronization, then
//!   `after_completion(COMMITTED)`. A failing `before_completion` or a
//!   rollback-only mark turns the commit into a rollback.
//! - `rollback()` only calls `after_completion(ROLLED_BACK)`, unless the
//!   manager was built with [`calls_before_completion_on_rollback`].
//!
//! Every manager and handle operation can be made to fail with
//! [`InMemoryTransactionManager::fail`].
//!
//! [`calls_before_completion_on_rollback`]: InMemoryTransactionManager::calls_before_completion_on_rollback

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Panics only on poisoned locks

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tx_listeners_core::manager::ManagerFuture;
use tx_listeners_core::{
    CompletionStatus, ListenerError, ManagerError, Synchronization, Transaction,
    TransactionManager,
};

/// Manager or handle operation that can be made to fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ManagerOperation {
    /// `TransactionManager::transaction`
    GetTransaction,
    /// `TransactionManager::status`
    GetStatus,
    /// `Transaction::status`
    TransactionStatus,
    /// `Transaction::set_rollback_only`
    SetRollbackOnly,
    /// `Transaction::register_synchronization`
    RegisterSynchronization,
}

#[derive(Debug, Default)]
struct Shared {
    failures: Mutex<HashMap<ManagerOperation, String>>,
    rollback_only_calls: AtomicUsize,
    registrations: AtomicUsize,
}

impl Shared {
    fn check(&self, operation: ManagerOperation) -> Result<(), ManagerError> {
        match self.failures.lock().unwrap().get(&operation) {
            Some(message) => Err(ManagerError::System(message.clone())),
            None => Ok(()),
        }
    }
}

/// Outcome of driving a transaction to completion.
#[derive(Debug)]
pub struct CompletionReport {
    /// Final status handed to `after_completion`.
    pub status: CompletionStatus,
    /// Error returned by `before_completion`, which forced a rollback.
    pub before_completion_error: Option<ListenerError>,
    /// Errors returned by `after_completion`. The outcome is already final,
    /// so these are only reported.
    pub after_completion_errors: Vec<ListenerError>,
}

impl CompletionReport {
    /// Whether the transaction committed.
    #[must_use]
    pub fn committed(&self) -> bool {
        self.status == CompletionStatus::COMMITTED
    }
}

/// A transaction handle created by [`InMemoryTransactionManager::begin`].
pub struct InMemoryTransaction {
    status: Mutex<CompletionStatus>,
    synchronizations: Mutex<Vec<Box<dyn Synchronization>>>,
    shared: Arc<Shared>,
}

impl InMemoryTransaction {
    fn new(shared: Arc<Shared>) -> Self {
        Self {
            status: Mutex::new(CompletionStatus::ACTIVE),
            synchronizations: Mutex::new(Vec::new()),
            shared,
        }
    }

    /// Current status, bypassing failure injection.
    #[must_use]
    pub fn current_status(&self) -> CompletionStatus {
        *self.status.lock().unwrap()
    }

    /// Overwrite the status, e.g. to simulate a manager-specific code.
    pub fn force_status(&self, status: CompletionStatus) {
        *self.status.lock().unwrap() = status;
    }

    /// Number of synchronizations waiting for completion.
    #[must_use]
    pub fn pending_synchronizations(&self) -> usize {
        self.synchronizations.lock().unwrap().len()
    }

    fn take_synchronizations(&self) -> Vec<Box<dyn Synchronization>> {
        std::mem::take(&mut *self.synchronizations.lock().unwrap())
    }

    fn is_finished(&self) -> bool {
        self.current_status().outcome().is_some()
    }
}

impl std::fmt::Debug for InMemoryTransaction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryTransaction")
            .field("status", &self.current_status())
            .field("pending_synchronizations", &self.pending_synchronizations())
            .finish()
    }
}

impl Transaction for InMemoryTransaction {
    fn status(&self) -> ManagerFuture<'_, CompletionStatus> {
        Box::pin(async move {
            self.shared.check(ManagerOperation::TransactionStatus)?;
            Ok(self.current_status())
        })
    }

    fn set_rollback_only(&self) -> ManagerFuture<'_, ()> {
        Box::pin(async move {
            self.shared.check(ManagerOperation::SetRollbackOnly)?;
            if self.is_finished() {
                return Err(ManagerError::IllegalState(
                    "transaction already completed".to_string(),
                ));
            }
            self.force_status(CompletionStatus::MARKED_ROLLBACK);
            self.shared.rollback_only_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }

    fn register_synchronization(
        &self,
        synchronization: Box<dyn Synchronization>,
    ) -> ManagerFuture<'_, ()> {
        Box::pin(async move {
            self.shared.check(ManagerOperation::RegisterSynchronization)?;
            let status = self.current_status();
            if status == CompletionStatus::MARKED_ROLLBACK {
                return Err(ManagerError::RolledBack(
                    "transaction is marked rollback-only".to_string(),
                ));
            }
            if self.is_finished() {
                return Err(ManagerError::IllegalState(format!(
                    "transaction is {status}"
                )));
            }
            self.synchronizations.lock().unwrap().push(synchronization);
            self.shared.registrations.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

/// In-memory transaction manager.
///
/// Holds at most one current transaction. Cloning shares the same state, so
/// clones can drive completion from other threads.
///
/// # Example
///
/// ```
/// use tx_listeners_core::CompletionStatus;
/// use tx_listeners_testing::InMemoryTransactionManager;
///
/// let manager = InMemoryTransactionManager::new();
/// manager.begin().unwrap();
///
/// let report = manager.commit().unwrap();
/// assert_eq!(report.status, CompletionStatus::COMMITTED);
/// assert!(manager.current().is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct InMemoryTransactionManager {
    current: Arc<Mutex<Option<Arc<InMemoryTransaction>>>>,
    shared: Arc<Shared>,
    before_completion_on_rollback: bool,
}

impl InMemoryTransactionManager {
    /// Create a manager with no current transaction.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Also call `before_completion` when rolling back, as some managers do.
    #[must_use]
    pub const fn calls_before_completion_on_rollback(mut self) -> Self {
        self.before_completion_on_rollback = true;
        self
    }

    /// Start a new transaction and make it current.
    ///
    /// # Errors
    ///
    /// `ManagerError::IllegalState` if a transaction is already current.
    pub fn begin(&self) -> Result<Arc<InMemoryTransaction>, ManagerError> {
        let mut current = self.current.lock().unwrap();
        if current.is_some() {
            return Err(ManagerError::IllegalState(
                "a transaction is already associated".to_string(),
            ));
        }
        let transaction = Arc::new(InMemoryTransaction::new(Arc::clone(&self.shared)));
        *current = Some(Arc::clone(&transaction));
        tracing::debug!("Began in-memory transaction");
        Ok(transaction)
    }

    /// The current transaction, if any.
    #[must_use]
    pub fn current(&self) -> Option<Arc<InMemoryTransaction>> {
        self.current.lock().unwrap().clone()
    }

    /// Commit the current transaction, rolling back instead if it is marked
    /// rollback-only or a `before_completion` callback fails.
    ///
    /// # Errors
    ///
    /// `ManagerError::IllegalState` if there is no current transaction.
    pub fn commit(&self) -> Result<CompletionReport, ManagerError> {
        let transaction = self.detach()?;

        if transaction.current_status() == CompletionStatus::MARKED_ROLLBACK {
            tracing::debug!("Transaction marked rollback-only, rolling back instead of commit");
            return Ok(self.complete(&transaction, false));
        }

        Ok(self.complete(&transaction, true))
    }

    /// Roll back the current transaction.
    ///
    /// # Errors
    ///
    /// `ManagerError::IllegalState` if there is no current transaction.
    pub fn rollback(&self) -> Result<CompletionReport, ManagerError> {
        let transaction = self.detach()?;
        Ok(self.complete(&transaction, false))
    }

    /// Mark the current transaction rollback-only.
    ///
    /// # Errors
    ///
    /// `ManagerError::IllegalState` if there is no current transaction.
    pub fn set_rollback_only(&self) -> Result<(), ManagerError> {
        let transaction = self.current().ok_or_else(no_transaction)?;
        transaction.force_status(CompletionStatus::MARKED_ROLLBACK);
        Ok(())
    }

    /// Make `operation` fail with `ManagerError::System(message)` until
    /// [`clear_failures`](Self::clear_failures) is called.
    pub fn fail(&self, operation: ManagerOperation, message: impl Into<String>) {
        self.shared
            .failures
            .lock()
            .unwrap()
            .insert(operation, message.into());
    }

    /// Remove all injected failures.
    pub fn clear_failures(&self) {
        self.shared.failures.lock().unwrap().clear();
    }

    /// Number of successful `set_rollback_only` calls made through handles.
    #[must_use]
    pub fn rollback_only_calls(&self) -> usize {
        self.shared.rollback_only_calls.load(Ordering::SeqCst)
    }

    /// Number of synchronizations accepted across all transactions.
    #[must_use]
    pub fn registrations(&self) -> usize {
        self.shared.registrations.load(Ordering::SeqCst)
    }

    fn detach(&self) -> Result<Arc<InMemoryTransaction>, ManagerError> {
        self.current.lock().unwrap().take().ok_or_else(no_transaction)
    }

    fn complete(&self, transaction: &InMemoryTransaction, commit: bool) -> CompletionReport {
        let mut synchronizations = Vec::new();
        let mut before_completion_error = None;

        if commit || self.before_completion_on_rollback {
            // Callbacks may register further synchronizations; keep draining.
            loop {
                let batch = transaction.take_synchronizations();
                if batch.is_empty() {
                    break;
                }
                for mut synchronization in batch {
                    if before_completion_error.is_none() {
                        if let Err(error) = synchronization.before_completion() {
                            tracing::debug!(%error, "before_completion failed, rolling back");
                            before_completion_error = Some(error);
                        }
                    }
                    synchronizations.push(synchronization);
                }
            }
        } else {
            synchronizations = transaction.take_synchronizations();
        }

        let committed = commit
            && before_completion_error.is_none()
            && transaction.current_status() != CompletionStatus::MARKED_ROLLBACK;
        let status = if committed {
            CompletionStatus::COMMITTED
        } else {
            CompletionStatus::ROLLED_BACK
        };
        transaction.force_status(status);
        tracing::debug!(%status, count = synchronizations.len(), "Completing in-memory transaction");

        let after_completion_errors = synchronizations
            .iter_mut()
            .filter_map(|synchronization| synchronization.after_completion(status).err())
            .collect();

        CompletionReport {
            status,
            before_completion_error,
            after_completion_errors,
        }
    }
}

fn no_transaction() -> ManagerError {
    ManagerError::IllegalState("no transaction associated".to_string())
}

impl TransactionManager for InMemoryTransactionManager {
    fn transaction(&self) -> ManagerFuture<'_, Option<Arc<dyn Transaction>>> {
        Box::pin(async move {
            self.shared.check(ManagerOperation::GetTransaction)?;
            Ok(self
                .current()
                .map(|transaction| transaction as Arc<dyn Transaction>))
        })
    }

    fn status(&self) -> ManagerFuture<'_, CompletionStatus> {
        Box::pin(async move {
            self.shared.check(ManagerOperation::GetStatus)?;
            Ok(self
                .current()
                .map_or(CompletionStatus::NO_TRANSACTION, |t| t.current_status()))
        })
    }
}
