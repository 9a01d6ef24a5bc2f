//! Interfaces of the external transaction manager.
//!
//! Nothing in this workspace implements a production manager. These traits
//! describe the narrow surface the transaction context relies on:
//!
//! - [`TransactionManager`]: looks up the current transaction and its status
//! - [`Transaction`]: the handle for one transaction
//! - [`Synchronization`]: the two completion callbacks the manager drives
//!
//! # Callback contract
//!
//! For a given transaction the manager calls `before_completion` (if at all)
//! strictly before `after_completion`. It may call them on any thread and at
//! any time after registration. Whether `before_completion` is invoked on the
//! rollback path is up to the manager.
//!
//! # Dyn Compatibility
//!
//! Async methods return `Pin<Box<dyn Future>>` so that managers and handles can
//! be shared as `Arc<dyn TransactionManager>` / `Arc<dyn Transaction>`.

use crate::error::{ListenerError, ManagerError};
use crate::status::CompletionStatus;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Future returned by manager and handle operations.
pub type ManagerFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ManagerError>> + Send + 'a>>;

/// Callback object registered with a transaction.
///
/// Once registered, the manager owns it exclusively.
pub trait Synchronization: Send {
    /// Called before the transaction starts its completion.
    ///
    /// # Errors
    ///
    /// Returns the error of a listener executed from this callback.
    fn before_completion(&mut self) -> Result<(), ListenerError>;

    /// Called after the transaction completed with the given status.
    ///
    /// # Errors
    ///
    /// Returns the error of a listener executed from this callback.
    fn after_completion(&mut self, status: CompletionStatus) -> Result<(), ListenerError>;
}

/// Handle for a single transaction.
pub trait Transaction: Send + Sync {
    /// Current status of this transaction.
    ///
    /// # Errors
    ///
    /// `ManagerError` if the manager cannot report the status.
    fn status(&self) -> ManagerFuture<'_, CompletionStatus>;

    /// Mark the transaction so that its only possible outcome is rollback.
    ///
    /// # Errors
    ///
    /// `ManagerError::IllegalState` if the transaction is not in a state that
    /// allows it, or any other manager failure.
    fn set_rollback_only(&self) -> ManagerFuture<'_, ()>;

    /// Register a completion callback with this transaction.
    ///
    /// # Errors
    ///
    /// - `ManagerError::RolledBack`: the transaction is marked rollback-only
    /// - `ManagerError::IllegalState`: the transaction is not active
    fn register_synchronization(
        &self,
        synchronization: Box<dyn Synchronization>,
    ) -> ManagerFuture<'_, ()>;
}

/// The external transaction manager.
pub trait TransactionManager: Send + Sync {
    /// The transaction associated with the caller, `None` if there is none.
    ///
    /// # Errors
    ///
    /// `ManagerError` if the lookup itself fails.
    fn transaction(&self) -> ManagerFuture<'_, Option<Arc<dyn Transaction>>>;

    /// Status of the transaction associated with the caller.
    ///
    /// Returns `CompletionStatus::NO_TRANSACTION` when there is none.
    ///
    /// # Errors
    ///
    /// `ManagerError` if the status cannot be determined.
    fn status(&self) -> ManagerFuture<'_, CompletionStatus>;
}
