//! The transaction context used by application code.

use crate::error::Result;
use crate::listener::TransactionListener;
use crate::state::TransactionState;
use std::future::Future;

/// Application-facing view of the surrounding transaction.
///
/// Implementations either drive the transaction themselves or, like the
/// managed context in `tx-listeners-runtime`, defer to an external manager.
/// Every failure talking to the manager surfaces as a
/// [`TransactionInteractionError`](crate::error::TransactionInteractionError).
pub trait TransactionContext: Send + Sync {
    /// Context value handed to listeners.
    type Context;

    /// Commit the transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if the commit could not be carried out.
    fn commit(&self) -> impl Future<Output = Result<()>> + Send;

    /// Roll the transaction back, or make rollback its only possible outcome.
    ///
    /// # Errors
    ///
    /// Returns an error if the manager could not be told.
    fn rollback(&self) -> impl Future<Output = Result<()>> + Send;

    /// Register `listener` to run when the transaction reaches `state`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener could not be registered.
    fn add_listener(
        &self,
        state: TransactionState,
        listener: Box<dyn TransactionListener<Self::Context>>,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Whether the transaction can still do useful work.
    ///
    /// # Errors
    ///
    /// Returns an error if the status could not be queried.
    fn is_transaction_active(&self) -> impl Future<Output = Result<bool>> + Send;
}
