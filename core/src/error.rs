//! Error types for interactions with the transaction manager and for
//! listener execution.

use std::fmt;
use thiserror::Error;

/// Boxed error used for opaque causes.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Result type for operations that talk to the transaction manager.
pub type Result<T> = std::result::Result<T, TransactionInteractionError>;

/// The manager interaction that was being attempted when a failure occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Interaction {
    /// Looking up the current transaction handle.
    GettingTransaction,
    /// Marking the current transaction rollback-only.
    SettingRollbackOnly,
    /// Registering a synchronization callback with the transaction.
    RegisteringSynchronization,
    /// Querying the manager's transaction status.
    GettingTransactionState,
}

impl Interaction {
    /// Human-readable label, also used as the `operation` metric label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::GettingTransaction => "getting transaction",
            Self::SettingRollbackOnly => "setting transaction rollback only",
            Self::RegisteringSynchronization => "registering synchronization",
            Self::GettingTransactionState => "getting transaction state",
        }
    }
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Failure raised by the transaction manager or one of its handles.
#[derive(Error, Debug)]
pub enum ManagerError {
    /// The manager hit an unexpected internal error.
    #[error("System error: {0}")]
    System(String),

    /// The call is not valid in the transaction's current state, e.g. no
    /// transaction is associated with the caller.
    #[error("Illegal state: {0}")]
    IllegalState(String),

    /// The transaction has been marked for rollback and refuses the call.
    #[error("Transaction rolled back: {0}")]
    RolledBack(String),

    /// Any other manager-specific failure.
    #[error(transparent)]
    Other(BoxError),
}

/// A manager failure, attributed to the interaction that raised it.
///
/// This is the only error the transaction context returns. The original
/// manager failure is kept as the [`source`](std::error::Error::source).
#[derive(Error, Debug)]
#[error("Exception while {operation}")]
pub struct TransactionInteractionError {
    operation: Interaction,
    #[source]
    source: ManagerError,
}

impl TransactionInteractionError {
    /// Attribute a manager failure to an interaction.
    #[must_use]
    pub const fn new(operation: Interaction, source: ManagerError) -> Self {
        Self { operation, source }
    }

    /// The interaction that failed.
    #[must_use]
    pub const fn operation(&self) -> Interaction {
        self.operation
    }

    /// The manager failure that caused this error.
    #[must_use]
    pub const fn cause(&self) -> &ManagerError {
        &self.source
    }

    /// Consume the error, returning the manager failure.
    #[must_use]
    pub fn into_cause(self) -> ManagerError {
        self.source
    }
}

/// Failure raised by a transaction listener.
///
/// Listener failures are never caught by the dispatcher; they are handed back
/// to whichever component invoked the synchronization callback.
#[derive(Error, Debug)]
#[error("Transaction listener failed: {0}")]
pub struct ListenerError(#[source] BoxError);

impl ListenerError {
    /// Wrap any error raised by a listener.
    pub fn new(error: impl Into<BoxError>) -> Self {
        Self(error.into())
    }

    /// Build a listener error from a message.
    pub fn msg(message: impl fmt::Display) -> Self {
        Self(message.to_string().into())
    }
}
