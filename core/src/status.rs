//! Raw completion status codes reported by the transaction manager.
//!
//! The codes are owned by the manager, not by this crate. [`CompletionStatus`]
//! is a transparent wrapper over the integer code so that manager-specific
//! values survive the round trip unchanged; the well-known codes are exposed
//! as associated constants.

use crate::state::TransactionState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A status code as reported by the transaction manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompletionStatus(i32);

impl CompletionStatus {
    /// A transaction is associated and in the active state.
    pub const ACTIVE: Self = Self(0);
    /// The transaction has been marked for rollback only.
    pub const MARKED_ROLLBACK: Self = Self(1);
    /// The transaction has been prepared.
    pub const PREPARED: Self = Self(2);
    /// The transaction has been committed.
    pub const COMMITTED: Self = Self(3);
    /// The transaction has been rolled back.
    pub const ROLLED_BACK: Self = Self(4);
    /// The status cannot be determined right now.
    pub const UNKNOWN: Self = Self(5);
    /// No transaction is associated with the caller.
    pub const NO_TRANSACTION: Self = Self(6);
    /// The transaction is in the process of preparing.
    pub const PREPARING: Self = Self(7);
    /// The transaction is in the process of committing.
    pub const COMMITTING: Self = Self(8);
    /// The transaction is in the process of rolling back.
    pub const ROLLING_BACK: Self = Self(9);

    /// Wrap a raw manager code.
    #[must_use]
    pub const fn from_code(code: i32) -> Self {
        Self(code)
    }

    /// The raw manager code.
    #[must_use]
    pub const fn code(self) -> i32 {
        self.0
    }

    /// The final outcome this status stands for, if any.
    ///
    /// Only `COMMITTED` and `ROLLED_BACK` are final outcomes. Every other code,
    /// including ones this crate does not know, maps to `None`.
    #[must_use]
    pub const fn outcome(self) -> Option<TransactionState> {
        match self.0 {
            3 => Some(TransactionState::Committed),
            4 => Some(TransactionState::RolledBack),
            _ => None,
        }
    }

    /// Name of a well-known code, `None` for manager-specific ones.
    #[must_use]
    pub const fn name(self) -> Option<&'static str> {
        let name = match self.0 {
            0 => "active",
            1 => "marked-rollback",
            2 => "prepared",
            3 => "committed",
            4 => "rolled-back",
            5 => "unknown",
            6 => "no-transaction",
            7 => "preparing",
            8 => "committing",
            9 => "rolling-back",
            _ => return None,
        };
        Some(name)
    }
}

impl From<i32> for CompletionStatus {
    fn from(code: i32) -> Self {
        Self(code)
    }
}

impl fmt::Display for CompletionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "status({})", self.0),
        }
    }
}
