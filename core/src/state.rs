//! Lifecycle states a listener can be registered for.
//!
//! A transaction passes through two observable phases. The *pre-completion*
//! phase happens while the manager is about to finish the transaction and the
//! outcome is not yet final; the *post-completion* phase happens once the
//! outcome is known.
//!
//! ```text
//!   before_completion          after_completion(status)
//!  ┌────────────────────┐     ┌──────────────────────┐
//!  │ Committing         │ ──▶ │ Committed            │
//!  │ RollingBack        │     │ RolledBack           │
//!  └────────────────────┘     └──────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// The lifecycle state a transaction listener is bound to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransactionState {
    /// The transaction is about to commit.
    Committing,
    /// The transaction is about to roll back.
    RollingBack,
    /// The transaction has committed.
    Committed,
    /// The transaction has rolled back.
    RolledBack,
}

impl TransactionState {
    /// Every state, in lifecycle order.
    pub const ALL: [Self; 4] = [
        Self::Committing,
        Self::RollingBack,
        Self::Committed,
        Self::RolledBack,
    ];

    /// Whether listeners for this state run before the outcome is final.
    #[must_use]
    pub const fn is_pre_completion(self) -> bool {
        matches!(self, Self::Committing | Self::RollingBack)
    }

    /// Whether listeners for this state run once the outcome is known.
    #[must_use]
    pub const fn is_post_completion(self) -> bool {
        !self.is_pre_completion()
    }

    /// Stable label used in log fields and metric labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Committing => "committing",
            Self::RollingBack => "rolling-back",
            Self::Committed => "committed",
            Self::RolledBack => "rolled-back",
        }
    }
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
