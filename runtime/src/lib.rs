//! # tx-listeners Runtime
//!
//! Dispatcher for transaction-lifecycle listeners over an externally managed
//! transaction.
//!
//! ## Core Components
//!
//! - **`ManagedTransactionContext`**: façade used by application code to
//!   register listeners, mark the transaction rollback-only and query whether
//!   it is still active
//! - **`StateSynchronization`**: adapter the manager drives at *before
//!   completion* and *after completion*, re-dispatched into the four
//!   `TransactionState`s
//!
//! ## Flow
//!
//! ```text
//! add_listener(state, listener)
//!     │  manager.transaction()         ── "getting transaction"
//!     │  provider.current()            ── captured context
//!     ▼
//! StateSynchronization { state, listener, context }
//!     │  transaction.register_synchronization()
//!     │                                ── "registering synchronization"
//!     ▼
//! manager (any thread, later)
//!     ├─ before_completion()           → Committing / RollingBack
//!     └─ after_completion(status)      → Committed / RolledBack
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use tx_listeners_runtime::ManagedTransactionContext;
//!
//! let context = ManagedTransactionContext::new(manager, || current_command());
//!
//! context
//!     .add_listener(TransactionState::RolledBack, listener_fn(|cmd: &Command| {
//!         cmd.release_locks();
//!         Ok(())
//!     }))
//!     .await?;
//! ```

/// Configuration for the managed transaction context
pub mod config;

/// Managed transaction context
pub mod context;

/// Prometheus metrics for observability
pub mod metrics;

/// Two-phase state synchronization
pub mod synchronization;

pub use config::{ConfigError, ContextConfig};
pub use context::ManagedTransactionContext;
pub use synchronization::StateSynchronization;
