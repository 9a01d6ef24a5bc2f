//! # tx-listeners Core
//!
//! Core traits and types for transaction-lifecycle listeners.
//!
//! Application code registers listeners for a phase of a transaction that is
//! owned by an external transaction manager. This crate defines the vocabulary
//! shared by the manager-facing and application-facing sides:
//!
//! - **`TransactionState`**: the four phases a listener can be bound to
//! - **`CompletionStatus`**: the manager's raw status codes
//! - **`TransactionListener`**: a single-shot callback with captured context
//! - **`Synchronization`**: the two completion callbacks the manager drives
//! - **`TransactionManager`** / **`Transaction`**: the external manager
//! - **`TransactionContext`**: the façade used by application code
//!
//! The dispatcher itself (`StateSynchronization`, `ManagedTransactionContext`)
//! lives in `tx-listeners-runtime`.
//!
//! ## Example
//!
//! ```ignore
//! use tx_listeners_core::{TransactionContext, TransactionState};
//! use tx_listeners_core::listener::listener_fn;
//!
//! async fn on_commit<T: TransactionContext<Context = CommandContext>>(tx: &T) -> Result<()> {
//!     tx.add_listener(
//!         TransactionState::Committed,
//!         listener_fn(|ctx: &CommandContext| {
//!             ctx.publish_pending_events();
//!             Ok(())
//!         }),
//!     )
//!     .await
//! }
//! ```

pub mod context;
pub mod error;
pub mod listener;
pub mod manager;
pub mod state;
pub mod status;

// Re-export commonly used types
pub use context::TransactionContext;
pub use error::{Interaction, ListenerError, ManagerError, TransactionInteractionError};
pub use listener::{ExecutionContextProvider, TransactionListener, listener_fn};
pub use manager::{Synchronization, Transaction, TransactionManager};
pub use state::TransactionState;
pub use status::CompletionStatus;
