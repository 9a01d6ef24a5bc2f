//! # tx-listeners Testing
//!
//! Testing utilities for transaction-lifecycle listeners.
//!
//! This crate provides:
//! - [`InMemoryTransactionManager`]: a simulated manager that drives
//!   registered synchronizations through commit or rollback
//! - [`RecordingListener`]: listeners that record the context they ran with
//! - proptest strategies for states and completion statuses
//! - [`init_test_tracing`] for log output in tests
//!
//! ## Example
//!
//! ```ignore
//! use tx_listeners_testing::{InMemoryTransactionManager, RecordingListener};
//!
//! #[tokio::test]
//! async fn test_listener_runs_on_commit() {
//!     let manager = Arc::new(InMemoryTransactionManager::new());
//!     let context = ManagedTransactionContext::new(manager.clone(), || 1_u32);
//!     let recorder = RecordingListener::new();
//!
//!     manager.begin().unwrap();
//!     context.add_listener(TransactionState::Committed, recorder.listener()).await.unwrap();
//!     manager.commit().unwrap();
//!
//!     assert_eq!(recorder.calls(), vec![1]);
//! }
//! ```

/// Recording listeners
pub mod listener_mocks;

/// In-memory transaction manager
pub mod manager_mocks;

/// Property-based testing utilities using proptest.
pub mod properties {
    use proptest::prelude::*;
    use tx_listeners_core::{CompletionStatus, TransactionState};

    /// Any of the four listener states.
    pub fn any_state() -> impl Strategy<Value = TransactionState> {
        proptest::sample::select(TransactionState::ALL.to_vec())
    }

    /// A completion status: mostly the well-known codes, sometimes a
    /// manager-specific one.
    pub fn any_status() -> impl Strategy<Value = CompletionStatus> {
        prop_oneof![
            4 => (0..=9_i32).prop_map(CompletionStatus::from_code),
            1 => any::<i32>().prop_map(CompletionStatus::from_code),
        ]
    }
}

/// Install a `tracing` subscriber writing to the test output.
///
/// Honors `RUST_LOG`, defaulting to `debug`. Safe to call from every test;
/// only the first call installs the subscriber.
pub fn init_test_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

// Re-export commonly used items
pub use listener_mocks::RecordingListener;
pub use manager_mocks::{
    CompletionReport, InMemoryTransaction, InMemoryTransactionManager, ManagerOperation,
};
