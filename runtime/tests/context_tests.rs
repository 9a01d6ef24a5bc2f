//! Integration tests for ManagedTransactionContext against the in-memory manager
//!
//! Covers the façade operations and the attribution of manager failures to
//! the interaction that raised them.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use std::error::Error as _;
use std::sync::Arc;
use tx_listeners_core::{
    CompletionStatus, Interaction, ManagerError, TransactionContext, TransactionState,
};
use tx_listeners_runtime::{ContextConfig, ManagedTransactionContext};
use tx_listeners_testing::{
    InMemoryTransactionManager, ManagerOperation, RecordingListener, init_test_tracing,
};

fn setup() -> (Arc<InMemoryTransactionManager>, ManagedTransactionContext<String>) {
    init_test_tracing();
    let manager = Arc::new(InMemoryTransactionManager::new());
    let context = ManagedTransactionContext::new(Arc::clone(&manager), || "cmd-1".to_string())
        .with_config(ContextConfig::default().with_manager_name("in-memory"));
    (manager, context)
}

#[tokio::test]
async fn test_commit_is_a_no_op() {
    let (manager, context) = setup();
    let transaction = manager.begin().unwrap();

    context.commit().await.unwrap();

    assert_eq!(transaction.current_status(), CompletionStatus::ACTIVE);
    assert!(manager.current().is_some());
}

#[tokio::test]
async fn test_commit_ignores_manager_failures() {
    let (manager, context) = setup();
    manager.fail(ManagerOperation::GetTransaction, "down");
    manager.fail(ManagerOperation::GetStatus, "down");

    assert!(context.commit().await.is_ok());
}

#[tokio::test]
async fn test_rollback_marks_active_transaction() {
    let (manager, context) = setup();
    let transaction = manager.begin().unwrap();

    context.rollback().await.unwrap();

    assert_eq!(transaction.current_status(), CompletionStatus::MARKED_ROLLBACK);
    assert_eq!(manager.rollback_only_calls(), 1);
}

#[tokio::test]
async fn test_rollback_skips_finished_transactions() {
    for status in [CompletionStatus::NO_TRANSACTION, CompletionStatus::ROLLED_BACK] {
        let (manager, context) = setup();
        let transaction = manager.begin().unwrap();
        transaction.force_status(status);
        // A mutating call would fail loudly.
        manager.fail(ManagerOperation::SetRollbackOnly, "must not be called");

        context.rollback().await.unwrap();

        assert_eq!(manager.rollback_only_calls(), 0);
        assert_eq!(transaction.current_status(), status);
    }
}

#[tokio::test]
async fn test_rollback_without_transaction_is_a_no_op() {
    let (manager, context) = setup();

    context.rollback().await.unwrap();

    assert_eq!(manager.rollback_only_calls(), 0);
}

#[tokio::test]
async fn test_rollback_marks_already_marked_transaction_again() {
    let (manager, context) = setup();
    manager.begin().unwrap();

    context.rollback().await.unwrap();
    context.rollback().await.unwrap();

    assert_eq!(manager.rollback_only_calls(), 2);
}

#[tokio::test]
async fn test_rollback_failures_are_attributed_to_setting_rollback_only() {
    for operation in [
        ManagerOperation::GetTransaction,
        ManagerOperation::TransactionStatus,
        ManagerOperation::SetRollbackOnly,
    ] {
        let (manager, context) = setup();
        manager.begin().unwrap();
        manager.fail(operation, "manager unavailable");

        let err = context.rollback().await.unwrap_err();

        assert_eq!(err.operation(), Interaction::SettingRollbackOnly, "{operation:?}");
        assert_eq!(err.to_string(), "Exception while setting transaction rollback only");
        assert!(matches!(err.cause(), ManagerError::System(m) if m == "manager unavailable"));
    }
}

#[tokio::test]
async fn test_add_listener_registers_each_call() {
    let (manager, context) = setup();
    let transaction = manager.begin().unwrap();
    let recorder = RecordingListener::new();

    context
        .add_listener(TransactionState::Committed, recorder.listener())
        .await
        .unwrap();
    context
        .add_listener(TransactionState::Committed, recorder.listener())
        .await
        .unwrap();

    assert_eq!(transaction.pending_synchronizations(), 2);
    assert!(recorder.is_empty());

    manager.commit().unwrap();
    assert_eq!(recorder.calls(), vec!["cmd-1".to_string(), "cmd-1".to_string()]);
}

#[tokio::test]
async fn test_add_listener_lookup_failure() {
    let (manager, context) = setup();
    manager.begin().unwrap();
    manager.fail(ManagerOperation::GetTransaction, "lookup failed");

    let err = context
        .add_listener(TransactionState::Committed, RecordingListener::new().listener())
        .await
        .unwrap_err();

    assert_eq!(err.operation(), Interaction::GettingTransaction);
    assert_eq!(err.to_string(), "Exception while getting transaction");
    assert_eq!(
        err.source().map(ToString::to_string).as_deref(),
        Some("System error: lookup failed")
    );
}

#[tokio::test]
async fn test_add_listener_registration_failure() {
    let (manager, context) = setup();
    let transaction = manager.begin().unwrap();
    manager.fail(ManagerOperation::RegisterSynchronization, "registry full");

    let err = context
        .add_listener(TransactionState::RolledBack, RecordingListener::new().listener())
        .await
        .unwrap_err();

    assert_eq!(err.operation(), Interaction::RegisteringSynchronization);
    assert_eq!(err.to_string(), "Exception while registering synchronization");
    assert!(matches!(err.cause(), ManagerError::System(_)));
    assert_eq!(transaction.pending_synchronizations(), 0);
}

#[tokio::test]
async fn test_add_listener_refused_for_rollback_only_transaction() {
    let (manager, context) = setup();
    manager.begin().unwrap();
    context.rollback().await.unwrap();

    let err = context
        .add_listener(TransactionState::Committing, RecordingListener::new().listener())
        .await
        .unwrap_err();

    assert_eq!(err.operation(), Interaction::RegisteringSynchronization);
    assert!(matches!(err.cause(), ManagerError::RolledBack(_)));
}

#[tokio::test]
async fn test_add_listener_without_transaction() {
    let (_manager, context) = setup();

    let err = context
        .add_listener(TransactionState::Committed, RecordingListener::new().listener())
        .await
        .unwrap_err();

    assert_eq!(err.operation(), Interaction::RegisteringSynchronization);
    assert!(matches!(err.cause(), ManagerError::IllegalState(_)));
}

#[tokio::test]
async fn test_add_listener_with_explicit_context() {
    let (manager, context) = setup();
    manager.begin().unwrap();
    let recorder = RecordingListener::new();

    context
        .add_listener_with_context(
            TransactionState::Committed,
            recorder.listener(),
            "explicit".to_string(),
        )
        .await
        .unwrap();
    manager.commit().unwrap();

    assert_eq!(recorder.calls(), vec!["explicit".to_string()]);
}

#[tokio::test]
async fn test_is_transaction_active() {
    let (manager, context) = setup();

    assert!(!context.is_transaction_active().await.unwrap());

    let transaction = manager.begin().unwrap();
    for (status, active) in [
        (CompletionStatus::ACTIVE, true),
        (CompletionStatus::PREPARED, true),
        (CompletionStatus::PREPARING, true),
        (CompletionStatus::COMMITTING, true),
        (CompletionStatus::UNKNOWN, true),
        (CompletionStatus::from_code(99), true),
        (CompletionStatus::MARKED_ROLLBACK, false),
        (CompletionStatus::NO_TRANSACTION, false),
    ] {
        transaction.force_status(status);
        assert_eq!(context.is_transaction_active().await.unwrap(), active, "{status}");
    }
}

#[tokio::test]
async fn test_is_transaction_active_failure() {
    let (manager, context) = setup();
    manager.begin().unwrap();
    manager.fail(ManagerOperation::GetStatus, "status unavailable");

    let err = context.is_transaction_active().await.unwrap_err();

    assert_eq!(err.operation(), Interaction::GettingTransactionState);
    assert_eq!(err.to_string(), "Exception while getting transaction state");
    assert!(matches!(err.into_cause(), ManagerError::System(m) if m == "status unavailable"));
}

// Generic code only sees the shared trait.
async fn mark_failed<T: TransactionContext>(context: &T) -> tx_listeners_core::error::Result<bool> {
    context.rollback().await?;
    context.is_transaction_active().await
}

#[tokio::test]
async fn test_usable_through_transaction_context_trait() {
    let (manager, context) = setup();
    manager.begin().unwrap();

    assert!(!mark_failed(&context).await.unwrap());
    assert!(!manager.commit().unwrap().committed());
}

#[tokio::test]
async fn test_metrics_can_be_disabled() {
    let manager = Arc::new(InMemoryTransactionManager::new());
    let context: ManagedTransactionContext<u8> =
        ManagedTransactionContext::new(Arc::clone(&manager), || 0_u8)
            .with_config(ContextConfig::default().with_metrics(false));
    let recorder = RecordingListener::new();
    manager.begin().unwrap();

    assert!(!context.config().metrics_enabled);
    context
        .add_listener(TransactionState::Committing, recorder.listener())
        .await
        .unwrap();
    manager.commit().unwrap();

    assert_eq!(recorder.calls(), vec![0]);
}
