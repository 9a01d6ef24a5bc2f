//! Tests for the in-memory transaction manager

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect

use std::sync::{Arc, Mutex};
use tx_listeners_core::{
    CompletionStatus, ListenerError, ManagerError, Synchronization, Transaction,
    TransactionManager,
};
use tx_listeners_testing::{InMemoryTransactionManager, ManagerOperation};

type Log = Arc<Mutex<Vec<String>>>;

// Synchronization that logs both callbacks
struct LoggingSync {
    name: &'static str,
    log: Log,
    fail_before: bool,
}

impl Synchronization for LoggingSync {
    fn before_completion(&mut self) -> Result<(), ListenerError> {
        self.log.lock().unwrap().push(format!("{}:before", self.name));
        if self.fail_before {
            return Err(ListenerError::msg("veto"));
        }
        Ok(())
    }

    fn after_completion(&mut self, status: CompletionStatus) -> Result<(), ListenerError> {
        self.log
            .lock()
            .unwrap()
            .push(format!("{}:after:{status}", self.name));
        Ok(())
    }
}

fn logging_sync(name: &'static str, log: &Log) -> Box<dyn Synchronization> {
    Box::new(LoggingSync {
        name,
        log: Arc::clone(log),
        fail_before: false,
    })
}

#[tokio::test]
async fn test_commit_calls_before_then_after() {
    let manager = InMemoryTransactionManager::new();
    let transaction = manager.begin().unwrap();
    let log = Log::default();

    transaction.register_synchronization(logging_sync("a", &log)).await.unwrap();
    transaction.register_synchronization(logging_sync("b", &log)).await.unwrap();

    let report = manager.commit().unwrap();

    assert!(report.committed());
    assert_eq!(
        *log.lock().unwrap(),
        vec!["a:before", "b:before", "a:after:committed", "b:after:committed"]
    );
    assert_eq!(manager.registrations(), 2);
}

#[tokio::test]
async fn test_rollback_skips_before_completion() {
    let manager = InMemoryTransactionManager::new();
    let transaction = manager.begin().unwrap();
    let log = Log::default();
    transaction.register_synchronization(logging_sync("a", &log)).await.unwrap();

    let report = manager.rollback().unwrap();

    assert_eq!(report.status, CompletionStatus::ROLLED_BACK);
    assert_eq!(*log.lock().unwrap(), vec!["a:after:rolled-back"]);
}

#[tokio::test]
async fn test_rollback_with_before_completion() {
    let manager = InMemoryTransactionManager::new().calls_before_completion_on_rollback();
    let transaction = manager.begin().unwrap();
    let log = Log::default();
    transaction.register_synchronization(logging_sync("a", &log)).await.unwrap();

    manager.rollback().unwrap();

    assert_eq!(*log.lock().unwrap(), vec!["a:before", "a:after:rolled-back"]);
}

#[tokio::test]
async fn test_failing_before_completion_rolls_back() {
    let manager = InMemoryTransactionManager::new();
    let transaction = manager.begin().unwrap();
    let log = Log::default();

    transaction
        .register_synchronization(Box::new(LoggingSync {
            name: "veto",
            log: Arc::clone(&log),
            fail_before: true,
        }))
        .await
        .unwrap();
    transaction.register_synchronization(logging_sync("b", &log)).await.unwrap();

    let report = manager.commit().unwrap();

    assert!(!report.committed());
    assert!(report.before_completion_error.is_some());
    assert_eq!(
        *log.lock().unwrap(),
        vec!["veto:before", "veto:after:rolled-back", "b:after:rolled-back"]
    );
}

#[tokio::test]
async fn test_rollback_only_commit_rolls_back() {
    let manager = InMemoryTransactionManager::new();
    let transaction = manager.begin().unwrap();
    let log = Log::default();
    transaction.register_synchronization(logging_sync("a", &log)).await.unwrap();

    transaction.set_rollback_only().await.unwrap();
    let report = manager.commit().unwrap();

    assert_eq!(report.status, CompletionStatus::ROLLED_BACK);
    assert_eq!(*log.lock().unwrap(), vec!["a:after:rolled-back"]);
    assert_eq!(manager.rollback_only_calls(), 1);
}

#[tokio::test]
async fn test_registration_refused_when_marked_rollback() {
    let manager = InMemoryTransactionManager::new();
    let transaction = manager.begin().unwrap();
    manager.set_rollback_only().unwrap();

    let err = transaction
        .register_synchronization(logging_sync("a", &Log::default()))
        .await
        .unwrap_err();

    assert!(matches!(err, ManagerError::RolledBack(_)));
}

#[tokio::test]
async fn test_completed_transaction_refuses_calls() {
    let manager = InMemoryTransactionManager::new();
    let transaction = manager.begin().unwrap();
    manager.commit().unwrap();

    assert_eq!(transaction.status().await.unwrap(), CompletionStatus::COMMITTED);
    assert!(matches!(
        transaction.set_rollback_only().await,
        Err(ManagerError::IllegalState(_))
    ));
    assert!(matches!(
        transaction.register_synchronization(logging_sync("late", &Log::default())).await,
        Err(ManagerError::IllegalState(_))
    ));
}

#[tokio::test]
async fn test_manager_status_and_lookup() {
    let manager = InMemoryTransactionManager::new();

    assert_eq!(manager.status().await.unwrap(), CompletionStatus::NO_TRANSACTION);
    assert!(manager.transaction().await.unwrap().is_none());

    manager.begin().unwrap();
    assert_eq!(manager.status().await.unwrap(), CompletionStatus::ACTIVE);
    assert!(manager.transaction().await.unwrap().is_some());
    assert!(matches!(manager.begin(), Err(ManagerError::IllegalState(_))));

    manager.rollback().unwrap();
    assert_eq!(manager.status().await.unwrap(), CompletionStatus::NO_TRANSACTION);
    assert!(manager.commit().is_err());
}

#[tokio::test]
async fn test_failure_injection() {
    let manager = InMemoryTransactionManager::new();
    let transaction = manager.begin().unwrap();

    manager.fail(ManagerOperation::GetTransaction, "lookup down");
    manager.fail(ManagerOperation::GetStatus, "status down");
    manager.fail(ManagerOperation::TransactionStatus, "tx status down");
    manager.fail(ManagerOperation::SetRollbackOnly, "mark down");
    manager.fail(ManagerOperation::RegisterSynchronization, "register down");

    assert!(matches!(manager.transaction().await, Err(ManagerError::System(m)) if m == "lookup down"));
    assert!(matches!(manager.status().await, Err(ManagerError::System(m)) if m == "status down"));
    assert!(transaction.status().await.is_err());
    assert!(transaction.set_rollback_only().await.is_err());
    assert!(
        transaction
            .register_synchronization(logging_sync("a", &Log::default()))
            .await
            .is_err()
    );
    assert_eq!(transaction.current_status(), CompletionStatus::ACTIVE);

    manager.clear_failures();
    assert!(manager.transaction().await.unwrap().is_some());
}

#[tokio::test]
async fn test_commit_from_another_thread() {
    let manager = InMemoryTransactionManager::new();
    let transaction = manager.begin().unwrap();
    let log = Log::default();
    transaction.register_synchronization(logging_sync("a", &log)).await.unwrap();

    let driver = manager.clone();
    let report = std::thread::spawn(move || driver.commit().unwrap())
        .join()
        .expect("commit thread panicked");

    assert!(report.committed());
    assert_eq!(log.lock().unwrap().len(), 2);
}
