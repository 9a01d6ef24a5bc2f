//! Transaction context for transactions owned by an external manager.

use crate::config::ContextConfig;
use crate::metrics::{InteractionMetrics, ListenerMetrics};
use crate::synchronization::StateSynchronization;
use std::sync::Arc;
use tx_listeners_core::error::Result;
use tx_listeners_core::{
    CompletionStatus, ExecutionContextProvider, Interaction, ManagerError, Transaction,
    TransactionContext, TransactionInteractionError, TransactionListener, TransactionManager,
    TransactionState,
};

/// [`TransactionContext`] over a transaction driven by an external manager.
///
/// The context never begins or commits anything itself. It reads the
/// manager's status, marks the transaction rollback-only when asked to roll
/// back, and registers listeners as [`StateSynchronization`]s that the
/// manager later drives.
///
/// Each manager call is wrapped on its own, so a failure is reported as a
/// [`TransactionInteractionError`] naming the interaction that failed. Nothing
/// is retried and nothing is swallowed.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use tx_listeners_core::{TransactionState, listener_fn};
/// use tx_listeners_runtime::ManagedTransactionContext;
/// use tx_listeners_testing::InMemoryTransactionManager;
///
/// # tokio_test::block_on(async {
/// let manager = Arc::new(InMemoryTransactionManager::new());
/// let context = ManagedTransactionContext::new(manager.clone(), || "cmd-1".to_string());
///
/// manager.begin().unwrap();
/// context
///     .add_listener(
///         TransactionState::Committed,
///         listener_fn(|cmd: &String| {
///             println!("{cmd} committed");
///             Ok(())
///         }),
///     )
///     .await
///     .unwrap();
///
/// manager.commit().unwrap();
/// # });
/// ```
pub struct ManagedTransactionContext<C> {
    manager: Arc<dyn TransactionManager>,
    provider: Arc<dyn ExecutionContextProvider<C>>,
    config: ContextConfig,
}

impl<C> Clone for ManagedTransactionContext<C> {
    fn clone(&self) -> Self {
        Self {
            manager: Arc::clone(&self.manager),
            provider: Arc::clone(&self.provider),
            config: self.config.clone(),
        }
    }
}

impl<C> std::fmt::Debug for ManagedTransactionContext<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedTransactionContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl<C: Send + 'static> ManagedTransactionContext<C> {
    /// Create a context over `manager`, capturing listener contexts from
    /// `provider`.
    pub fn new<M, P>(manager: Arc<M>, provider: P) -> Self
    where
        M: TransactionManager + 'static,
        P: ExecutionContextProvider<C> + 'static,
    {
        Self {
            manager,
            provider: Arc::new(provider),
            config: ContextConfig::default(),
        }
    }

    /// Replace the configuration.
    #[must_use]
    pub fn with_config(mut self, config: ContextConfig) -> Self {
        self.config = config;
        self
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &ContextConfig {
        &self.config
    }

    /// Managed transaction: the manager commits, so this does nothing.
    ///
    /// # Errors
    ///
    /// Never fails; the `Result` keeps the signature shared with contexts
    /// that drive their own transactions.
    #[allow(clippy::unused_async)]
    pub async fn commit(&self) -> Result<()> {
        tracing::trace!(manager = %self.config.manager_name, "Managed transaction, ignoring commit");
        Ok(())
    }

    /// Mark the current transaction rollback-only, unless there is no
    /// transaction or it has already rolled back.
    ///
    /// A manager that hands out no transaction handle is treated as having
    /// nothing to mark and returns `Ok(())`, unlike
    /// [`add_listener`](Self::add_listener), which fails in that case.
    ///
    /// # Errors
    ///
    /// Any failure looking up the transaction, reading its status or marking
    /// it is reported with [`Interaction::SettingRollbackOnly`].
    #[tracing::instrument(skip(self), fields(manager = %self.config.manager_name))]
    pub async fn rollback(&self) -> Result<()> {
        match self.mark_rollback_only().await {
            Ok(marked) => {
                if marked && self.config.metrics_enabled {
                    InteractionMetrics::record_rollback_only();
                }
                Ok(())
            }
            Err(source) => Err(self.failure(Interaction::SettingRollbackOnly, source)),
        }
    }

    async fn mark_rollback_only(&self) -> std::result::Result<bool, ManagerError> {
        let Some(transaction) = self.manager.transaction().await? else {
            tracing::debug!("No transaction associated, nothing to roll back");
            return Ok(false);
        };

        let status = transaction.status().await?;
        if status == CompletionStatus::NO_TRANSACTION || status == CompletionStatus::ROLLED_BACK {
            tracing::debug!(%status, "Transaction already finished, not marking rollback-only");
            return Ok(false);
        }

        transaction.set_rollback_only().await?;
        tracing::debug!(%status, "Marked transaction rollback-only");
        Ok(true)
    }

    /// Look up the current transaction handle.
    async fn transaction(&self) -> Result<Option<Arc<dyn Transaction>>> {
        self.manager
            .transaction()
            .await
            .map_err(|source| self.failure(Interaction::GettingTransaction, source))
    }

    /// Register `listener` for `state`, capturing the provider's current
    /// context.
    ///
    /// May be called any number of times per transaction; each call is an
    /// independent registration.
    ///
    /// # Errors
    ///
    /// - [`Interaction::GettingTransaction`] if the handle lookup fails
    /// - [`Interaction::RegisteringSynchronization`] if there is no transaction
    ///   or the manager refuses the registration
    pub async fn add_listener(
        &self,
        state: TransactionState,
        listener: Box<dyn TransactionListener<C>>,
    ) -> Result<()> {
        let transaction = self.transaction().await?;
        let context = self.provider.current();
        self.register(transaction, state, listener, context).await
    }

    /// Register `listener` for `state` with an explicitly supplied context.
    ///
    /// # Errors
    ///
    /// Same as [`add_listener`](Self::add_listener).
    pub async fn add_listener_with_context(
        &self,
        state: TransactionState,
        listener: Box<dyn TransactionListener<C>>,
        context: C,
    ) -> Result<()> {
        let transaction = self.transaction().await?;
        self.register(transaction, state, listener, context).await
    }

    #[tracing::instrument(
        skip(self, transaction, listener, context),
        fields(state = %state, manager = %self.config.manager_name)
    )]
    async fn register(
        &self,
        transaction: Option<Arc<dyn Transaction>>,
        state: TransactionState,
        listener: Box<dyn TransactionListener<C>>,
        context: C,
    ) -> Result<()> {
        let Some(transaction) = transaction else {
            return Err(self.failure(
                Interaction::RegisteringSynchronization,
                ManagerError::IllegalState("no transaction associated with the caller".to_string()),
            ));
        };

        let synchronization = StateSynchronization::new(state, listener, context)
            .with_metrics(self.config.metrics_enabled);

        transaction
            .register_synchronization(Box::new(synchronization))
            .await
            .map_err(|source| self.failure(Interaction::RegisteringSynchronization, source))?;

        tracing::debug!("Registered transaction listener");
        if self.config.metrics_enabled {
            ListenerMetrics::record_registered(state);
        }
        Ok(())
    }

    /// Whether the current transaction can still do useful work: the
    /// manager's status is neither `MARKED_ROLLBACK` nor `NO_TRANSACTION`.
    ///
    /// # Errors
    ///
    /// [`Interaction::GettingTransactionState`] if the status query fails.
    #[tracing::instrument(skip(self), fields(manager = %self.config.manager_name))]
    pub async fn is_transaction_active(&self) -> Result<bool> {
        let status = self
            .manager
            .status()
            .await
            .map_err(|source| self.failure(Interaction::GettingTransactionState, source))?;

        Ok(status != CompletionStatus::MARKED_ROLLBACK && status != CompletionStatus::NO_TRANSACTION)
    }

    fn failure(&self, operation: Interaction, source: ManagerError) -> TransactionInteractionError {
        tracing::warn!(
            manager = %self.config.manager_name,
            %operation,
            error = %source,
            "Exception while interacting with transaction"
        );
        if self.config.metrics_enabled {
            InteractionMetrics::record_failure(operation);
        }
        TransactionInteractionError::new(operation, source)
    }
}

impl<C: Send + 'static> TransactionContext for ManagedTransactionContext<C> {
    type Context = C;

    async fn commit(&self) -> Result<()> {
        Self::commit(self).await
    }

    async fn rollback(&self) -> Result<()> {
        Self::rollback(self).await
    }

    async fn add_listener(
        &self,
        state: TransactionState,
        listener: Box<dyn TransactionListener<C>>,
    ) -> Result<()> {
        Self::add_listener(self, state, listener).await
    }

    async fn is_transaction_active(&self) -> Result<bool> {
        Self::is_transaction_active(self).await
    }
}
