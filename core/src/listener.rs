//! Transaction listeners and the execution-context provider.

use crate::error::ListenerError;

/// A callback bound to one [`TransactionState`](crate::TransactionState).
///
/// Listeners run at most once: `execute` consumes the boxed listener. Any
/// `FnOnce(&C) -> Result<(), ListenerError> + Send` closure is a listener; use
/// [`listener_fn`] when the closure's argument type needs to be inferred.
///
/// # Example
///
/// ```
/// use tx_listeners_core::listener::{listener_fn, TransactionListener};
///
/// let listener = listener_fn(|tenant: &String| {
///     println!("flushing caches for {tenant}");
///     Ok(())
/// });
/// listener.execute(&"acme".to_string()).unwrap();
/// ```
pub trait TransactionListener<C>: Send {
    /// Run the listener with the context captured at registration time.
    ///
    /// # Errors
    ///
    /// Returns whatever the listener raised. The error is not interpreted.
    fn execute(self: Box<Self>, context: &C) -> Result<(), ListenerError>;
}

impl<C, F> TransactionListener<C> for F
where
    F: FnOnce(&C) -> Result<(), ListenerError> + Send,
{
    fn execute(self: Box<Self>, context: &C) -> Result<(), ListenerError> {
        (*self)(context)
    }
}

/// Box a closure as a listener.
#[must_use]
pub fn listener_fn<C, F>(f: F) -> Box<dyn TransactionListener<C>>
where
    C: 'static,
    F: FnOnce(&C) -> Result<(), ListenerError> + Send + 'static,
{
    Box::new(f)
}

/// Supplies the execution context captured alongside each listener.
///
/// Implementations are pure accessors: calling `current` must not have side
/// effects. Any `Fn() -> C + Send + Sync` closure is a provider.
pub trait ExecutionContextProvider<C>: Send + Sync {
    /// The context to capture for a registration happening now.
    fn current(&self) -> C;
}

impl<C, F> ExecutionContextProvider<C> for F
where
    F: Fn() -> C + Send + Sync,
{
    fn current(&self) -> C {
        self()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn closures_are_listeners() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);
        let listener = listener_fn(move |n: &usize| {
            counter.fetch_add(*n, Ordering::SeqCst);
            Ok(())
        });

        listener.execute(&5).unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn listener_errors_are_returned() {
        let listener = listener_fn(|_: &()| Err(ListenerError::msg("boom")));
        assert!(listener.execute(&()).is_err());
    }

    #[test]
    fn closures_are_providers() {
        let provider = || "command-42".to_string();
        let current = ExecutionContextProvider::<String>::current(&provider);
        assert_eq!(current, "command-42");
    }
}
