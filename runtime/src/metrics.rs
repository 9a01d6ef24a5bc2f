//! Prometheus metrics for listener dispatch and manager interactions.
//!
//! The recorders below are cheap no-ops until a recorder is installed, e.g.
//! by [`MetricsRecorder::start`].
//!
//! # Example
//!
//! ```rust,no_run
//! use tx_listeners_runtime::metrics::MetricsRecorder;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut recorder = MetricsRecorder::new();
//! recorder.start()?;
//!
//! // Exposing the text over HTTP is up to the embedding service.
//! if let Some(text) = recorder.render() {
//!     println!("{text}");
//! }
//! # Ok(())
//! # }
//! ```

use metrics::describe_counter;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use thiserror::Error;
use tx_listeners_core::{Interaction, TransactionState};

// Re-export metrics macros for use in other modules
pub use metrics::counter;

/// Errors from metrics operations.
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Failed to install metrics exporter
    #[error("Failed to install metrics exporter: {0}")]
    Install(String),
}

/// Installs the Prometheus recorder and renders its text exposition.
///
/// Nothing is bound or served here; the embedding service decides where
/// [`MetricsRecorder::render`] output is exposed.
#[derive(Default)]
pub struct MetricsRecorder {
    handle: Option<PrometheusHandle>,
}

impl MetricsRecorder {
    /// Create a recorder that has not been installed yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { handle: None }
    }

    /// Register metric descriptions and install the Prometheus recorder.
    ///
    /// # Errors
    ///
    /// Returns error if the recorder cannot be installed.
    ///
    /// # Note
    ///
    /// If a recorder is already installed (e.g., in tests), this logs a warning
    /// and succeeds without a handle.
    pub fn start(&mut self) -> Result<(), MetricsError> {
        register_metrics();

        match PrometheusBuilder::new().install_recorder() {
            Ok(handle) => {
                self.handle = Some(handle);
                tracing::info!("Metrics recorder installed");
                Ok(())
            }
            Err(e) => {
                let err_msg = e.to_string();
                if err_msg.contains("already initialized") {
                    tracing::warn!("Metrics recorder already initialized, skipping re-initialization");
                    Ok(())
                } else {
                    Err(MetricsError::Install(err_msg))
                }
            }
        }
    }

    /// Get the metrics handle for rendering.
    #[must_use]
    pub const fn handle(&self) -> Option<&PrometheusHandle> {
        self.handle.as_ref()
    }

    /// Render current metrics in Prometheus format.
    ///
    /// Returns `None` if this instance did not install the recorder.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }
}

/// Register all metric descriptions.
fn register_metrics() {
    describe_counter!(
        "tx_listeners_registered_total",
        "Total number of listeners registered with a transaction"
    );
    describe_counter!(
        "tx_listeners_executed_total",
        "Total number of listeners executed, by state and completion phase"
    );
    describe_counter!(
        "tx_listeners_failed_total",
        "Total number of listeners that returned an error"
    );
    describe_counter!(
        "tx_interaction_failures_total",
        "Total number of failed interactions with the transaction manager"
    );
    describe_counter!(
        "tx_rollback_only_marked_total",
        "Total number of transactions marked rollback-only"
    );
}

/// Completion phase a listener ran in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// `before_completion`
    Before,
    /// `after_completion`
    After,
}

impl Phase {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Before => "before",
            Self::After => "after",
        }
    }
}

/// Listener metrics recorder.
pub struct ListenerMetrics;

impl ListenerMetrics {
    /// Record a listener registration.
    pub fn record_registered(state: TransactionState) {
        counter!("tx_listeners_registered_total", "state" => state.as_str()).increment(1);
    }

    /// Record a listener execution.
    pub fn record_executed(state: TransactionState, phase: Phase) {
        counter!(
            "tx_listeners_executed_total",
            "state" => state.as_str(),
            "phase" => phase.as_str()
        )
        .increment(1);
    }

    /// Record a listener failure.
    pub fn record_failed(state: TransactionState) {
        counter!("tx_listeners_failed_total", "state" => state.as_str()).increment(1);
    }
}

/// Manager interaction metrics recorder.
pub struct InteractionMetrics;

impl InteractionMetrics {
    /// Record a failed interaction.
    pub fn record_failure(operation: Interaction) {
        counter!("tx_interaction_failures_total", "operation" => operation.label()).increment(1);
    }

    /// Record a transaction being marked rollback-only.
    pub fn record_rollback_only() {
        counter!("tx_rollback_only_marked_total").increment(1);
    }
}
