//! Structured health reporting for daemon lifecycle events.

use std::sync::Arc;

use ncm_config::Config;

use crate::bootstrap::BootstrapError;
use crate::controller::ControllerError;
use crate::datastore::{DatastoreError, Phase};

/// Observer trait used to surface lifecycle events to telemetry sinks.
#[cfg_attr(test, mockall::automock)]
pub trait HealthReporter: Send + Sync {
    /// Invoked before configuration loading begins.
    fn bootstrap_starting(&self);

    /// Invoked after bootstrap completes successfully.
    fn bootstrap_succeeded(&self, config: &Config);

    /// Invoked when bootstrap fails.
    fn bootstrap_failed(&self, error: &BootstrapError);

    /// Invoked once the controller is subscribed to `module`.
    fn subscribed(&self, module: &str);

    /// Invoked after a notification was handled.
    fn notification_processed(&self, module: &str, phase: Phase);

    /// Invoked when handling a notification failed.
    fn notification_rejected(&self, module: &str, phase: Phase, error: &ControllerError);

    /// Invoked when the background persistence copy finished.
    fn persisted(&self, module: &str);

    /// Invoked when the background persistence copy failed.
    fn persistence_failed(&self, module: &str, error: &DatastoreError);
}

impl<T> HealthReporter for Arc<T>
where
    T: HealthReporter,
{
    fn bootstrap_starting(&self) {
        (**self).bootstrap_starting();
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        (**self).bootstrap_succeeded(config);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        (**self).bootstrap_failed(error);
    }

    fn subscribed(&self, module: &str) {
        (**self).subscribed(module);
    }

    fn notification_processed(&self, module: &str, phase: Phase) {
        (**self).notification_processed(module, phase);
    }

    fn notification_rejected(&self, module: &str, phase: Phase, error: &ControllerError) {
        (**self).notification_rejected(module, phase, error);
    }

    fn persisted(&self, module: &str) {
        (**self).persisted(module);
    }

    fn persistence_failed(&self, module: &str, error: &DatastoreError) {
        (**self).persistence_failed(module, error);
    }
}

/// Default reporter that records lifecycle events using `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructuredHealthReporter;

impl StructuredHealthReporter {
    /// Builds a new reporter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl HealthReporter for StructuredHealthReporter {
    fn bootstrap_starting(&self) {
        tracing::info!(
            target: "ncmd::health",
            event = "bootstrap_starting",
            "starting daemon bootstrap"
        );
    }

    fn bootstrap_succeeded(&self, config: &Config) {
        tracing::info!(
            target: "ncmd::health",
            event = "bootstrap_succeeded",
            module = %config.module(),
            persist = config.persist(),
            dry_run = config.dry_run(),
            log_filter = %config.log_filter(),
            log_format = ?config.log_format(),
            "daemon bootstrap completed"
        );
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        tracing::error!(
            target: "ncmd::health",
            event = "bootstrap_failed",
            error = %error,
            "daemon bootstrap failed"
        );
    }

    fn subscribed(&self, module: &str) {
        tracing::info!(
            target: "ncmd::health",
            event = "subscribed",
            module,
            "subscribed to module changes"
        );
    }

    fn notification_processed(&self, module: &str, phase: Phase) {
        tracing::info!(
            target: "ncmd::health",
            event = "notification_processed",
            module,
            phase = %phase,
            "notification handled"
        );
    }

    fn notification_rejected(&self, module: &str, phase: Phase, error: &ControllerError) {
        tracing::error!(
            target: "ncmd::health",
            event = "notification_rejected",
            module,
            phase = %phase,
            error = %error,
            "notification failed"
        );
    }

    fn persisted(&self, module: &str) {
        tracing::info!(
            target: "ncmd::health",
            event = "persisted",
            module,
            "running configuration copied to startup"
        );
    }

    fn persistence_failed(&self, module: &str, error: &DatastoreError) {
        tracing::error!(
            target: "ncmd::health",
            event = "persistence_failed",
            module,
            error = %error,
            "failed to copy running configuration to startup"
        );
    }
}
