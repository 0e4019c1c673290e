//! Test double for [`HealthReporter`] that records structured events for assertions.

use std::sync::Mutex;

use ncm_config::Config;

use crate::bootstrap::BootstrapError;
use crate::controller::ControllerError;
use crate::datastore::{DatastoreError, Phase};
use crate::health::HealthReporter;

/// Structured health events tracked during scenarios.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HealthEvent {
    /// Bootstrap started.
    BootstrapStarting,
    /// Bootstrap completed successfully.
    BootstrapSucceeded,
    /// Bootstrap failed with an error description.
    BootstrapFailed(String),
    /// The controller subscribed to a module.
    Subscribed(String),
    /// A notification was handled.
    NotificationProcessed(Phase),
    /// A notification was refused.
    NotificationRejected { phase: Phase, message: String },
    /// The running store was copied to startup.
    Persisted(String),
    /// The copy to startup failed.
    PersistenceFailed(String),
}

/// Records health events for assertions.
#[derive(Debug, Default)]
pub struct RecordingHealthReporter {
    events: Mutex<Vec<HealthEvent>>,
}

impl RecordingHealthReporter {
    /// Captures a copy of the recorded events.
    #[must_use]
    pub fn events(&self) -> Vec<HealthEvent> {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .clone()
    }

    fn record(&self, event: HealthEvent) {
        self.events
            .lock()
            .expect("health reporter mutex poisoned")
            .push(event);
    }
}

impl HealthReporter for RecordingHealthReporter {
    fn bootstrap_starting(&self) {
        self.record(HealthEvent::BootstrapStarting);
    }

    fn bootstrap_succeeded(&self, _config: &Config) {
        self.record(HealthEvent::BootstrapSucceeded);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(HealthEvent::BootstrapFailed(error.to_string()));
    }

    fn subscribed(&self, module: &str) {
        self.record(HealthEvent::Subscribed(module.to_owned()));
    }

    fn notification_processed(&self, _module: &str, phase: Phase) {
        self.record(HealthEvent::NotificationProcessed(phase));
    }

    fn notification_rejected(&self, _module: &str, phase: Phase, error: &ControllerError) {
        self.record(HealthEvent::NotificationRejected {
            phase,
            message: error.to_string(),
        });
    }

    fn persisted(&self, module: &str) {
        self.record(HealthEvent::Persisted(module.to_owned()));
    }

    fn persistence_failed(&self, _module: &str, error: &DatastoreError) {
        self.record(HealthEvent::PersistenceFailed(error.to_string()));
    }
}
