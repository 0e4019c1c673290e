//! BDD test world: owns the loader, reporter, daemon and replay state shared
//! by step functions.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use camino::Utf8Path;
use ncm_config::DEFAULT_MODULE;
use tempfile::NamedTempFile;

use crate::bootstrap::{BootstrapError, ConfigLoader, Daemon, StaticConfigLoader, bootstrap_with};
use crate::datastore::{Edit, ReplayError, ReplaySummary, Store, Transaction};

use super::config_loader::{FailingConfigLoader, dry_run_config};
use super::reporter::RecordingHealthReporter;

/// Path of network instance `name` in the default module.
#[must_use]
pub fn instance_path(name: &str) -> String {
    format!("/{DEFAULT_MODULE}:network-instances/network-instance[name='{name}']")
}

/// Scenario world shared across BDD steps.
pub struct TestWorld {
    loader: Box<dyn ConfigLoader>,
    pub reporter: Arc<RecordingHealthReporter>,
    daemon: Option<Daemon>,
    bootstrap_error: Option<BootstrapError>,
    transactions: NamedTempFile,
    replay_result: Option<Result<ReplaySummary, ReplayError>>,
}

impl TestWorld {
    /// Creates a world with a dry-run loader and an empty replay file.
    #[must_use]
    pub fn new() -> Self {
        Self {
            loader: Box::new(StaticConfigLoader::new(dry_run_config())),
            reporter: Arc::new(RecordingHealthReporter::default()),
            daemon: None,
            bootstrap_error: None,
            transactions: NamedTempFile::new().expect("failed to create replay file"),
            replay_result: None,
        }
    }

    /// Switches to a loader that rejects its command line.
    pub fn use_failing_loader(&mut self) {
        self.loader = Box::new(FailingConfigLoader);
    }

    /// Runs bootstrap and records the outcome.
    pub fn bootstrap(&mut self) {
        let reporter = Arc::clone(&self.reporter);
        match bootstrap_with(self.loader.as_ref(), reporter) {
            Ok(daemon) => self.daemon = Some(daemon),
            Err(error) => self.bootstrap_error = Some(error),
        }
    }

    /// Appends one transaction to the replay file.
    pub fn queue(&mut self, label: &str, edits: Vec<Edit>) {
        let transaction = Transaction {
            label: Some(label.to_owned()),
            edits,
        };
        let line = serde_json::to_string(&transaction).expect("transaction serialises");
        writeln!(self.transactions, "{line}").expect("failed to write replay file");
    }

    /// Replays the queued transactions through the daemon.
    pub fn replay(&mut self) {
        let daemon = self.daemon.as_ref().expect("daemon must be bootstrapped");
        let path = Utf8Path::from_path(self.transactions.path()).expect("utf-8 replay path");
        self.replay_result = Some(daemon.replay(path));
    }

    /// Returns the bootstrapped daemon, if any.
    pub const fn daemon(&self) -> Option<&Daemon> {
        self.daemon.as_ref()
    }

    /// Returns the bootstrap error, if any.
    pub const fn bootstrap_error(&self) -> Option<&BootstrapError> {
        self.bootstrap_error.as_ref()
    }

    /// Returns the last replay summary.
    pub fn summary(&self) -> ReplaySummary {
        match &self.replay_result {
            Some(Ok(summary)) => *summary,
            Some(Err(error)) => panic!("replay failed: {error}"),
            None => panic!("nothing was replayed"),
        }
    }

    /// Snapshot of a store of the bootstrapped daemon.
    pub fn store(&self, store: Store) -> BTreeMap<String, String> {
        self.daemon
            .as_ref()
            .map(|daemon| daemon.datastore().items(store))
            .unwrap_or_default()
    }
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Default test world fixture.
#[must_use]
pub fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::new())
}
