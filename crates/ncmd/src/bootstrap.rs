//! Daemon bootstrap orchestration.

use std::ffi::OsString;
use std::sync::Arc;

use camino::Utf8Path;
use ncm_config::Config;
use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use crate::controller::ChangeController;
use crate::datastore::{
    Datastore, DatastoreError, MemoryDatastore, ReplayError, ReplaySummary, SubscribeFlags,
    Subscription, read_transactions, replay,
};
use crate::factory::NiHandlerFactory;
use crate::health::HealthReporter;
use crate::schema::NetworkInstance;
use crate::telemetry::{self, TelemetryError, TelemetryHandle};

/// Trait abstracting configuration loading for testability.
pub trait ConfigLoader: Send + Sync {
    /// Loads the daemon configuration.
    fn load(&self) -> Result<Config, Arc<OrthoError>>;
}

/// Loader that delegates to [`Config::load`].
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemConfigLoader;

impl ConfigLoader for SystemConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load()
    }
}

/// Loader resolving an explicit argument vector.
#[derive(Debug, Clone)]
pub struct ArgsConfigLoader {
    args: Vec<OsString>,
}

impl ArgsConfigLoader {
    /// Captures `args`, program name first.
    #[must_use]
    pub fn new<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl ConfigLoader for ArgsConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Config::load_from_iter(self.args.iter().cloned())
    }
}

/// Loader returning a fixed configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    /// Wraps `config`.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        Ok(self.config.clone())
    }
}

/// Errors surfaced during bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// Configuration failed to load.
    #[error("failed to load configuration: {source}")]
    Configuration {
        /// Underlying loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// Telemetry initialisation failed.
    #[error("failed to initialise telemetry: {source}")]
    Telemetry {
        /// Underlying telemetry error.
        #[source]
        source: TelemetryError,
    },
    /// The controller could not subscribe to its module.
    #[error("failed to subscribe to module changes: {source}")]
    Subscription {
        /// Datastore error reported while subscribing.
        #[source]
        source: DatastoreError,
    },
}

/// Result of a successful bootstrap invocation.
///
/// The daemon owns the in-memory datastore and the subscription feeding the
/// network-instance controller. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Daemon {
    config: Config,
    telemetry: TelemetryHandle,
    datastore: Arc<MemoryDatastore>,
    subscription: Subscription,
}

impl Daemon {
    /// Accessor for the resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Accessor for the telemetry handle, primarily useful for testing.
    #[must_use]
    pub const fn telemetry(&self) -> TelemetryHandle {
        self.telemetry
    }

    /// The datastore the controller is subscribed to.
    #[must_use]
    pub const fn datastore(&self) -> &Arc<MemoryDatastore> {
        &self.datastore
    }

    /// The live subscription.
    #[must_use]
    pub const fn subscription(&self) -> &Subscription {
        &self.subscription
    }

    /// Commits every transaction of the JSON-lines file at `path`.
    pub fn replay(&self, path: &Utf8Path) -> Result<ReplaySummary, ReplayError> {
        let transactions = read_transactions(path)?;
        Ok(replay(&self.datastore, &transactions))
    }
}

/// Bootstraps the daemon using the supplied collaborators.
pub fn bootstrap_with(
    loader: &dyn ConfigLoader,
    reporter: Arc<dyn HealthReporter>,
) -> Result<Daemon, BootstrapError> {
    reporter.bootstrap_starting();

    let config = match loader.load() {
        Ok(config) => config,
        Err(source) => {
            let error = BootstrapError::Configuration { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let telemetry = match telemetry::initialise(&config) {
        Ok(handle) => handle,
        Err(source) => {
            let error = BootstrapError::Telemetry { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    let datastore = Arc::new(MemoryDatastore::new());
    let controller = Arc::new(
        ChangeController::<NetworkInstance>::new(
            Arc::clone(&datastore) as Arc<dyn Datastore>,
            Arc::new(NiHandlerFactory::from_config(&config)),
            config.module(),
            Arc::clone(&reporter),
        )
        .with_persist(config.persist()),
    );
    let flags = SubscribeFlags {
        apply_only: false,
        enabled: true,
    };
    let subscription = match ChangeController::subscribe(&controller, flags) {
        Ok(subscription) => subscription,
        Err(source) => {
            let error = BootstrapError::Subscription { source };
            reporter.bootstrap_failed(&error);
            return Err(error);
        }
    };

    reporter.bootstrap_succeeded(&config);
    Ok(Daemon {
        config,
        telemetry,
        datastore,
        subscription,
    })
}
