//! Test harness utilities for the daemon behavioural suite.

mod config_loader;
mod reporter;
mod world;

pub use config_loader::{FailingConfigLoader, dry_run_config};
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use world::{TestWorld, instance_path, world};
