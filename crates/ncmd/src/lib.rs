//! Network configuration manager daemon.
//!
//! The daemon subscribes to a datastore module, turns every change
//! notification into typed network-instance trees and hands each changed
//! instance to a handler chosen by transaction phase and change operation.
//! Handlers validate the change during VERIFY and, during APPLY, queue the
//! downstream commands (container, sysctl, VRF, VLAN and routing-daemon
//! tools) into a reversible [`ncm_command::CommandBatch`] that is committed
//! or rolled back as a unit.
//!
//! The native datastore binding is not part of this crate. The binary runs
//! over [`datastore::MemoryDatastore`] and replays JSON-lines transaction
//! files through it, which drives the same VERIFY, APPLY and ABORT sequence
//! a live datastore would.
//!
//! Bootstrap reports each stage through a [`HealthReporter`] so operators
//! can follow configuration loading, telemetry setup and subscription in
//! the structured logs.

mod bootstrap;
pub mod changeset;
pub mod controller;
pub mod datastore;
pub mod factory;
pub mod handler;
pub mod handlers;
mod health;
pub mod inventory;
pub mod schema;
mod telemetry;

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;
use std::sync::Arc;

pub use bootstrap::{
    ArgsConfigLoader, BootstrapError, ConfigLoader, Daemon, StaticConfigLoader,
    SystemConfigLoader, bootstrap_with,
};
pub use health::{HealthReporter, StructuredHealthReporter};
pub use telemetry::{TelemetryError, TelemetryHandle};

const TARGET: &str = env!("CARGO_PKG_NAME");

/// Runs the daemon with `args` and reports fatal errors to `stderr`.
///
/// The configured replay file is committed transaction by transaction. The
/// exit status is a failure when bootstrap fails, when no replay file is
/// configured, or when any transaction was rejected or failed.
pub fn run<I, T, E>(args: I, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
    E: Write,
{
    let loader = ArgsConfigLoader::new(args);
    let daemon = match bootstrap_with(&loader, Arc::new(StructuredHealthReporter::new())) {
        Ok(daemon) => daemon,
        Err(error) => {
            let _ = writeln!(stderr, "ncmd: {error}");
            return ExitCode::FAILURE;
        }
    };

    let Some(path) = daemon.config().replay() else {
        let _ = writeln!(
            stderr,
            "ncmd: no replay file configured; set --replay or NCM_REPLAY \
             (the native datastore binding is not built in)"
        );
        return ExitCode::FAILURE;
    };

    match daemon.replay(path) {
        Ok(summary) => {
            tracing::info!(
                target: TARGET,
                applied = summary.applied,
                rejected = summary.rejected,
                failed = summary.failed,
                "replay finished"
            );
            if summary.is_clean() {
                ExitCode::SUCCESS
            } else {
                let _ = writeln!(
                    stderr,
                    "ncmd: {} applied, {} rejected, {} failed",
                    summary.applied, summary.rejected, summary.failed
                );
                ExitCode::FAILURE
            }
        }
        Err(error) => {
            let _ = writeln!(stderr, "ncmd: {error}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests;
