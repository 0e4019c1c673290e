//! Layered configuration for the network configuration manager daemon.
//!
//! [`Config`] is resolved by `ortho_config` from built-in defaults, an
//! optional TOML file (`--config-path` or `NCM_CONFIG_PATH`), `NCM_*`
//! environment variables and finally command-line flags, in increasing order
//! of precedence.

mod defaults;
mod frr;
mod logging;

use camino::Utf8PathBuf;
use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_CLI_PATH, DEFAULT_CONTAINER_MTU, DEFAULT_LOG_FILTER, DEFAULT_MODULE,
    default_cli_path, default_container_mtu, default_frr_auto_restart,
    default_log_filter, default_log_filter_string, default_log_format, default_lxcinit_cli,
    default_lxd_cli, default_module, default_sys_cli, default_vty_cli,
};
pub use frr::{FrrRestartMode, FrrRestartModeParseError};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved daemon configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "NCM")]
pub struct Config {
    /// `tracing` filter expression applied to daemon logs.
    #[serde(default = "defaults::default_log_filter_string")]
    pub log_filter: String,
    /// Output format of daemon logs.
    #[serde(default = "defaults::default_log_format")]
    pub log_format: LogFormat,
    /// Datastore module whose changes the daemon handles.
    #[serde(default = "defaults::default_module")]
    pub module: String,
    /// Copy the running store to the startup store after each applied change.
    #[serde(default)]
    pub persist: bool,
    /// Log downstream commands instead of running them.
    #[serde(default)]
    pub dry_run: bool,
    /// MTU used for container-facing VLAN links.
    #[serde(default = "defaults::default_container_mtu")]
    pub container_mtu: u32,
    /// Routing-daemon recovery used when a vty change is undone.
    #[serde(default = "defaults::default_frr_auto_restart")]
    pub frr_auto_restart: FrrRestartMode,
    /// Directory holding the downstream command-line tools.
    #[serde(default = "defaults::default_cli_path")]
    pub cli_path: Utf8PathBuf,
    /// Container management tool.
    #[serde(default = "defaults::default_lxd_cli")]
    pub lxd_cli: String,
    /// Container initialisation tool.
    #[serde(default = "defaults::default_lxcinit_cli")]
    pub lxcinit_cli: String,
    /// System tool driving sysctl, VRF and network settings.
    #[serde(default = "defaults::default_sys_cli")]
    pub sys_cli: String,
    /// Routing-daemon shell tool.
    #[serde(default = "defaults::default_vty_cli")]
    pub vty_cli: String,
    /// JSON-lines transaction file replayed through the in-memory datastore.
    #[serde(default)]
    pub replay: Option<Utf8PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
            module: default_module(),
            persist: false,
            dry_run: false,
            container_mtu: default_container_mtu(),
            frr_auto_restart: default_frr_auto_restart(),
            cli_path: default_cli_path(),
            lxd_cli: default_lxd_cli(),
            lxcinit_cli: default_lxcinit_cli(),
            sys_cli: default_sys_cli(),
            vty_cli: default_vty_cli(),
            replay: None,
        }
    }
}

impl Config {
    /// Filter expression for the telemetry subscriber.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Output format for the telemetry subscriber.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }

    /// Datastore module name.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Whether applied changes are persisted to the startup store.
    #[must_use]
    pub const fn persist(&self) -> bool {
        self.persist
    }

    /// Whether downstream commands are only logged.
    #[must_use]
    pub const fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// MTU for container-facing links.
    #[must_use]
    pub const fn container_mtu(&self) -> u32 {
        self.container_mtu
    }

    /// Routing-daemon recovery mode.
    #[must_use]
    pub const fn frr_auto_restart(&self) -> FrrRestartMode {
        self.frr_auto_restart
    }

    /// Full path of the container management tool.
    #[must_use]
    pub fn lxd_path(&self) -> Utf8PathBuf {
        self.cli_path.join(&self.lxd_cli)
    }

    /// Full path of the container initialisation tool.
    #[must_use]
    pub fn lxcinit_path(&self) -> Utf8PathBuf {
        self.cli_path.join(&self.lxcinit_cli)
    }

    /// Full path of the system tool.
    #[must_use]
    pub fn sys_path(&self) -> Utf8PathBuf {
        self.cli_path.join(&self.sys_cli)
    }

    /// Full path of the routing-daemon shell tool.
    #[must_use]
    pub fn vty_path(&self) -> Utf8PathBuf {
        self.cli_path.join(&self.vty_cli)
    }

    /// Replay file, when configured.
    #[must_use]
    pub fn replay(&self) -> Option<&Utf8PathBuf> {
        self.replay.as_ref()
    }
}

#[cfg(test)]
mod tests;
