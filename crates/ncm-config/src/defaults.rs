use camino::Utf8PathBuf;

use crate::frr::FrrRestartMode;
use crate::logging::LogFormat;

/// Default log filter expression used by the daemon.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Datastore module the daemon subscribes to unless overridden.
pub const DEFAULT_MODULE: &str = "beluganos-network-instance";

/// MTU applied to container-facing VLAN links when none is configured.
pub const DEFAULT_CONTAINER_MTU: u32 = 9000;

/// Directory holding the downstream command-line tools.
pub const DEFAULT_CLI_PATH: &str = "/usr/bin";

/// Default log filter expression used by the daemon.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the daemon.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}

/// Owned module name used by serde defaults.
#[must_use]
pub fn default_module() -> String {
    DEFAULT_MODULE.to_owned()
}

/// Default container MTU.
#[must_use]
pub const fn default_container_mtu() -> u32 {
    DEFAULT_CONTAINER_MTU
}

/// Default routing-daemon recovery mode.
#[must_use]
pub const fn default_frr_auto_restart() -> FrrRestartMode {
    FrrRestartMode::None
}

/// Default directory of the downstream tools.
#[must_use]
pub fn default_cli_path() -> Utf8PathBuf {
    Utf8PathBuf::from(DEFAULT_CLI_PATH)
}

/// Default container management tool name.
#[must_use]
pub fn default_lxd_cli() -> String {
    "ncm-lxd".to_owned()
}

/// Default container initialisation tool name.
#[must_use]
pub fn default_lxcinit_cli() -> String {
    "ncm-lxcinit".to_owned()
}

/// Default system (sysctl, vrf, network) tool name.
#[must_use]
pub fn default_sys_cli() -> String {
    "ncm-sys".to_owned()
}

/// Default routing-daemon shell tool name.
#[must_use]
pub fn default_vty_cli() -> String {
    "ncm-vty".to_owned()
}
