//! Configuration loaders for scenarios covering success and failure paths.

use std::ffi::OsString;
use std::sync::Arc;

use ncm_config::{Config, LogFormat};
use ortho_config::{OrthoConfig, OrthoError};

use crate::bootstrap::ConfigLoader;

/// Configuration that logs downstream commands instead of running them and
/// persists every applied change.
#[must_use]
pub fn dry_run_config() -> Config {
    Config {
        log_format: LogFormat::Compact,
        dry_run: true,
        persist: true,
        ..Config::default()
    }
}

/// Loader that intentionally fails by passing an invalid CLI value.
pub struct FailingConfigLoader;

impl ConfigLoader for FailingConfigLoader {
    fn load(&self) -> Result<Config, Arc<OrthoError>> {
        let args = vec![
            OsString::from("ncmd"),
            OsString::from("--container-mtu"),
            OsString::from("jumbo"),
        ];
        Config::load_from_iter(args)
    }
}
