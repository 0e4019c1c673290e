//! Behavioural coverage for configuration layering.

use std::cell::RefCell;
use std::ffi::OsString;
use std::fs;
use std::sync::{Mutex, MutexGuard};

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tempfile::TempDir;

use ncm_config::{Config, DEFAULT_CONTAINER_MTU, default_log_filter, default_log_format};
use ortho_config::OrthoConfig;

static ENV_MUTEX: Mutex<()> = Mutex::new(());

struct Harness {
    temp_dir: TempDir,
    cli_args: RefCell<Vec<OsString>>,
    env_overrides: RefCell<Vec<(String, Option<OsString>)>>,
    loaded: RefCell<Option<Config>>,
    error: RefCell<Option<String>>,
    _guard: MutexGuard<'static, ()>,
}

impl Harness {
    fn new() -> Self {
        let guard = ENV_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let temp_dir = match TempDir::new() {
            Ok(dir) => dir,
            Err(error) => panic!("failed to create temporary directory: {error}"),
        };
        Self {
            temp_dir,
            cli_args: RefCell::new(vec![OsString::from("ncmd")]),
            env_overrides: RefCell::new(Vec::new()),
            loaded: RefCell::new(None),
            error: RefCell::new(None),
            _guard: guard,
        }
    }

    fn write_config(&self, contents: &str) {
        let path = self.temp_dir.path().join("ncm.toml");
        if let Err(error) = fs::write(&path, contents) {
            panic!("failed to write configuration: {error}");
        }

        let mut args = self.cli_args.borrow_mut();
        args.push(OsString::from("--config-path"));
        args.push(path.into_os_string());
    }

    fn set_env(&self, key: &str, value: &str) {
        let previous = std::env::var_os(key);
        // Restored in `Drop`; the mutex keeps parallel scenarios apart.
        unsafe { std::env::set_var(key, value) };
        self.env_overrides
            .borrow_mut()
            .push((key.to_owned(), previous));
    }

    fn push_cli_arg(&self, arg: impl Into<OsString>) {
        self.cli_args.borrow_mut().push(arg.into());
    }

    fn load(&self) {
        if self.loaded.borrow().is_some() || self.error.borrow().is_some() {
            return;
        }

        let args = self.cli_args.borrow().clone();
        match Config::load_from_iter(args) {
            Ok(config) => *self.loaded.borrow_mut() = Some(config),
            Err(error) => *self.error.borrow_mut() = Some(error.to_string()),
        }
    }

    fn config(&self) -> Config {
        self.load();
        if let Some(error) = self.error.borrow().as_ref() {
            panic!("configuration failed to load: {error}");
        }
        match self.loaded.borrow().as_ref() {
            Some(config) => config.clone(),
            None => panic!("configuration was not loaded"),
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        let mut overrides = self.env_overrides.borrow_mut();
        while let Some((key, value)) = overrides.pop() {
            match value {
                Some(os_value) => unsafe { std::env::set_var(&key, os_value) },
                None => unsafe { std::env::remove_var(&key) },
            }
        }
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[given("a configuration file setting the container MTU to \"{mtu}\"")]
fn given_configuration_file(harness: &Harness, mtu: String) {
    harness.write_config(&format!("container_mtu = {mtu}\n"));
}

#[given("the environment overrides the container MTU to \"{mtu}\"")]
fn given_environment_override(harness: &Harness, mtu: String) {
    harness.set_env("NCM_CONTAINER_MTU", &mtu);
}

#[when("the CLI sets the container MTU to \"{mtu}\"")]
fn when_cli_override(harness: &Harness, mtu: String) {
    harness.push_cli_arg("--container-mtu");
    harness.push_cli_arg(OsString::from(&mtu));
}

#[when("the configuration loads without overrides")]
fn when_load_without_overrides(harness: &Harness) {
    harness.load();
}

#[then("loading the configuration resolves the container MTU to \"{mtu}\"")]
fn then_resolved_mtu(harness: &Harness, mtu: String) {
    let expected: u32 = match mtu.parse() {
        Ok(value) => value,
        Err(error) => panic!("invalid expected MTU '{mtu}': {error}"),
    };
    assert_eq!(harness.config().container_mtu(), expected);
}

#[then("loading the configuration applies the built-in defaults")]
fn then_defaults_applied(harness: &Harness) {
    let config = harness.config();

    assert_eq!(config.container_mtu(), DEFAULT_CONTAINER_MTU);
    assert_eq!(config.log_filter(), default_log_filter());
    assert_eq!(config.log_format(), default_log_format());
    assert!(!config.persist());
}

#[scenario(path = "tests/features/configuration_precedence.feature")]
fn configuration_precedence(#[from(harness)] harness: Harness) {
    let _ = harness;
}
