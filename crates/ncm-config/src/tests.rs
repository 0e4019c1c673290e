use rstest::rstest;

use super::*;

#[test]
fn default_tool_paths_resolve_under_cli_path() {
    let config = Config::default();

    assert_eq!(config.vty_path(), Utf8PathBuf::from("/usr/bin/ncm-vty"));
    assert_eq!(config.sys_path(), Utf8PathBuf::from("/usr/bin/ncm-sys"));
    assert_eq!(config.lxd_path(), Utf8PathBuf::from("/usr/bin/ncm-lxd"));
    assert_eq!(
        config.lxcinit_path(),
        Utf8PathBuf::from("/usr/bin/ncm-lxcinit")
    );
}

#[test]
fn custom_cli_path_moves_every_tool() {
    let config = Config {
        cli_path: Utf8PathBuf::from("/opt/ncm/bin"),
        ..Config::default()
    };

    assert_eq!(config.vty_path(), Utf8PathBuf::from("/opt/ncm/bin/ncm-vty"));
    assert_eq!(config.sys_path(), Utf8PathBuf::from("/opt/ncm/bin/ncm-sys"));
}

#[test]
fn defaults_match_documented_values() {
    let config = Config::default();

    assert_eq!(config.log_filter(), DEFAULT_LOG_FILTER);
    assert_eq!(config.log_format(), LogFormat::Json);
    assert_eq!(config.module(), DEFAULT_MODULE);
    assert_eq!(config.container_mtu(), 9000);
    assert_eq!(config.frr_auto_restart(), FrrRestartMode::None);
    assert!(!config.persist());
    assert!(!config.dry_run());
    assert!(config.replay().is_none());
}

#[rstest]
#[case("restart", FrrRestartMode::Restart, Some("restart"))]
#[case("RELOAD", FrrRestartMode::Reload, Some("reload"))]
#[case("none", FrrRestartMode::None, None)]
fn frr_restart_mode_parses_case_insensitively(
    #[case] text: &str,
    #[case] expected: FrrRestartMode,
    #[case] verb: Option<&str>,
) {
    let mode: FrrRestartMode = text.parse().expect("valid restart mode");
    assert_eq!(mode, expected);
    assert_eq!(mode.systemctl_verb(), verb);
}

#[rstest]
#[case("json", LogFormat::Json)]
#[case("Compact", LogFormat::Compact)]
fn log_format_parses(#[case] text: &str, #[case] expected: LogFormat) {
    let format: LogFormat = text.parse().expect("valid log format");
    assert_eq!(format, expected);
}

#[test]
fn unknown_restart_mode_is_rejected() {
    assert!("bounce".parse::<FrrRestartMode>().is_err());
}
