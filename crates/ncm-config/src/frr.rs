use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How the routing daemon is recovered when a vty change has to be undone.
///
/// The vty backup step has no native rollback; restarting or reloading the
/// daemon re-reads the saved configuration instead.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum FrrRestartMode {
    /// `systemctl restart frr` inside the instance.
    Restart,
    /// `systemctl reload frr` inside the instance.
    Reload,
    /// Leave the daemon untouched.
    #[default]
    None,
}

impl FrrRestartMode {
    /// The `systemctl` verb matching this mode, if any.
    #[must_use]
    pub const fn systemctl_verb(self) -> Option<&'static str> {
        match self {
            Self::Restart => Some("restart"),
            Self::Reload => Some("reload"),
            Self::None => None,
        }
    }
}

/// Errors encountered while parsing a [`FrrRestartMode`] from text.
pub type FrrRestartModeParseError = strum::ParseError;
