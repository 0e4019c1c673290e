//! Daemon log output formats.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How `ncmd` renders its log lines on stderr.
///
/// Accepted spellings are case-insensitive, so `NCM_LOG_FORMAT=JSON` and
/// `--log-format compact` both resolve.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event, fields flattened.
    #[default]
    Json,
    /// Single-line text for terminals.
    Compact,
}

/// Error returned when a [`LogFormat`] name is not recognised.
pub type LogFormatParseError = strum::ParseError;
