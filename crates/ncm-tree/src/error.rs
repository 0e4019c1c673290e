//! Error types raised while populating a tree.

use std::net::AddrParseError;
use std::num::ParseIntError;
use std::str::ParseBoolError;

use thiserror::Error;

use crate::path::PathSegment;

/// Failures raised by [`put_node`](crate::put_node) and
/// [`parse_path`](crate::parse_path).
///
/// A failed put leaves earlier writes of the same call in place; callers
/// rebuild the whole change-set rather than retrying a single event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    /// A value could not be coerced into the field it names.
    #[error("invalid value {value:?} for {field}: {message}")]
    Parse {
        /// Field being written.
        field: String,
        /// Raw value received from the datastore.
        value: String,
        /// Parser diagnostic.
        message: String,
    },

    /// A keyed list segment lacks one of its key attributes.
    #[error("{list}@{key} not found in {segment}")]
    MissingKey {
        /// List the segment addresses.
        list: String,
        /// Missing key attribute.
        key: String,
        /// Rendered segment, for diagnostics.
        segment: String,
    },

    /// The path string is not in `/name[key='value']/...` form.
    #[error("malformed path {path:?}: {reason}")]
    MalformedPath {
        /// Path as received.
        path: String,
        /// What made it unreadable.
        reason: String,
    },
}

impl TreeError {
    /// Builds a [`TreeError::Parse`] for `field`.
    #[must_use]
    pub fn parse(field: &str, value: &str, error: &ValueError) -> Self {
        Self::Parse {
            field: field.to_owned(),
            value: value.to_owned(),
            message: error.message().to_owned(),
        }
    }

    /// Builds a [`TreeError::MissingKey`] for `segment`.
    #[must_use]
    pub fn missing_key(list: &str, key: &str, segment: &PathSegment) -> Self {
        Self::MissingKey {
            list: list.to_owned(),
            key: key.to_owned(),
            segment: segment.to_string(),
        }
    }

    pub(crate) fn malformed(path: &str, reason: impl Into<String>) -> Self {
        Self::MalformedPath {
            path: path.to_owned(),
            reason: reason.into(),
        }
    }
}

/// Diagnostic returned by leaf setters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValueError {
    message: String,
}

impl ValueError {
    /// Wraps a free-form diagnostic.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The diagnostic text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<AddrParseError> for ValueError {
    fn from(error: AddrParseError) -> Self {
        Self::new(error.to_string())
    }
}

impl From<ParseIntError> for ValueError {
    fn from(error: ParseIntError) -> Self {
        Self::new(error.to_string())
    }
}

impl From<ParseBoolError> for ValueError {
    fn from(error: ParseBoolError) -> Self {
        Self::new(error.to_string())
    }
}

impl From<strum::ParseError> for ValueError {
    fn from(error: strum::ParseError) -> Self {
        Self::new(error.to_string())
    }
}
