//! Datastore path parsing.

use std::collections::BTreeMap;
use std::fmt;
use std::iter::Peekable;
use std::str::Chars;

use crate::error::TreeError;

/// One step of a configuration path: a node name plus list-key attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSegment {
    name: String,
    attrs: BTreeMap<String, String>,
}

impl PathSegment {
    /// Creates a segment without attributes.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: BTreeMap::new(),
        }
    }

    /// Adds a key attribute.
    #[must_use]
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Node name, without namespace prefix.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Value of key attribute `key`, if present.
    #[must_use]
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs.get(key).map(String::as_str)
    }

    /// All key attributes.
    #[must_use]
    pub const fn attrs(&self) -> &BTreeMap<String, String> {
        &self.attrs
    }

    /// Value of key attribute `key`, or a [`TreeError::MissingKey`] naming
    /// `list`.
    pub fn require_attr(&self, list: &str, key: &str) -> Result<&str, TreeError> {
        self.attr(key)
            .ok_or_else(|| TreeError::missing_key(list, key, self))
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        for (key, value) in &self.attrs {
            write!(f, "[{key}='{value}']")?;
        }
        Ok(())
    }
}

/// Splits a datastore path such as
/// `/ni:network-instances/network-instance[name='PE1']/config/router-id`
/// into segments.
///
/// Namespace prefixes are dropped from names and attribute keys. Attribute
/// values are single- or double-quoted and may contain `/` or `]`.
pub fn parse_path(path: &str) -> Result<Vec<PathSegment>, TreeError> {
    let body = path.strip_prefix('/').unwrap_or(path);
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let mut chars = body.chars().peekable();
    let mut segments = Vec::new();
    loop {
        let name = take_name(&mut chars);
        if name.is_empty() {
            return Err(TreeError::malformed(path, "empty segment"));
        }
        let mut segment = PathSegment::new(local_name(&name));

        while chars.peek() == Some(&'[') {
            chars.next();
            let (key, value) = take_predicate(path, &mut chars)?;
            segment.attrs.insert(local_name(&key).to_owned(), value);
        }
        segments.push(segment);

        match chars.next() {
            None => return Ok(segments),
            Some('/') => {}
            Some(other) => {
                return Err(TreeError::malformed(
                    path,
                    format!("unexpected {other:?} after segment"),
                ));
            }
        }
    }
}

fn local_name(name: &str) -> &str {
    name.rsplit_once(':').map_or(name, |(_, local)| local)
}

fn take_name(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut name = String::new();
    while let Some(&c) = chars.peek() {
        if c == '/' || c == '[' {
            break;
        }
        name.push(c);
        chars.next();
    }
    name
}

fn take_predicate(
    path: &str,
    chars: &mut Peekable<Chars<'_>>,
) -> Result<(String, String), TreeError> {
    let mut key = String::new();
    loop {
        match chars.next() {
            Some('=') => break,
            Some(']') | None => {
                return Err(TreeError::malformed(path, "predicate without '='"));
            }
            Some(c) => key.push(c),
        }
    }
    let key = key.trim().to_owned();
    if key.is_empty() {
        return Err(TreeError::malformed(path, "predicate without key"));
    }

    skip_spaces(chars);
    let quote = match chars.next() {
        Some(q @ ('\'' | '"')) => q,
        _ => return Err(TreeError::malformed(path, "unquoted predicate value")),
    };

    let mut value = String::new();
    loop {
        match chars.next() {
            Some(c) if c == quote => break,
            Some(c) => value.push(c),
            None => return Err(TreeError::malformed(path, "unterminated quote")),
        }
    }

    skip_spaces(chars);
    match chars.next() {
        Some(']') => Ok((key, value)),
        _ => Err(TreeError::malformed(path, "unterminated predicate")),
    }
}

fn skip_spaces(chars: &mut Peekable<Chars<'_>>) {
    while chars.peek().is_some_and(|c| c.is_whitespace()) {
        chars.next();
    }
}
