//! Warehouse location parsing and deterministic path joins.
//!
//! Locations are URI-like strings (`scheme://authority/path`). The catalog only
//! needs three things from them: a well-formedness check before a namespace is
//! persisted, a deterministic way to derive child locations, and a directory
//! prefix for listing that never matches a sibling with a longer name.

use std::fmt;

use crate::error::{Error, Result};

/// A parsed warehouse location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    scheme: String,
    path: String,
}

impl Location {
    /// Returns the URI scheme (lowercased).
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Returns everything after `scheme://`, without a trailing slash.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns a child location.
    #[must_use]
    pub fn child(&self, name: &str) -> Self {
        Self {
            scheme: self.scheme.clone(),
            path: format!("{}/{}", self.path, name.trim_matches('/')),
        }
    }

    /// Returns the listing prefix for this location (always ends with `/`).
    #[must_use]
    pub fn directory_prefix(&self) -> String {
        format!("{self}/")
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.scheme, self.path)
    }
}

/// Parses a location string.
///
/// # Errors
///
/// Returns [`Error::InvalidLocation`] when the scheme is missing or malformed,
/// or when nothing follows `scheme://`.
pub fn parse_location(raw: &str) -> Result<Location> {
    let trimmed = raw.trim();
    let Some((scheme, rest)) = trimmed.split_once("://") else {
        return Err(Error::invalid_location(raw, "missing scheme"));
    };

    let mut chars = scheme.chars();
    let valid_scheme = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    if !valid_scheme {
        return Err(Error::invalid_location(raw, "malformed scheme"));
    }

    let path = rest.trim_end_matches('/');
    if path.is_empty() {
        return Err(Error::invalid_location(raw, "empty path"));
    }

    Ok(Location {
        scheme: scheme.to_ascii_lowercase(),
        path: path.to_string(),
    })
}

/// Joins a child segment onto a base location with exactly one separator.
#[must_use]
pub fn join_location(base: &str, child: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        child.trim_start_matches('/')
    )
}

/// Returns the listing prefix of a raw location string (always ends with `/`).
#[must_use]
pub fn directory_prefix(location: &str) -> String {
    format!("{}/", location.trim_end_matches('/'))
}
