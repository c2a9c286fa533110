//! Source metadata types usable across crates.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Typed key identifying a source adapter in priority configuration and audit fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceKey(Cow<'static, str>);

impl SourceKey {
    /// Construct a new typed source key from a static name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    /// Construct a key from a runtime string (e.g. loaded from configuration).
    #[must_use]
    pub fn owned(name: impl Into<String>) -> Self {
        Self(Cow::Owned(name.into()))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&'static str> for SourceKey {
    fn from(name: &'static str) -> Self {
        Self::new(name)
    }
}
