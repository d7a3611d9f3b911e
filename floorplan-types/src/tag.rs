//! String tags used as stable registry keys.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Stable class tag of an entity kind (e.g. `"PBox"`, `"Layer"`).
///
/// The tag is the discriminator written into every dumped record and the
/// key under which the kind's class is registered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassTag(String);

impl ClassTag {
    /// Creates a class tag. Empty or whitespace-only tags are rejected.
    pub fn new(tag: impl Into<String>) -> crate::Result<Self> {
        let tag = tag.into();
        if tag.trim().is_empty() {
            return Err(crate::Error::InvalidTag(tag));
        }
        Ok(Self(tag))
    }

    /// Creates a class tag from a static name known to be valid.
    #[must_use]
    pub fn from_static(tag: &'static str) -> Self {
        Self(tag.to_string())
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for ClassTag {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<str> for ClassTag {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ClassTag {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Tag naming a request kind in the request factory (e.g. `"SetField"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestType(String);

impl RequestType {
    /// Creates a request type tag. Empty or whitespace-only tags are rejected.
    pub fn new(tag: impl Into<String>) -> crate::Result<Self> {
        let tag = tag.into();
        if tag.trim().is_empty() {
            return Err(crate::Error::InvalidTag(tag));
        }
        Ok(Self(tag))
    }

    /// Creates a request type from a static name known to be valid.
    #[must_use]
    pub fn from_static(tag: &'static str) -> Self {
        Self(tag.to_string())
    }

    /// Returns the tag as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for RequestType {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl PartialEq<&str> for RequestType {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl PartialEq<str> for RequestType {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}
