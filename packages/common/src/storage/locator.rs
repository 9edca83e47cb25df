use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

const MAX_LEN: usize = 64;

/// Suffix appended to a locator to address its gzip mirror.
pub const GZIP_SUFFIX: &str = ".gz";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorError {
    #[error("locator is empty")]
    Empty,
    #[error("locator exceeds {MAX_LEN} characters")]
    TooLong,
    #[error("locator contains invalid character {0:?}")]
    InvalidCharacter(char),
}

/// Opaque, immutable reference to where a file's bytes live.
///
/// Locators are generated by the server and only ever contain
/// `[0-9A-Za-z_-]`, so they can be joined onto the content root without
/// escaping it. Values read back from the database are re-validated through
/// [`Locator::parse`] before they touch the filesystem.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Locator(String);

impl Locator {
    /// Generate a fresh, time-ordered locator.
    pub fn generate() -> Self {
        Self(uuid::Uuid::now_v7().simple().to_string())
    }

    pub fn parse(s: &str) -> Result<Self, LocatorError> {
        if s.is_empty() {
            return Err(LocatorError::Empty);
        }
        if s.len() > MAX_LEN {
            return Err(LocatorError::TooLong);
        }
        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(LocatorError::InvalidCharacter(c));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the compressed mirror.
    pub fn mirror_name(&self) -> String {
        format!("{}{GZIP_SUFFIX}", self.0)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Debug for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Locator({})", self.0)
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Locator {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Locator {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Locator {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
