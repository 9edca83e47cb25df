#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Visibility class of a stored file.
///
/// When the `sea-orm` feature is enabled, this enum can be used directly in SeaORM entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::N(10))")
)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    /// Readable by anyone, including anonymous callers.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "public"))]
    Public,
    /// Readable by any identified caller.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "internal"))]
    Internal,
    /// Readable by the owner and the root identity only.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "private"))]
    Private,
}

impl AccessLevel {
    pub const ALL: &'static [AccessLevel] = &[Self::Public, Self::Internal, Self::Private];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Internal => "internal",
            Self::Private => "private",
        }
    }
}

impl fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error when parsing an invalid access level string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAccessLevelError {
    invalid: String,
}

impl fmt::Display for ParseAccessLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid access level '{}'. Valid values: {}",
            self.invalid,
            AccessLevel::ALL
                .iter()
                .map(|l| l.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

impl std::error::Error for ParseAccessLevelError {}

/// The single parser for access levels arriving from outside the process.
/// Matching is exact: `"Public"` and `" public"` are rejected.
impl FromStr for AccessLevel {
    type Err = ParseAccessLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(Self::Public),
            "internal" => Ok(Self::Internal),
            "private" => Ok(Self::Private),
            _ => Err(ParseAccessLevelError {
                invalid: s.to_string(),
            }),
        }
    }
}
