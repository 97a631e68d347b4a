//! Item identifiers.
//!
//! An [`ItemId`] is a non-negative integer no larger than `i64::MAX`, so it
//! round-trips through SQLite `INTEGER` columns and embeds verbatim in a URL
//! path segment (`375x500.{id}.jpg`).
//!
//! On the wire it serializes as a JSON number. Deserialization also accepts a
//! string of ASCII digits, because the browser client scrapes the id out of an
//! image URL with a regex and posts the captured string.

use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Largest representable identifier (`i64::MAX`).
pub const MAX_ITEM_ID: u64 = 0x7fff_ffff_ffff_ffff;

/// Stable identifier of a votable item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    /// Build an id from a small integer. Always in range.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw as u64)
    }

    /// The raw integer value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Reasons a textual or numeric id is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseItemIdError {
    #[error("Image ID is required")]
    Empty,

    #[error("image id must contain only digits, got {0:?}")]
    NotDigits(String),

    #[error("image id {0} is out of range")]
    OutOfRange(String),
}

impl TryFrom<u64> for ItemId {
    type Error = ParseItemIdError;

    fn try_from(raw: u64) -> Result<Self, Self::Error> {
        if raw > MAX_ITEM_ID {
            return Err(ParseItemIdError::OutOfRange(raw.to_string()));
        }
        Ok(Self(raw))
    }
}

impl TryFrom<i64> for ItemId {
    type Error = ParseItemIdError;

    fn try_from(raw: i64) -> Result<Self, Self::Error> {
        u64::try_from(raw)
            .map(Self)
            .map_err(|_| ParseItemIdError::OutOfRange(raw.to_string()))
    }
}

impl FromStr for ItemId {
    type Err = ParseItemIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(ParseItemIdError::Empty);
        }
        if !trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParseItemIdError::NotDigits(trimmed.to_string()));
        }
        let raw: u64 = trimmed
            .parse()
            .map_err(|_| ParseItemIdError::OutOfRange(trimmed.to_string()))?;
        Self::try_from(raw)
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ItemIdVisitor;

        impl Visitor<'_> for ItemIdVisitor {
            type Value = ItemId;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative integer or a string of digits")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<ItemId, E> {
                ItemId::try_from(v).map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<ItemId, E> {
                ItemId::try_from(v).map_err(E::custom)
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<ItemId, E> {
                v.parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(ItemIdVisitor)
    }
}

impl ToSql for ItemId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        // Construction keeps the value within i64 range.
        let raw = i64::try_from(self.0)
            .map_err(|err| rusqlite::Error::ToSqlConversionFailure(Box::new(err)))?;
        Ok(ToSqlOutput::from(raw))
    }
}

impl FromSql for ItemId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = i64::column_result(value)?;
        Self::try_from(raw).map_err(|err| FromSqlError::Other(Box::new(err)))
    }
}
