/// Document identifiers
///
/// Every user, team and task is keyed by a 24-character lowercase hexadecimal
/// identifier (12 bytes). The first 4 bytes are the big-endian creation time in
/// seconds, the remaining 8 bytes are random. Identifiers therefore sort roughly
/// by creation time, which the in-memory store relies on for stable ordering.
///
/// # Example
///
/// ```
/// use teamtask_shared::models::object_id::ObjectId;
///
/// let id = ObjectId::new();
/// assert_eq!(id.as_str().len(), 24);
///
/// let parsed = ObjectId::parse("64b7f0c2a1b2c3d4e5f60718").unwrap();
/// assert_eq!(parsed.as_str(), "64b7f0c2a1b2c3d4e5f60718");
///
/// assert!(ObjectId::parse("not-an-id").is_err());
/// ```

use chrono::Utc;
use rand::RngCore;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of the hexadecimal representation
pub const OBJECT_ID_LEN: usize = 24;

/// Error returned when a string is not a valid identifier
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid identifier '{0}': expected 24 hexadecimal characters")]
pub struct InvalidObjectId(pub String);

/// 24-hex document identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct ObjectId(String);

impl ObjectId {
    /// Generates a fresh identifier
    pub fn new() -> Self {
        let mut bytes = [0u8; 12];
        let seconds = Utc::now().timestamp().clamp(0, u32::MAX as i64) as u32;
        bytes[..4].copy_from_slice(&seconds.to_be_bytes());
        rand::thread_rng().fill_bytes(&mut bytes[4..]);

        Self(hex::encode(bytes))
    }

    /// Parses an identifier, accepting upper or lower case hex
    ///
    /// The stored form is always lowercase.
    pub fn parse(value: &str) -> Result<Self, InvalidObjectId> {
        if is_object_id(value) {
            Ok(Self(value.to_ascii_lowercase()))
        } else {
            Err(InvalidObjectId(value.to_string()))
        }
    }

    /// Returns the hexadecimal form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for ObjectId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ObjectId {
    type Err = InvalidObjectId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        ObjectId::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// Checks the identifier shape without allocating
pub fn is_object_id(value: &str) -> bool {
    value.len() == OBJECT_ID_LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
}
