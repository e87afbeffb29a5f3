//! Records as the keyed store sees them: a key plus schemaless fields.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use mealhub_types::RecordKey;

/// Data fields of a record, excluding its key and system columns.
pub type Fields = BTreeMap<String, Value>;

/// Column names reserved by the store.
pub const RESERVED_COLUMNS: [&str; 4] = ["PartitionKey", "RowKey", "Timestamp", "etag"];

/// A record as stored, including the system columns the store maintains.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StoredEntity {
    #[serde(flatten)]
    pub key: RecordKey,
    #[serde(flatten)]
    pub fields: Fields,
    /// Time of the last successful write.
    #[serde(rename = "Timestamp")]
    pub timestamp: DateTime<Utc>,
    /// Opaque version token, changed on every write.
    pub etag: String,
}

impl StoredEntity {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }
}

/// Condition a `merge` must satisfy before it applies.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Precondition {
    /// Always matches (`If-Match: *`).
    #[default]
    Any,
    /// Matches only the given etag.
    IfMatch(String),
}

impl Precondition {
    pub fn matches(&self, etag: &str) -> bool {
        match self {
            Self::Any => true,
            Self::IfMatch(expected) => expected == etag,
        }
    }

    /// The value this precondition takes in an `If-Match` header.
    pub fn header_value(&self) -> &str {
        match self {
            Self::Any => "*",
            Self::IfMatch(etag) => etag,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn any_matches_everything() {
        assert!(Precondition::Any.matches("W/\"1\""));
        assert_eq!(Precondition::Any.header_value(), "*");
    }

    #[test]
    fn if_match_is_exact() {
        let p = Precondition::IfMatch("W/\"2\"".into());
        assert!(p.matches("W/\"2\""));
        assert!(!p.matches("W/\"3\""));
    }

    #[test]
    fn serializes_as_flat_row() {
        let mut fields = Fields::new();
        fields.insert("dishName".into(), json!("Pho"));
        let entity = StoredEntity {
            key: RecordKey::from_parts("Uptown", "pho"),
            fields,
            timestamp: DateTime::<Utc>::UNIX_EPOCH,
            etag: "W/\"1\"".into(),
        };
        let row = serde_json::to_value(&entity).unwrap();
        assert_eq!(row["PartitionKey"], "Uptown");
        assert_eq!(row["RowKey"], "pho");
        assert_eq!(row["dishName"], "Pho");
        assert!(row.get("Timestamp").is_some());
    }
}
