//! Two-level record keys.
//!
//! Every stored record is addressed by a partition key (its [`Area`],
//! verbatim) and a row key (the slug of its name, or a caller-supplied
//! restaurant id). The same trimmed inputs always produce the same key.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::area::Area;
use crate::error::TypeError;
use crate::slug::Slug;

/// The (partition, row) key of a stored record.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordKey {
    #[serde(rename = "PartitionKey")]
    pub partition_key: String,
    #[serde(rename = "RowKey")]
    pub row_key: String,
}

impl RecordKey {
    /// Build a key from already-validated parts.
    pub fn new(area: &Area, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: area.as_str().to_string(),
            row_key: row_key.into(),
        }
    }

    /// Build a key from raw strings as read back from a store.
    pub fn from_parts(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.partition_key, self.row_key)
    }
}

/// Compose the key of a meal (or any name-addressed record).
///
/// Fails with [`TypeError::InvalidInput`] when `area` or `name` is blank, or
/// when `name` contains nothing a slug can keep.
///
/// ```
/// use mealhub_types::compose_key;
///
/// let key = compose_key("Downtown", "Grilled Cheese").unwrap();
/// assert_eq!(key.partition_key, "Downtown");
/// assert_eq!(key.row_key, "grilled-cheese");
/// ```
pub fn compose_key(area: &str, name: &str) -> Result<RecordKey, TypeError> {
    let area = Area::new(area)?;
    let name = name.trim();
    if name.is_empty() {
        return Err(TypeError::blank("name"));
    }
    let row = Slug::derive(name);
    if row.is_empty() {
        return Err(TypeError::InvalidInput {
            field: "name",
            reason: format!("{name:?} has no letters or digits to address"),
        });
    }
    Ok(RecordKey::new(&area, row.into_string()))
}

/// How a restaurant is identified within its area.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RestaurantId {
    /// Display name; the row key is its slug.
    Name(String),
    /// Caller-supplied identifier used verbatim (trimmed) as the row key.
    Opaque(String),
}

/// Compose the key of a restaurant record.
pub fn compose_restaurant_key(area: &str, id: &RestaurantId) -> Result<RecordKey, TypeError> {
    match id {
        RestaurantId::Name(name) => compose_key(area, name),
        RestaurantId::Opaque(raw) => {
            let area = Area::new(area)?;
            let raw = raw.trim();
            if raw.is_empty() {
                return Err(TypeError::blank("restaurant"));
            }
            Ok(RecordKey::new(&area, raw))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn meal_key_example() {
        let key = compose_key("Downtown", "Grilled Cheese").unwrap();
        assert_eq!(key, RecordKey::from_parts("Downtown", "grilled-cheese"));
    }

    #[test]
    fn inputs_are_trimmed() {
        let a = compose_key("  Downtown ", " Grilled Cheese\n").unwrap();
        let b = compose_key("Downtown", "Grilled Cheese").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn area_is_not_slugified() {
        let key = compose_key("Capitol Hill", "Pho").unwrap();
        assert_eq!(key.partition_key, "Capitol Hill");
    }

    #[test]
    fn blank_area_is_rejected() {
        let err = compose_key("  ", "Pho").unwrap_err();
        assert_eq!(err.field(), "area");
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = compose_key("Downtown", "").unwrap_err();
        assert_eq!(err.field(), "name");
    }

    #[test]
    fn unaddressable_name_is_rejected() {
        let err = compose_key("Downtown", "!!!").unwrap_err();
        assert_eq!(err.field(), "name");
    }

    #[test]
    fn restaurant_by_name_uses_slug() {
        let key = compose_restaurant_key("Downtown", &RestaurantId::Name("Ben's Chili Bowl".into()))
            .unwrap();
        assert_eq!(key.row_key, "ben-s-chili-bowl");
    }

    #[test]
    fn restaurant_by_opaque_id_is_verbatim() {
        let key = compose_restaurant_key("Downtown", &RestaurantId::Opaque(" R-0042 ".into()))
            .unwrap();
        assert_eq!(key.row_key, "R-0042");
    }

    #[test]
    fn restaurant_blank_opaque_id_is_rejected() {
        let err = compose_restaurant_key("Downtown", &RestaurantId::Opaque(" ".into())).unwrap_err();
        assert_eq!(err.field(), "restaurant");
    }

    #[test]
    fn serializes_with_store_column_names() {
        let key = RecordKey::from_parts("Downtown", "pho");
        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(json["PartitionKey"], "Downtown");
        assert_eq!(json["RowKey"], "pho");
    }

    proptest! {
        #[test]
        fn composition_is_stable(area in "[A-Za-z ]{0,12}[A-Za-z]", name in "[A-Za-z0-9 '!]{0,12}[a-z]") {
            let first = compose_key(&area, &name).unwrap();
            let second = compose_key(&area, &name).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first.partition_key, area.trim().to_string());
        }
    }
}
