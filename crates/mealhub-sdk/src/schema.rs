//! Stored column conventions.
//!
//! Rows in the keyed store were written under two naming conventions. The
//! current one (camelCase, written by this crate) and a legacy one
//! (PascalCase, read only). A row may carry either, or a mix of both when a
//! legacy row was later merged into under the current names.
//!
//! Stored rows are decoded into [`MealRow`] / [`RestaurantRow`] before
//! normalization so that nothing downstream probes column names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use mealhub_store::{Fields, StoredEntity};
use mealhub_types::{RecordKey, RecordKind};

/// Meal columns under the current convention.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealColumns {
    #[serde(rename = "restaurantRowKey", default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub restaurant: Option<String>,
    #[serde(rename = "dishName", default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::minutes", skip_serializing_if = "Option::is_none")]
    pub prep_minutes: Option<u32>,
    #[serde(default, deserialize_with = "lenient::amount", skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub image_blob_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

/// Meal columns under the legacy convention.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LegacyMealColumns {
    #[serde(default, deserialize_with = "lenient::text")]
    pub restaurant: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient::minutes")]
    pub prep_minutes: Option<u32>,
    #[serde(default, deserialize_with = "lenient::amount")]
    pub price: Option<f64>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub image_blob_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub image_url: Option<String>,
}

/// Restaurant columns under the current convention.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantColumns {
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub restaurant_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub logo_blob_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text", skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

/// Restaurant columns under the legacy convention.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LegacyRestaurantColumns {
    #[serde(default, deserialize_with = "lenient::text")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub image_blob_name: Option<String>,
    #[serde(default, deserialize_with = "lenient::text")]
    pub image_url: Option<String>,
}

impl MealColumns {
    fn is_populated(&self) -> bool {
        *self != Self::default()
    }

    /// Columns to send to the store.
    pub fn to_fields(&self) -> Fields {
        to_fields(self)
    }
}

impl LegacyMealColumns {
    fn is_populated(&self) -> bool {
        *self != Self::default()
    }
}

impl RestaurantColumns {
    fn is_populated(&self) -> bool {
        *self != Self::default()
    }

    /// Columns to send to the store.
    pub fn to_fields(&self) -> Fields {
        to_fields(self)
    }
}

impl LegacyRestaurantColumns {
    fn is_populated(&self) -> bool {
        *self != Self::default()
    }
}

/// A stored meal row, tagged by the conventions its columns follow.
#[derive(Clone, Debug, PartialEq)]
pub enum MealRow {
    Current(MealColumns),
    Legacy(LegacyMealColumns),
    Mixed {
        current: MealColumns,
        legacy: LegacyMealColumns,
    },
}

impl MealRow {
    pub fn decode(fields: &Fields) -> Self {
        let current: MealColumns = decode_columns(fields);
        let legacy: LegacyMealColumns = decode_columns(fields);
        match (current.is_populated(), legacy.is_populated()) {
            (true, true) => Self::Mixed { current, legacy },
            (false, true) => Self::Legacy(legacy),
            _ => Self::Current(current),
        }
    }

    /// The current and legacy column sets, in that priority order.
    pub fn layers(&self) -> (Option<&MealColumns>, Option<&LegacyMealColumns>) {
        match self {
            Self::Current(c) => (Some(c), None),
            Self::Legacy(l) => (None, Some(l)),
            Self::Mixed { current, legacy } => (Some(current), Some(legacy)),
        }
    }
}

/// A stored restaurant row, tagged by the conventions its columns follow.
#[derive(Clone, Debug, PartialEq)]
pub enum RestaurantRow {
    Current(RestaurantColumns),
    Legacy(LegacyRestaurantColumns),
    Mixed {
        current: RestaurantColumns,
        legacy: LegacyRestaurantColumns,
    },
}

impl RestaurantRow {
    pub fn decode(fields: &Fields) -> Self {
        let current: RestaurantColumns = decode_columns(fields);
        let legacy: LegacyRestaurantColumns = decode_columns(fields);
        match (current.is_populated(), legacy.is_populated()) {
            (true, true) => Self::Mixed { current, legacy },
            (false, true) => Self::Legacy(legacy),
            _ => Self::Current(current),
        }
    }

    pub fn layers(&self) -> (Option<&RestaurantColumns>, Option<&LegacyRestaurantColumns>) {
        match self {
            Self::Current(c) => (Some(c), None),
            Self::Legacy(l) => (None, Some(l)),
            Self::Mixed { current, legacy } => (Some(current), Some(legacy)),
        }
    }
}

/// A stored record of known kind, decoded and ready for projection.
#[derive(Clone, Debug, PartialEq)]
pub enum RawRecord {
    Meal {
        key: RecordKey,
        timestamp: Option<DateTime<Utc>>,
        row: MealRow,
    },
    Restaurant {
        key: RecordKey,
        timestamp: Option<DateTime<Utc>>,
        row: RestaurantRow,
    },
}

impl RawRecord {
    pub fn decode(kind: RecordKind, entity: &StoredEntity) -> Self {
        let key = entity.key.clone();
        let timestamp = Some(entity.timestamp);
        match kind {
            RecordKind::Meal => Self::Meal {
                key,
                timestamp,
                row: MealRow::decode(&entity.fields),
            },
            RecordKind::Restaurant => Self::Restaurant {
                key,
                timestamp,
                row: RestaurantRow::decode(&entity.fields),
            },
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Meal { .. } => RecordKind::Meal,
            Self::Restaurant { .. } => RecordKind::Restaurant,
        }
    }
}

fn decode_columns<T>(fields: &Fields) -> T
where
    T: for<'de> Deserialize<'de> + Default,
{
    let object: serde_json::Map<String, Value> =
        fields.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    serde_json::from_value(Value::Object(object)).unwrap_or_else(|err| {
        warn!(error = %err, "undecodable stored row, using empty columns");
        T::default()
    })
}

fn to_fields<T: Serialize>(columns: &T) -> Fields {
    match serde_json::to_value(columns) {
        Ok(Value::Object(map)) => map.into_iter().collect(),
        _ => Fields::new(),
    }
}

/// Deserializers that never fail on content: a value of the wrong shape
/// reads as absent.
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub(super) fn text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(match Option::<Value>::deserialize(d)? {
            Some(Value::String(s)) => Some(s),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            _ => None,
        })
    }

    pub(super) fn minutes<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
        Ok(number(Option::<Value>::deserialize(d)?)
            .filter(|n| *n >= 0.0 && *n <= f64::from(u32::MAX))
            .map(|n| n.trunc() as u32))
    }

    pub(super) fn amount<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
        Ok(number(Option::<Value>::deserialize(d)?).filter(|n| *n >= 0.0))
    }

    fn number(value: Option<Value>) -> Option<f64> {
        match value? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .filter(|n| n.is_finite())
    }
}
