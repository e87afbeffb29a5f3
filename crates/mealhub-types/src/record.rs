//! Normalized record shapes returned to callers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::image::{Container, ImageRef};
use crate::key::RecordKey;

/// Which table a record lives in, and therefore which image container its
/// images resolve against.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Meal,
    Restaurant,
}

impl RecordKind {
    /// The container holding images for records of this kind.
    pub fn image_container(&self) -> Container {
        match self {
            Self::Meal => Container::MealImages,
            Self::Restaurant => Container::RestaurantLogos,
        }
    }
}

/// One dish offered in one area.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MealRecord {
    #[serde(flatten)]
    pub key: RecordKey,
    /// Row key of a restaurant in the same area. Not enforced.
    pub restaurant: String,
    pub name: String,
    pub description: String,
    pub prep_minutes: u32,
    pub price: f64,
    /// Object path of the attached image, if any.
    pub image_blob_name: Option<String>,
    /// Retrievable address of the attached image, if any.
    pub image_url: Option<String>,
    /// Store-assigned time of the last write.
    pub timestamp: Option<DateTime<Utc>>,
}

impl MealRecord {
    pub fn image(&self) -> Option<ImageRef> {
        self.image_blob_name
            .as_ref()
            .map(|path| ImageRef::new(Container::MealImages, path.clone()))
    }
}

/// One restaurant in one area.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RestaurantRecord {
    #[serde(flatten)]
    pub key: RecordKey,
    pub name: String,
    /// Object path of the logo, if any.
    pub image_blob_name: Option<String>,
    #[serde(rename = "logoUrl")]
    pub logo_url: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

impl RestaurantRecord {
    pub fn logo(&self) -> Option<ImageRef> {
        self.image_blob_name
            .as_ref()
            .map(|path| ImageRef::new(Container::RestaurantLogos, path.clone()))
    }
}

/// A stored row after normalization.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NormalizedRecord {
    Meal(MealRecord),
    Restaurant(RestaurantRecord),
}

impl NormalizedRecord {
    pub fn key(&self) -> &RecordKey {
        match self {
            Self::Meal(m) => &m.key,
            Self::Restaurant(r) => &r.key,
        }
    }

    pub fn kind(&self) -> RecordKind {
        match self {
            Self::Meal(_) => RecordKind::Meal,
            Self::Restaurant(_) => RecordKind::Restaurant,
        }
    }

    pub fn into_meal(self) -> Option<MealRecord> {
        match self {
            Self::Meal(m) => Some(m),
            Self::Restaurant(_) => None,
        }
    }

    pub fn into_restaurant(self) -> Option<RestaurantRecord> {
        match self {
            Self::Restaurant(r) => Some(r),
            Self::Meal(_) => None,
        }
    }
}
