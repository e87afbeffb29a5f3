//! Record projection.
//!
//! Turns decoded rows into the single output shape callers see. Each
//! attribute takes the first non-empty value among the current column, the
//! legacy column, and a zero/empty default. A row that names an image but
//! carries no resolved URL gets one from the object store, in the container
//! matching the record's kind.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use mealhub_store::ObjectStore;
use mealhub_types::{
    Credential, MealRecord, NormalizedRecord, RecordKey, RecordKind, RestaurantRecord,
};

use crate::config::ContainerNames;
use crate::schema::{MealRow, RawRecord, RestaurantRow};

pub struct RecordProjector {
    objects: Arc<dyn ObjectStore>,
    containers: ContainerNames,
    credential: Credential,
}

impl RecordProjector {
    pub fn new(objects: Arc<dyn ObjectStore>, containers: ContainerNames, credential: Credential) -> Self {
        Self {
            objects,
            containers,
            credential,
        }
    }

    /// Normalize one decoded row. The input is not modified.
    pub fn project(&self, raw: &RawRecord) -> NormalizedRecord {
        match raw {
            RawRecord::Meal { key, timestamp, row } => {
                NormalizedRecord::Meal(self.project_meal(key, *timestamp, row))
            }
            RawRecord::Restaurant { key, timestamp, row } => {
                NormalizedRecord::Restaurant(self.project_restaurant(key, *timestamp, row))
            }
        }
    }

    pub fn project_meal(
        &self,
        key: &RecordKey,
        timestamp: Option<DateTime<Utc>>,
        row: &MealRow,
    ) -> MealRecord {
        let mut meal = project_meal_columns(key, timestamp, row);
        if meal.image_url.is_none() {
            meal.image_url = meal
                .image_blob_name
                .as_deref()
                .map(|path| self.resolve(RecordKind::Meal, path));
        }
        meal
    }

    pub fn project_restaurant(
        &self,
        key: &RecordKey,
        timestamp: Option<DateTime<Utc>>,
        row: &RestaurantRow,
    ) -> RestaurantRecord {
        let mut restaurant = project_restaurant_columns(key, timestamp, row);
        if restaurant.logo_url.is_none() {
            restaurant.logo_url = restaurant
                .image_blob_name
                .as_deref()
                .map(|path| self.resolve(RecordKind::Restaurant, path));
        }
        restaurant
    }

    fn resolve(&self, kind: RecordKind, path: &str) -> String {
        let container = self.containers.name(kind.image_container());
        self.objects.object_url(container, path, &self.credential)
    }
}

fn first_text(candidates: [Option<&String>; 2]) -> Option<String> {
    candidates
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
        .cloned()
}

fn first<T: Copy>(candidates: [Option<T>; 2]) -> Option<T> {
    candidates.into_iter().flatten().next()
}

/// An image name and its URL are read from the same layer. A current-layer
/// name never pairs with a legacy URL; its URL is left unset when the current
/// layer has none, so it resolves against the new name.
fn image_columns(
    current: (Option<&String>, Option<&String>),
    legacy: (Option<&String>, Option<&String>),
) -> (Option<String>, Option<String>) {
    match first_text([current.0, None]) {
        Some(name) => (Some(name), first_text([current.1, None])),
        None => (
            first_text([legacy.0, None]),
            first_text([current.1, legacy.1]),
        ),
    }
}

fn project_meal_columns(key: &RecordKey, timestamp: Option<DateTime<Utc>>, row: &MealRow) -> MealRecord {
    let (current, legacy) = row.layers();
    let (image_blob_name, image_url) = image_columns(
        (
            current.and_then(|c| c.image_blob_name.as_ref()),
            current.and_then(|c| c.image_url.as_ref()),
        ),
        (
            legacy.and_then(|l| l.image_blob_name.as_ref()),
            legacy.and_then(|l| l.image_url.as_ref()),
        ),
    );
    MealRecord {
        key: key.clone(),
        restaurant: first_text([
            current.and_then(|c| c.restaurant.as_ref()),
            legacy.and_then(|l| l.restaurant.as_ref()),
        ])
        .unwrap_or_default(),
        name: first_text([
            current.and_then(|c| c.name.as_ref()),
            legacy.and_then(|l| l.name.as_ref()),
        ])
        .unwrap_or_default(),
        description: first_text([
            current.and_then(|c| c.description.as_ref()),
            legacy.and_then(|l| l.description.as_ref()),
        ])
        .unwrap_or_default(),
        prep_minutes: first([
            current.and_then(|c| c.prep_minutes),
            legacy.and_then(|l| l.prep_minutes),
        ])
        .unwrap_or(0),
        price: first([current.and_then(|c| c.price), legacy.and_then(|l| l.price)]).unwrap_or(0.0),
        image_blob_name,
        image_url,
        timestamp,
    }
}

fn project_restaurant_columns(
    key: &RecordKey,
    timestamp: Option<DateTime<Utc>>,
    row: &RestaurantRow,
) -> RestaurantRecord {
    let (current, legacy) = row.layers();
    let (image_blob_name, logo_url) = image_columns(
        (
            current.and_then(|c| c.logo_blob_name.as_ref()),
            current.and_then(|c| c.logo_url.as_ref()),
        ),
        (
            legacy.and_then(|l| l.image_blob_name.as_ref()),
            legacy.and_then(|l| l.image_url.as_ref()),
        ),
    );
    RestaurantRecord {
        key: key.clone(),
        name: first_text([
            current.and_then(|c| c.restaurant_name.as_ref()),
            legacy.and_then(|l| l.name.as_ref()),
        ])
        .unwrap_or_default(),
        image_blob_name,
        logo_url,
        timestamp,
    }
}
