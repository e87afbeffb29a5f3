//! MealHub core.
//!
//! Lets callers register and list meals and restaurants partitioned by area,
//! with an optional image attached to each record. Records live in a keyed
//! store without a native upsert; images live in a separate object store.
//!
//! A write flows: validate and compose the key, upload the image (if any),
//! then [`UpsertCoordinator`] runs insert-then-merge. A read flows: query the
//! partition, then [`RecordProjector`] normalizes each stored row.
//!
//! [`MealHub`] is the entry point.

pub mod config;
pub mod error;
pub mod hub;
pub mod projector;
pub mod schema;
pub mod upsert;
mod timeout;

pub use config::{ConfigError, ContainerNames, HubConfig};
pub use error::{ErrorKind, HubError, HubResult, Operation};
pub use hub::{ImageSource, ImageUpload, MealDraft, MealHub, Registered, RestaurantDraft};
pub use projector::RecordProjector;
pub use schema::{MealRow, RawRecord, RestaurantRow};
pub use upsert::{Outcome, UpsertCoordinator, Upserted};

// Re-export key types
pub use mealhub_store::{
    Fields, InMemoryKeyedStore, InMemoryObjectStore, KeyedStore, ObjectStore, Precondition,
    StoreError, StoredEntity,
};
pub use mealhub_types::{
    compose_image_address, compose_key, slugify, Area, Container, Credential, ImageRef,
    MealRecord, NormalizedRecord, RecordKey, RecordKind, RestaurantId, RestaurantRecord, Slug,
};
