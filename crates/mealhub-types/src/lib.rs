//! Foundation types for MealHub.
//!
//! This crate holds the addressing rules every other MealHub crate builds on:
//! how free-form user text becomes a stable identifier, how records are
//! partitioned by area, and where uploaded images live.
//!
//! # Key Types
//!
//! - [`Slug`]: canonical, key-safe fragment derived from free text
//! - [`Area`]: verbatim (trimmed) partition component
//! - [`RecordKey`]: the two-level (partition, row) key of a stored record
//! - [`ImageRef`]: a (container, path) pair naming a stored image
//! - [`MealRecord`] / [`RestaurantRecord`]: normalized record shapes
//! - [`Credential`]: opaque access token attached to every store call

pub mod area;
pub mod credential;
pub mod error;
pub mod image;
pub mod key;
pub mod record;
pub mod slug;

pub use area::Area;
pub use credential::Credential;
pub use error::TypeError;
pub use image::{compose_image_address, Container, ImageRef, DEFAULT_AREA_FRAGMENT};
pub use key::{compose_key, compose_restaurant_key, RecordKey, RestaurantId};
pub use record::{MealRecord, NormalizedRecord, RecordKind, RestaurantRecord};
pub use slug::{slugify, Slug};
