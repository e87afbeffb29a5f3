//! Storage contracts for MealHub.
//!
//! MealHub talks to two external collaborators: a schemaless keyed store
//! (records addressed by partition key and row key) and a binary object
//! store (images addressed by container and path). This crate defines both
//! contracts and ships in-memory backends for tests and embedding.
//!
//! # Keyed store primitives
//!
//! The keyed store has no native upsert. It offers:
//!
//! - `create`: insert, failing with [`StoreError::AlreadyExists`] if the key
//!   is taken
//! - `merge`: field-level update, failing with [`StoreError::NotFound`] if
//!   the key is absent or [`StoreError::PreconditionFailed`] if the etag does
//!   not match
//! - `query`: every record in one partition
//!
//! Both write primitives are atomic per key. Nothing is ordered across keys.
//!
//! # Backends
//!
//! - [`InMemoryKeyedStore`]: `BTreeMap`-backed keyed store
//! - [`InMemoryObjectStore`]: `HashMap`-backed object store

pub mod entity;
pub mod error;
pub mod memory;
pub mod traits;
mod url;

pub use entity::{Fields, Precondition, StoredEntity};
pub use error::{StoreError, StoreResult};
pub use memory::{InMemoryKeyedStore, InMemoryObjectStore, StoredObject};
pub use traits::{KeyedStore, ObjectStore};
pub use url::encode_component;
