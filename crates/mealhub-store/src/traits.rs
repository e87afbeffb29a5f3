//! The [`KeyedStore`] and [`ObjectStore`] contracts.
//!
//! Any backend (in-memory, REST client, emulator) implements these to serve
//! MealHub. Every call carries the caller's [`Credential`]; backends attach
//! it to the request and never inspect or refresh it.

use async_trait::async_trait;
use bytes::Bytes;

use mealhub_types::{Credential, RecordKey};

use crate::entity::{Fields, Precondition, StoredEntity};
use crate::error::StoreResult;

/// Schemaless two-level keyed record store.
///
/// Implementations must make `create` and `merge` atomic per key: of two
/// concurrent `create` calls for the same key exactly one succeeds and the
/// other fails with [`StoreError::AlreadyExists`](crate::StoreError::AlreadyExists).
#[async_trait]
pub trait KeyedStore: Send + Sync {
    /// Insert a new record. Fails with `AlreadyExists` if the key is taken.
    ///
    /// Returns the record as stored.
    async fn create(
        &self,
        table: &str,
        key: &RecordKey,
        fields: &Fields,
        credential: &Credential,
    ) -> StoreResult<StoredEntity>;

    /// Merge `fields` into an existing record.
    ///
    /// Columns present in `fields` replace stored values; stored columns
    /// absent from `fields` are left untouched. Fails with `NotFound` if the
    /// key is absent and `PreconditionFailed` if `precondition` does not
    /// match the stored etag.
    ///
    /// Returns the record as stored after the merge.
    async fn merge(
        &self,
        table: &str,
        key: &RecordKey,
        fields: &Fields,
        precondition: &Precondition,
        credential: &Credential,
    ) -> StoreResult<StoredEntity>;

    /// Every record in one partition, materialized in full.
    async fn query(
        &self,
        table: &str,
        partition_key: &str,
        credential: &Credential,
    ) -> StoreResult<Vec<StoredEntity>>;
}

/// Binary object store holding uploaded images.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store `data` at `path` inside `container`, replacing any object
    /// already there.
    async fn put(
        &self,
        container: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
        credential: &Credential,
    ) -> StoreResult<()>;

    /// The retrievable address of the object at `path`.
    ///
    /// Pure string construction; no request is made.
    fn object_url(&self, container: &str, path: &str, credential: &Credential) -> String;
}
