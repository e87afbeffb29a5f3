//! Insert-then-merge upsert.
//!
//! The keyed store offers `create` (fails if the key exists) and `merge`
//! (fails if the key is absent or the etag mismatches), but no upsert. The
//! coordinator combines them:
//!
//! 1. `create`. Success means the record is new: [`Outcome::Created`].
//! 2. If and only if `create` reported `AlreadyExists`, `merge` the same
//!    fields. Success is [`Outcome::Updated`]. Stored columns the write does
//!    not mention keep their values; the store's merge does that, and the
//!    coordinator never fills in missing columns.
//! 3. Every other failure is returned tagged with the step it came from.
//!    Nothing is retried.
//!
//! A record deleted between steps 1 and 2 makes `merge` fail with
//! `NotFound`; that surfaces as [`HubError::AlreadyExistsRace`].

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use mealhub_store::{Fields, KeyedStore, Precondition, StoreError, StoredEntity};
use mealhub_types::{Credential, RecordKey};

use crate::error::{HubError, HubResult, Operation};
use crate::timeout::bounded;

/// Which branch of the upsert protocol applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Created,
    Updated,
}

/// A successful upsert: which branch applied and the record as stored.
#[derive(Clone, Debug, PartialEq)]
pub struct Upserted {
    pub outcome: Outcome,
    pub entity: StoredEntity,
}

pub struct UpsertCoordinator {
    store: Arc<dyn KeyedStore>,
    credential: Credential,
    call_timeout: Duration,
}

impl UpsertCoordinator {
    pub fn new(store: Arc<dyn KeyedStore>, credential: Credential, call_timeout: Duration) -> Self {
        Self {
            store,
            credential,
            call_timeout,
        }
    }

    /// Upsert with an always-matching merge precondition.
    pub async fn upsert(&self, table: &str, key: &RecordKey, fields: &Fields) -> HubResult<Upserted> {
        self.upsert_with(table, key, fields, &Precondition::Any).await
    }

    /// Upsert, requiring `precondition` to hold if the record already exists.
    pub async fn upsert_with(
        &self,
        table: &str,
        key: &RecordKey,
        fields: &Fields,
        precondition: &Precondition,
    ) -> HubResult<Upserted> {
        let created = bounded(
            self.call_timeout,
            self.store.create(table, key, fields, &self.credential),
        )
        .await;

        match created {
            Ok(entity) => {
                debug!(table, %key, "upsert created record");
                Ok(Upserted {
                    outcome: Outcome::Created,
                    entity,
                })
            }
            Err(StoreError::AlreadyExists(_)) => {
                debug!(table, %key, if_match = precondition.header_value(), "record exists, merging");
                self.merge(table, key, fields, precondition).await
            }
            Err(err) => {
                warn!(table, %key, error = %err, "create failed");
                Err(HubError::from_store(Operation::Create, err))
            }
        }
    }

    async fn merge(
        &self,
        table: &str,
        key: &RecordKey,
        fields: &Fields,
        precondition: &Precondition,
    ) -> HubResult<Upserted> {
        let merged = bounded(
            self.call_timeout,
            self.store
                .merge(table, key, fields, precondition, &self.credential),
        )
        .await;

        match merged {
            Ok(entity) => {
                debug!(table, %key, "upsert merged record");
                Ok(Upserted {
                    outcome: Outcome::Updated,
                    entity,
                })
            }
            Err(source @ (StoreError::NotFound(_) | StoreError::PreconditionFailed { .. })) => {
                warn!(table, %key, error = %source, "record changed between create and merge");
                Err(HubError::AlreadyExistsRace {
                    op: Operation::Merge,
                    source,
                })
            }
            Err(err) => {
                warn!(table, %key, error = %err, "merge failed");
                Err(HubError::from_store(Operation::Merge, err))
            }
        }
    }
}
