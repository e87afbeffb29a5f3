//! In-memory store backends for tests and embedding.
//!
//! Both backends hold their data behind a `RwLock`, count the calls they
//! receive, and can be switched offline to simulate an unreachable store.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, AtomicUsize, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::Utc;
use tracing::debug;

use mealhub_types::{Credential, RecordKey};

use crate::entity::{Fields, Precondition, StoredEntity, RESERVED_COLUMNS};
use crate::error::{StoreError, StoreResult};
use crate::traits::{KeyedStore, ObjectStore};
use crate::url::encode_component;

/// Characters the keyed store refuses in partition and row keys.
const FORBIDDEN_KEY_CHARS: &[char] = &['/', '\\', '#', '?'];

/// Shared behaviour switches for the in-memory backends.
#[derive(Debug, Default)]
struct Switches {
    offline: AtomicBool,
    calls: AtomicUsize,
    latency_ms: AtomicU64,
}

impl Switches {
    async fn enter(&self) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("in-memory store is offline".into()));
        }
        Ok(())
    }
}

fn check_credential(required: &Option<Credential>, supplied: &Credential) -> StoreResult<()> {
    match required {
        Some(expected) if expected != supplied => Err(StoreError::Rejected {
            status: 403,
            message: "credential does not grant access".into(),
        }),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Keyed store
// ---------------------------------------------------------------------------

type Table = BTreeMap<RecordKey, StoredEntity>;

/// In-memory implementation of [`KeyedStore`].
///
/// Merge is a field-level union in which incoming columns win. Every write
/// stamps a fresh timestamp and etag.
pub struct InMemoryKeyedStore {
    tables: RwLock<HashMap<String, Table>>,
    version: AtomicU64,
    required_credential: Option<Credential>,
    switches: Switches,
}

impl InMemoryKeyedStore {
    /// Create an empty store that accepts any credential.
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(HashMap::new()),
            version: AtomicU64::new(0),
            required_credential: None,
            switches: Switches::default(),
        }
    }

    /// Create an empty store that rejects calls without `credential`.
    pub fn with_required_credential(credential: Credential) -> Self {
        Self {
            required_credential: Some(credential),
            ..Self::new()
        }
    }

    /// Number of calls received through the [`KeyedStore`] trait.
    pub fn calls(&self) -> usize {
        self.switches.calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.switches.offline.store(offline, Ordering::SeqCst);
    }

    /// Delay every subsequent call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        let ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
        self.switches.latency_ms.store(ms, Ordering::SeqCst);
    }

    /// Number of records in `table`.
    pub fn len(&self, table: &str) -> usize {
        self.tables
            .read()
            .expect("lock poisoned")
            .get(table)
            .map_or(0, BTreeMap::len)
    }

    /// Returns `true` if `table` holds no records.
    pub fn is_empty(&self, table: &str) -> bool {
        self.len(table) == 0
    }

    /// Read one record directly, bypassing call accounting.
    pub fn get(&self, table: &str, key: &RecordKey) -> Option<StoredEntity> {
        self.tables
            .read()
            .expect("lock poisoned")
            .get(table)
            .and_then(|t| t.get(key).cloned())
    }

    /// Remove one record directly. Returns `true` if it existed.
    pub fn remove(&self, table: &str, key: &RecordKey) -> bool {
        self.tables
            .write()
            .expect("lock poisoned")
            .get_mut(table)
            .is_some_and(|t| t.remove(key).is_some())
    }

    /// Store a record directly with arbitrary fields, bypassing validation.
    ///
    /// Used to seed rows written under older column conventions.
    pub fn seed(&self, table: &str, key: RecordKey, fields: Fields) -> StoredEntity {
        let entity = StoredEntity {
            key: key.clone(),
            fields,
            timestamp: Utc::now(),
            etag: self.next_etag(),
        };
        self.tables
            .write()
            .expect("lock poisoned")
            .entry(table.to_string())
            .or_default()
            .insert(key, entity.clone());
        entity
    }

    fn next_etag(&self) -> String {
        let v = self.version.fetch_add(1, Ordering::SeqCst) + 1;
        format!("W/\"{v}\"")
    }

    fn validate(table: &str, key: &RecordKey, fields: &Fields) -> StoreResult<()> {
        if table.is_empty() {
            return Err(StoreError::InvalidKey("table name must not be empty".into()));
        }
        for part in [&key.partition_key, &key.row_key] {
            if part.chars().any(|c| FORBIDDEN_KEY_CHARS.contains(&c) || c.is_control()) {
                return Err(StoreError::InvalidKey(format!(
                    "{key}: contains a character the store does not allow"
                )));
            }
        }
        if let Some(column) = fields.keys().find(|c| RESERVED_COLUMNS.contains(&c.as_str())) {
            return Err(StoreError::InvalidKey(format!("{column} is a reserved column")));
        }
        Ok(())
    }
}

impl Default for InMemoryKeyedStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryKeyedStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let tables = self.tables.read().expect("lock poisoned");
        let counts: BTreeMap<&str, usize> =
            tables.iter().map(|(name, t)| (name.as_str(), t.len())).collect();
        f.debug_struct("InMemoryKeyedStore")
            .field("tables", &counts)
            .field("calls", &self.calls())
            .finish()
    }
}

#[async_trait]
impl KeyedStore for InMemoryKeyedStore {
    async fn create(
        &self,
        table: &str,
        key: &RecordKey,
        fields: &Fields,
        credential: &Credential,
    ) -> StoreResult<StoredEntity> {
        self.switches.enter().await?;
        check_credential(&self.required_credential, credential)?;
        Self::validate(table, key, fields)?;

        let mut tables = self.tables.write().expect("lock poisoned");
        let rows = tables.entry(table.to_string()).or_default();
        if rows.contains_key(key) {
            return Err(StoreError::AlreadyExists(key.to_string()));
        }
        let entity = StoredEntity {
            key: key.clone(),
            fields: fields.clone(),
            timestamp: Utc::now(),
            etag: self.next_etag(),
        };
        rows.insert(key.clone(), entity.clone());
        debug!(table, %key, "created entity");
        Ok(entity)
    }

    async fn merge(
        &self,
        table: &str,
        key: &RecordKey,
        fields: &Fields,
        precondition: &Precondition,
        credential: &Credential,
    ) -> StoreResult<StoredEntity> {
        self.switches.enter().await?;
        check_credential(&self.required_credential, credential)?;
        Self::validate(table, key, fields)?;

        let mut tables = self.tables.write().expect("lock poisoned");
        let existing = tables
            .get_mut(table)
            .and_then(|rows| rows.get_mut(key))
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;
        if !precondition.matches(&existing.etag) {
            return Err(StoreError::PreconditionFailed {
                key: key.to_string(),
                expected: precondition.header_value().to_string(),
            });
        }
        for (column, value) in fields {
            existing.fields.insert(column.clone(), value.clone());
        }
        existing.timestamp = Utc::now();
        existing.etag = self.next_etag();
        debug!(table, %key, columns = fields.len(), "merged entity");
        Ok(existing.clone())
    }

    async fn query(
        &self,
        table: &str,
        partition_key: &str,
        credential: &Credential,
    ) -> StoreResult<Vec<StoredEntity>> {
        self.switches.enter().await?;
        check_credential(&self.required_credential, credential)?;

        let tables = self.tables.read().expect("lock poisoned");
        let rows: Vec<StoredEntity> = tables
            .get(table)
            .map(|rows| {
                rows.values()
                    .filter(|e| e.key.partition_key == partition_key)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        Ok(rows)
    }
}

// ---------------------------------------------------------------------------
// Object store
// ---------------------------------------------------------------------------

/// A stored binary object.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub data: Bytes,
    pub content_type: String,
}

/// In-memory implementation of [`ObjectStore`].
pub struct InMemoryObjectStore {
    base_url: String,
    objects: RwLock<HashMap<(String, String), StoredObject>>,
    reject_status: AtomicU16,
    switches: Switches,
}

impl InMemoryObjectStore {
    /// Create an empty store whose object URLs start with `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: RwLock::new(HashMap::new()),
            reject_status: AtomicU16::new(0),
            switches: Switches::default(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Number of calls received through the [`ObjectStore`] trait.
    pub fn calls(&self) -> usize {
        self.switches.calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_offline(&self, offline: bool) {
        self.switches.offline.store(offline, Ordering::SeqCst);
    }

    /// Answer every subsequent `put` with `status`. `None` restores success.
    pub fn set_reject_status(&self, status: Option<u16>) {
        self.reject_status.store(status.unwrap_or(0), Ordering::SeqCst);
    }

    /// Number of stored objects.
    pub fn len(&self) -> usize {
        self.objects.read().expect("lock poisoned").len()
    }

    /// Returns `true` if no objects are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read one object directly, bypassing call accounting.
    pub fn get(&self, container: &str, path: &str) -> Option<StoredObject> {
        self.objects
            .read()
            .expect("lock poisoned")
            .get(&(container.to_string(), path.to_string()))
            .cloned()
    }
}

impl std::fmt::Debug for InMemoryObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryObjectStore")
            .field("base_url", &self.base_url)
            .field("object_count", &self.len())
            .finish()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn put(
        &self,
        container: &str,
        path: &str,
        data: Bytes,
        content_type: &str,
        _credential: &Credential,
    ) -> StoreResult<()> {
        self.switches.enter().await?;
        let status = self.reject_status.load(Ordering::SeqCst);
        if status != 0 {
            return Err(StoreError::Rejected {
                status,
                message: format!("upload of {container}/{path} refused"),
            });
        }
        if container.is_empty() || path.is_empty() {
            return Err(StoreError::InvalidKey("container and path must not be empty".into()));
        }

        let size = data.len();
        self.objects.write().expect("lock poisoned").insert(
            (container.to_string(), path.to_string()),
            StoredObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        debug!(container, path, size, "stored object");
        Ok(())
    }

    fn object_url(&self, container: &str, path: &str, credential: &Credential) -> String {
        let mut url = format!("{}/{}/{}", self.base_url, container, encode_component(path));
        if !credential.is_empty() {
            url.push('?');
            url.push_str(credential.expose().trim_start_matches('?'));
        }
        url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn key(pk: &str, rk: &str) -> RecordKey {
        RecordKey::from_parts(pk, rk)
    }

    fn fields(pairs: &[(&str, serde_json::Value)]) -> Fields {
        pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
    }

    fn cred() -> Credential {
        Credential::new("sv=1&sig=abc")
    }

    // -----------------------------------------------------------------------
    // Keyed store
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn create_then_read() {
        let store = InMemoryKeyedStore::new();
        let k = key("Downtown", "pho");
        let stored = store
            .create("meals", &k, &fields(&[("price", json!(9.5))]), &cred())
            .await
            .unwrap();
        assert_eq!(stored.key, k);
        assert_eq!(store.get("meals", &k).unwrap().get("price"), Some(&json!(9.5)));
    }

    #[tokio::test]
    async fn second_create_reports_already_exists() {
        let store = InMemoryKeyedStore::new();
        let k = key("Downtown", "pho");
        store.create("meals", &k, &Fields::new(), &cred()).await.unwrap();
        let err = store.create("meals", &k, &Fields::new(), &cred()).await.unwrap_err();
        assert!(matches!(err, StoreError::AlreadyExists(_)));
    }

    #[tokio::test]
    async fn merge_is_field_level_union() {
        let store = InMemoryKeyedStore::new();
        let k = key("Downtown", "pho");
        store
            .create(
                "meals",
                &k,
                &fields(&[("description", json!("beef broth")), ("price", json!(9.0))]),
                &cred(),
            )
            .await
            .unwrap();

        let merged = store
            .merge("meals", &k, &fields(&[("price", json!(10.0))]), &Precondition::Any, &cred())
            .await
            .unwrap();
        assert_eq!(merged.get("description"), Some(&json!("beef broth")));
        assert_eq!(merged.get("price"), Some(&json!(10.0)));
    }

    #[tokio::test]
    async fn merge_changes_etag() {
        let store = InMemoryKeyedStore::new();
        let k = key("Downtown", "pho");
        let first = store.create("meals", &k, &Fields::new(), &cred()).await.unwrap();
        let second = store
            .merge("meals", &k, &Fields::new(), &Precondition::Any, &cred())
            .await
            .unwrap();
        assert_ne!(first.etag, second.etag);
    }

    #[tokio::test]
    async fn merge_missing_reports_not_found() {
        let store = InMemoryKeyedStore::new();
        let err = store
            .merge("meals", &key("Downtown", "ghost"), &Fields::new(), &Precondition::Any, &cred())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn merge_with_stale_etag_fails() {
        let store = InMemoryKeyedStore::new();
        let k = key("Downtown", "pho");
        let first = store.create("meals", &k, &Fields::new(), &cred()).await.unwrap();
        store
            .merge("meals", &k, &Fields::new(), &Precondition::Any, &cred())
            .await
            .unwrap();
        let err = store
            .merge("meals", &k, &Fields::new(), &Precondition::IfMatch(first.etag), &cred())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::PreconditionFailed { .. }));
    }

    #[tokio::test]
    async fn query_filters_by_exact_partition() {
        let store = InMemoryKeyedStore::new();
        for (pk, rk) in [("Downtown", "a"), ("Downtown", "b"), ("downtown", "c"), ("Uptown", "d")] {
            store.create("meals", &key(pk, rk), &Fields::new(), &cred()).await.unwrap();
        }
        let rows = store.query("meals", "Downtown", &cred()).await.unwrap();
        let rks: Vec<_> = rows.iter().map(|e| e.key.row_key.as_str()).collect();
        assert_eq!(rks, vec!["a", "b"]);
        assert!(store.query("other", "Downtown", &cred()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn forbidden_key_characters_are_rejected() {
        let store = InMemoryKeyedStore::new();
        let err = store
            .create("meals", &key("Down/town", "pho"), &Fields::new(), &cred())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn reserved_columns_are_rejected() {
        let store = InMemoryKeyedStore::new();
        let err = store
            .create("meals", &key("Downtown", "pho"), &fields(&[("RowKey", json!("x"))]), &cred())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn offline_store_is_unavailable() {
        let store = InMemoryKeyedStore::new();
        store.set_offline(true);
        let err = store.query("meals", "Downtown", &cred()).await.unwrap_err();
        assert!(err.is_unavailable());
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn wrong_credential_is_rejected() {
        let store = InMemoryKeyedStore::with_required_credential(cred());
        let err = store
            .query("meals", "Downtown", &Credential::new("sig=wrong"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected { status: 403, .. }));
        assert!(store.query("meals", "Downtown", &cred()).await.is_ok());
    }

    #[tokio::test]
    async fn concurrent_creates_admit_exactly_one() {
        let store = std::sync::Arc::new(InMemoryKeyedStore::new());
        let k = key("Downtown", "pho");
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            let k = k.clone();
            handles.push(tokio::spawn(async move {
                store.create("meals", &k, &Fields::new(), &cred()).await
            }));
        }
        let mut created = 0;
        for h in handles {
            match h.await.unwrap() {
                Ok(_) => created += 1,
                Err(e) => assert!(matches!(e, StoreError::AlreadyExists(_))),
            }
        }
        assert_eq!(created, 1);
    }

    #[test]
    fn seed_and_remove() {
        let store = InMemoryKeyedStore::new();
        let k = key("Downtown", "legacy");
        store.seed("meals", k.clone(), fields(&[("Name", json!("Legacy"))]));
        assert_eq!(store.len("meals"), 1);
        assert_eq!(store.calls(), 0);
        assert!(store.remove("meals", &k));
        assert!(store.is_empty("meals"));
    }

    // -----------------------------------------------------------------------
    // Object store
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn put_replaces_same_path() {
        let store = InMemoryObjectStore::new("https://acct.blob.example");
        store
            .put("mealimages", "a/b.jpg", Bytes::from_static(b"one"), "image/jpeg", &cred())
            .await
            .unwrap();
        store
            .put("mealimages", "a/b.jpg", Bytes::from_static(b"two"), "image/jpeg", &cred())
            .await
            .unwrap();
        assert_eq!(store.len(), 1);
        let obj = store.get("mealimages", "a/b.jpg").unwrap();
        assert_eq!(obj.data, Bytes::from_static(b"two"));
        assert_eq!(obj.content_type, "image/jpeg");
    }

    #[tokio::test]
    async fn rejected_put_reports_status() {
        let store = InMemoryObjectStore::new("https://acct.blob.example");
        store.set_reject_status(Some(403));
        let err = store
            .put("mealimages", "a.jpg", Bytes::new(), "image/jpeg", &cred())
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::Rejected { status: 403, message: "upload of mealimages/a.jpg refused".into() });
        assert!(store.is_empty());
    }

    #[test]
    fn object_url_encodes_path_and_appends_credential() {
        let store = InMemoryObjectStore::new("https://acct.blob.example/");
        let url = store.object_url("mealimages", "downtown/pho-a b.jpg", &Credential::new("?sv=1&sig=x"));
        assert_eq!(url, "https://acct.blob.example/mealimages/downtown%2Fpho-a%20b.jpg?sv=1&sig=x");
    }

    #[test]
    fn object_url_without_credential_has_no_query() {
        let store = InMemoryObjectStore::new("http://localhost:10000");
        let url = store.object_url("logos", "x.png", &Credential::default());
        assert_eq!(url, "http://localhost:10000/logos/x.png");
    }
}
