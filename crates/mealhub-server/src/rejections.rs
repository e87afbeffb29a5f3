//! Log of write requests refused for missing or malformed fields.

use std::sync::RwLock;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::error::ServerResult;

/// One refused request and why it was refused.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Rejection {
    pub reason: String,
    pub payload: Value,
}

#[async_trait]
pub trait RejectionLog: Send + Sync {
    /// Record `rejection`. Returns `true` if it was kept.
    async fn record(&self, rejection: Rejection) -> ServerResult<bool>;
}

/// Discards everything.
pub struct NoOpRejectionLog;

#[async_trait]
impl RejectionLog for NoOpRejectionLog {
    async fn record(&self, _rejection: Rejection) -> ServerResult<bool> {
        Ok(false)
    }
}

#[derive(Default)]
pub struct InMemoryRejectionLog {
    entries: RwLock<Vec<Rejection>>,
}

impl InMemoryRejectionLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<Rejection> {
        self.entries.read().expect("lock poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RejectionLog for InMemoryRejectionLog {
    async fn record(&self, rejection: Rejection) -> ServerResult<bool> {
        self.entries.write().expect("lock poisoned").push(rejection);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rejection() -> Rejection {
        Rejection {
            reason: "missing fields: area".into(),
            payload: json!({"name": "Pho"}),
        }
    }

    #[tokio::test]
    async fn noop_log_keeps_nothing() {
        assert!(!NoOpRejectionLog.record(rejection()).await.unwrap());
    }

    #[tokio::test]
    async fn in_memory_log_keeps_entries() {
        let log = InMemoryRejectionLog::new();
        assert!(log.record(rejection()).await.unwrap());
        assert_eq!(log.len(), 1);
        assert_eq!(log.entries()[0].reason, "missing fields: area");
    }
}
