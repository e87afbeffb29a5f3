//! Error types for store operations.

use thiserror::Error;

/// Errors reported by a keyed store or object store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// `create` found a record already stored under the key.
    #[error("entity already exists: {0}")]
    AlreadyExists(String),

    /// `merge` found no record under the key.
    #[error("entity not found: {0}")]
    NotFound(String),

    /// `merge` was given an etag that no longer matches the stored record.
    #[error("precondition failed for {key}: expected etag {expected}")]
    PreconditionFailed { key: String, expected: String },

    /// The key or table name was rejected by the store.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The store answered with a non-success status.
    #[error("store rejected request with status {status}: {message}")]
    Rejected { status: u16, message: String },

    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The call did not finish within its time limit.
    #[error("store call timed out after {0} ms")]
    Timeout(u64),
}

impl StoreError {
    /// Transport-level failures: the store never gave an answer.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_classification() {
        assert!(StoreError::Timeout(50).is_unavailable());
        assert!(StoreError::Unavailable("down".into()).is_unavailable());
        assert!(!StoreError::NotFound("k".into()).is_unavailable());
        assert!(!StoreError::Rejected { status: 403, message: "denied".into() }.is_unavailable());
    }

    #[test]
    fn display_messages() {
        let e = StoreError::PreconditionFailed { key: "(a, b)".into(), expected: "W/\"3\"".into() };
        assert_eq!(e.to_string(), "precondition failed for (a, b): expected etag W/\"3\"");
    }
}
