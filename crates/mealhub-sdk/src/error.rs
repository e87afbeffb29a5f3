use std::fmt;

use serde::Serialize;
use thiserror::Error;

use mealhub_store::StoreError;
use mealhub_types::TypeError;

/// The external call a failure happened in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    Create,
    Merge,
    Query,
    Upload,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Merge => "merge",
            Self::Query => "query",
            Self::Upload => "upload",
        })
    }
}

/// Failure category, independent of the operation it happened in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    AlreadyExistsRace,
    StoreUnavailable,
    ObjectUploadFailed,
    Store,
}

#[derive(Debug, Error)]
pub enum HubError {
    /// A required field was missing or blank. No external call was made.
    #[error("invalid input: {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    /// `create` reported the key taken, then `merge` found it gone or changed.
    #[error("{op}: record changed between create and merge: {source}")]
    AlreadyExistsRace { op: Operation, source: StoreError },

    /// The keyed or object store could not be reached, or timed out.
    #[error("{op}: store unavailable: {source}")]
    StoreUnavailable { op: Operation, source: StoreError },

    /// The object store answered an upload with a non-success status.
    #[error("{op}: object upload failed with status {status}: {message}")]
    ObjectUploadFailed {
        op: Operation,
        status: u16,
        message: String,
    },

    /// Any other store failure, surfaced unchanged.
    #[error("{op}: {source}")]
    Store { op: Operation, source: StoreError },
}

impl HubError {
    /// Classify a store failure that happened during `op`.
    pub fn from_store(op: Operation, source: StoreError) -> Self {
        if source.is_unavailable() {
            return Self::StoreUnavailable { op, source };
        }
        match (op, source) {
            (Operation::Upload, StoreError::Rejected { status, message }) => {
                Self::ObjectUploadFailed { op, status, message }
            }
            (op, source) => Self::Store { op, source },
        }
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput { .. } => ErrorKind::InvalidInput,
            Self::AlreadyExistsRace { .. } => ErrorKind::AlreadyExistsRace,
            Self::StoreUnavailable { .. } => ErrorKind::StoreUnavailable,
            Self::ObjectUploadFailed { .. } => ErrorKind::ObjectUploadFailed,
            Self::Store { .. } => ErrorKind::Store,
        }
    }

    /// The operation the failure happened in; `None` for input errors.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::InvalidInput { .. } => None,
            Self::AlreadyExistsRace { op, .. }
            | Self::StoreUnavailable { op, .. }
            | Self::ObjectUploadFailed { op, .. }
            | Self::Store { op, .. } => Some(*op),
        }
    }
}

impl From<TypeError> for HubError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidInput { field, reason } => Self::InvalidInput { field, reason },
        }
    }
}

pub type HubResult<T> = Result<T, HubError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeouts_are_unavailable() {
        let err = HubError::from_store(Operation::Create, StoreError::Timeout(100));
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
        assert_eq!(err.operation(), Some(Operation::Create));
    }

    #[test]
    fn rejected_upload_is_upload_failure() {
        let err = HubError::from_store(
            Operation::Upload,
            StoreError::Rejected { status: 403, message: "denied".into() },
        );
        assert!(matches!(err, HubError::ObjectUploadFailed { status: 403, .. }));
    }

    #[test]
    fn rejected_create_is_surfaced_as_is() {
        let err = HubError::from_store(
            Operation::Create,
            StoreError::Rejected { status: 400, message: "bad".into() },
        );
        assert_eq!(err.kind(), ErrorKind::Store);
        assert_eq!(err.to_string(), "create: store rejected request with status 400: bad");
    }

    #[test]
    fn type_errors_become_invalid_input() {
        let err: HubError = mealhub_types::compose_key("", "x").unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.operation(), None);
    }
}
