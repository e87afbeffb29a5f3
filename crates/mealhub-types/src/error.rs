use thiserror::Error;

/// Errors produced while building addresses from user input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    /// A required field was missing, blank, or cannot be addressed.
    #[error("invalid input: {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },
}

impl TypeError {
    pub(crate) fn blank(field: &'static str) -> Self {
        Self::InvalidInput {
            field,
            reason: "must not be empty".into(),
        }
    }

    /// The name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::InvalidInput { field, .. } => field,
        }
    }
}
