use std::fmt;

use serde::{Deserialize, Serialize};

/// An opaque, time-boxed access token (for example a shared access
/// signature query string).
///
/// Attached verbatim to every external store call. Never inspected or
/// refreshed here; `Debug` output is redacted.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("Credential(<none>)")
        } else {
            f.write_str("Credential(<redacted>)")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_is_redacted() {
        let c = Credential::new("sv=2024&sig=secret");
        let dbg = format!("{c:?}");
        assert!(!dbg.contains("secret"));
        assert_eq!(c.expose(), "sv=2024&sig=secret");
    }

    #[test]
    fn empty_credential() {
        assert!(Credential::default().is_empty());
        assert_eq!(format!("{:?}", Credential::default()), "Credential(<none>)");
    }
}
