use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// A geographic or logical grouping that partitions records.
///
/// Stored verbatim after trimming, never slugified: queries elsewhere filter
/// on the original casing and spelling.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Area(String);

impl Area {
    /// Trim `raw` and reject it if nothing remains.
    pub fn new(raw: &str) -> Result<Self, TypeError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TypeError::blank("area"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Area {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Area {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<Area> for String {
    fn from(area: Area) -> Self {
        area.0
    }
}
