//! Deterministic image addressing.
//!
//! An uploaded image is named `slug(area)/slug(item)-<file name>` inside one
//! of a fixed set of containers. The same inputs always produce the same
//! path, so re-uploading an image for the same item and file name replaces
//! the stored object instead of accumulating copies.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::slug::Slug;

/// Area fragment used when an upload carries no area.
pub const DEFAULT_AREA_FRAGMENT: &str = "general";

/// Which object container an image belongs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Container {
    /// Photos attached to meal records.
    MealImages,
    /// Logos attached to restaurant records.
    RestaurantLogos,
}

impl Container {
    pub const ALL: [Container; 2] = [Container::MealImages, Container::RestaurantLogos];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MealImages => "meal-images",
            Self::RestaurantLogos => "restaurant-logos",
        }
    }
}

impl fmt::Display for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Container {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "meal-images" | "meals" | "meal" => Ok(Self::MealImages),
            "restaurant-logos" | "restaurants" | "logos" => Ok(Self::RestaurantLogos),
            other => Err(TypeError::InvalidInput {
                field: "container",
                reason: format!("unknown container {other:?}"),
            }),
        }
    }
}

/// A stored image: container selector plus object path.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageRef {
    pub container: Container,
    pub path: String,
}

impl ImageRef {
    pub fn new(container: Container, path: impl Into<String>) -> Self {
        Self {
            container,
            path: path.into(),
        }
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.container, self.path)
    }
}

/// Compose the address of an uploaded image.
///
/// A blank `area` falls back to [`DEFAULT_AREA_FRAGMENT`]; a blank
/// `item_name` falls back to the file name. Directory components a client
/// may prepend to the file name are dropped; the remaining base name is kept
/// verbatim so its extension survives.
///
/// ```
/// use mealhub_types::{compose_image_address, Container};
///
/// let image = compose_image_address(Container::MealImages, "Downtown", "Grilled Cheese", "photo.jpg")
///     .unwrap();
/// assert_eq!(image.path, "downtown/grilled-cheese-photo.jpg");
/// ```
pub fn compose_image_address(
    container: Container,
    area: &str,
    item_name: &str,
    original_file_name: &str,
) -> Result<ImageRef, TypeError> {
    let file_name = base_name(original_file_name);
    if file_name.trim().is_empty() {
        return Err(TypeError::InvalidInput {
            field: "filename",
            reason: "must not be empty".into(),
        });
    }

    let area_source = if area.trim().is_empty() {
        DEFAULT_AREA_FRAGMENT
    } else {
        area
    };
    let item_source = if item_name.trim().is_empty() {
        file_name
    } else {
        item_name
    };

    let path = format!(
        "{}/{}-{}",
        Slug::derive(area_source),
        Slug::derive(item_source),
        file_name
    );
    Ok(ImageRef::new(container, path))
}

fn base_name(file_name: &str) -> &str {
    file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
}
