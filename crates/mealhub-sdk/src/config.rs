//! Process-wide configuration.
//!
//! Built once at startup, from TOML and optional environment overrides, then
//! passed by reference to [`MealHub::new`](crate::MealHub::new).

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use mealhub_types::{Container, Credential};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Names of the object containers backing each [`Container`] selector.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerNames {
    pub meal_images: String,
    pub restaurant_logos: String,
}

impl ContainerNames {
    pub fn name(&self, container: Container) -> &str {
        match container {
            Container::MealImages => &self.meal_images,
            Container::RestaurantLogos => &self.restaurant_logos,
        }
    }
}

impl Default for ContainerNames {
    fn default() -> Self {
        Self {
            meal_images: "mealimages".into(),
            restaurant_logos: "restaurantlogos".into(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Keyed-store table holding meal records.
    pub meals_table: String,
    /// Keyed-store table holding restaurant records.
    pub restaurants_table: String,
    /// Base address images are served from, without a trailing slash.
    pub object_base_url: String,
    /// Access token attached to every store call.
    pub credential: Credential,
    /// Time limit for each external call.
    pub call_timeout_ms: u64,
    pub containers: ContainerNames,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            meals_table: "meals1".into(),
            restaurants_table: "Restaurants".into(),
            object_base_url: "http://127.0.0.1:10000/devstoreaccount1".into(),
            credential: Credential::default(),
            call_timeout_ms: 10_000,
            containers: ContainerNames::default(),
        }
    }
}

impl HubConfig {
    /// Environment variables consulted by [`HubConfig::with_env_overrides`].
    pub const ENV_CREDENTIAL: &'static str = "MEALHUB_CREDENTIAL";
    pub const ENV_MEALS_TABLE: &'static str = "MEALHUB_TABLE_MEALS";
    pub const ENV_RESTAURANTS_TABLE: &'static str = "MEALHUB_TABLE_RESTAURANTS";
    pub const ENV_OBJECT_BASE_URL: &'static str = "MEALHUB_OBJECT_BASE_URL";

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Overlay values found through `lookup` (normally `std::env::var`).
    pub fn with_env_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = lookup(Self::ENV_CREDENTIAL) {
            self.credential = Credential::new(token);
        }
        if let Some(table) = lookup(Self::ENV_MEALS_TABLE) {
            self.meals_table = table;
        }
        if let Some(table) = lookup(Self::ENV_RESTAURANTS_TABLE) {
            self.restaurants_table = table;
        }
        if let Some(url) = lookup(Self::ENV_OBJECT_BASE_URL) {
            self.object_base_url = url;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("meals_table", &self.meals_table),
            ("restaurants_table", &self.restaurants_table),
            ("containers.meal_images", &self.containers.meal_images),
            ("containers.restaurant_logos", &self.containers.restaurant_logos),
            ("object_base_url", &self.object_base_url),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("{name} must not be empty")));
            }
        }
        if self.call_timeout_ms == 0 {
            return Err(ConfigError::Invalid("call_timeout_ms must be positive".into()));
        }
        Ok(())
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.call_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn defaults() {
        let c = HubConfig::default();
        assert_eq!(c.meals_table, "meals1");
        assert_eq!(c.restaurants_table, "Restaurants");
        assert_eq!(c.containers.name(Container::MealImages), "mealimages");
        assert_eq!(c.containers.name(Container::RestaurantLogos), "restaurantlogos");
        assert_eq!(c.call_timeout(), Duration::from_secs(10));
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = HubConfig::from_toml_str(
            r#"
            meals_table = "meals2"
            credential = "sv=2024&sig=abc"

            [containers]
            meal_images = "photos"
            "#,
        )
        .unwrap();
        assert_eq!(c.meals_table, "meals2");
        assert_eq!(c.restaurants_table, "Restaurants");
        assert_eq!(c.containers.meal_images, "photos");
        assert_eq!(c.containers.restaurant_logos, "restaurantlogos");
        assert_eq!(c.credential.expose(), "sv=2024&sig=abc");
    }

    #[test]
    fn rejects_blank_table() {
        let err = HubConfig::from_toml_str("meals_table = \"  \"").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_zero_timeout() {
        let err = HubConfig::from_toml_str("call_timeout_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = HubConfig::from_toml_str("meals_table = ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            (HubConfig::ENV_CREDENTIAL, "sig=from-env"),
            (HubConfig::ENV_MEALS_TABLE, "mealsEnv"),
        ]
        .into_iter()
        .collect();
        let c = HubConfig::default()
            .with_env_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(c.credential.expose(), "sig=from-env");
        assert_eq!(c.meals_table, "mealsEnv");
        assert_eq!(c.restaurants_table, "Restaurants");
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "restaurants_table = \"Places\"").unwrap();
        let c = HubConfig::load(file.path()).unwrap();
        assert_eq!(c.restaurants_table, "Places");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = HubConfig::load("/nonexistent/mealhub.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
