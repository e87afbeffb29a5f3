use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};

use mealhub_store::{InMemoryKeyedStore, InMemoryObjectStore, KeyedStore, ObjectStore};
use mealhub_types::{
    compose_image_address, compose_key, compose_restaurant_key, Area, Container, ImageRef,
    MealRecord, NormalizedRecord, RecordKind, RestaurantId, RestaurantRecord,
};

use crate::config::HubConfig;
use crate::error::{HubError, HubResult, Operation};
use crate::projector::RecordProjector;
use crate::schema::{MealColumns, MealRow, RawRecord, RestaurantColumns, RestaurantRow};
use crate::timeout::bounded;
use crate::upsert::{Outcome, UpsertCoordinator};

/// Image bytes supplied with a write.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageUpload {
    pub data: Bytes,
    /// File name as the client supplied it; its base name ends the object path.
    pub filename: String,
    pub content_type: String,
}

/// Where a record's image comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageSource {
    /// Upload these bytes first, then reference the new object.
    Upload(ImageUpload),
    /// Reference an object uploaded earlier, by path.
    Stored(String),
}

/// Input to [`MealHub::register_or_update_meal`].
#[derive(Clone, Debug, PartialEq)]
pub struct MealDraft {
    pub area: String,
    pub name: String,
    /// Row key of the restaurant serving the meal. Not checked for existence.
    pub restaurant: String,
    /// `None` leaves a stored description untouched.
    pub description: Option<String>,
    pub prep_minutes: u32,
    pub price: f64,
    pub image: Option<ImageSource>,
}

/// Input to [`MealHub::register_or_update_restaurant`].
#[derive(Clone, Debug, PartialEq)]
pub struct RestaurantDraft {
    pub area: String,
    pub id: RestaurantId,
    /// Display name. Defaults to the name in `id` when that is a name.
    pub name: Option<String>,
    pub logo: Option<ImageSource>,
}

/// A successful write: which upsert branch applied and the normalized record.
#[derive(Clone, Debug, PartialEq)]
pub struct Registered<T> {
    pub outcome: Outcome,
    pub record: T,
}

/// High-level MealHub API.
pub struct MealHub {
    config: HubConfig,
    records: Arc<dyn KeyedStore>,
    objects: Arc<dyn ObjectStore>,
    upserts: UpsertCoordinator,
    projector: RecordProjector,
}

impl MealHub {
    pub fn new(
        config: &HubConfig,
        records: Arc<dyn KeyedStore>,
        objects: Arc<dyn ObjectStore>,
    ) -> Self {
        let upserts = UpsertCoordinator::new(
            Arc::clone(&records),
            config.credential.clone(),
            config.call_timeout(),
        );
        let projector = RecordProjector::new(
            Arc::clone(&objects),
            config.containers.clone(),
            config.credential.clone(),
        );
        Self {
            config: config.clone(),
            records,
            objects,
            upserts,
            projector,
        }
    }

    /// A hub backed by fresh in-memory stores.
    pub fn in_memory(config: &HubConfig) -> Self {
        Self::new(
            config,
            Arc::new(InMemoryKeyedStore::new()),
            Arc::new(InMemoryObjectStore::new(config.object_base_url.clone())),
        )
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    // ---- Meal operations ----

    /// Create the meal, or update it if one with the same area and name
    /// exists. Input is validated before any store is contacted. An image
    /// upload that succeeds is not undone if the record write then fails.
    pub async fn register_or_update_meal(&self, draft: MealDraft) -> HubResult<Registered<MealRecord>> {
        let key = compose_key(&draft.area, &draft.name)?;
        if !draft.price.is_finite() || draft.price < 0.0 {
            return Err(HubError::invalid("price", "must be a non-negative number"));
        }
        let image = self.prepare_image(
            Container::MealImages,
            &draft.area,
            &draft.name,
            draft.image.as_ref(),
        )?;

        let mut columns = MealColumns {
            restaurant: Some(draft.restaurant.trim().to_string()),
            name: Some(draft.name.trim().to_string()),
            description: draft.description,
            prep_minutes: Some(draft.prep_minutes),
            price: Some(draft.price),
            image_blob_name: None,
            image_url: None,
        };
        if let Some((image, upload)) = image {
            if let Some(upload) = upload {
                self.put_image(&image, upload).await?;
            }
            columns.image_blob_name = Some(image.path);
            // A URL stored for the previous image would otherwise win at read time.
            columns.image_url = Some(String::new());
        }

        let upserted = self
            .upserts
            .upsert(&self.config.meals_table, &key, &columns.to_fields())
            .await?;
        info!(%key, outcome = ?upserted.outcome, "meal registered");

        let entity = upserted.entity;
        let record = self.projector.project_meal(
            &entity.key,
            Some(entity.timestamp),
            &MealRow::decode(&entity.fields),
        );
        Ok(Registered {
            outcome: upserted.outcome,
            record,
        })
    }

    /// Every meal stored under `area`, normalized.
    pub async fn list_meals_by_area(&self, area: &str) -> HubResult<Vec<NormalizedRecord>> {
        self.list(&self.config.meals_table, RecordKind::Meal, area)
            .await
    }

    // ---- Restaurant operations ----

    /// Create the restaurant, or update it if its key is already taken.
    pub async fn register_or_update_restaurant(
        &self,
        draft: RestaurantDraft,
    ) -> HubResult<Registered<RestaurantRecord>> {
        let key = compose_restaurant_key(&draft.area, &draft.id)?;
        let display_name = match (&draft.name, &draft.id) {
            (Some(name), _) if !name.trim().is_empty() => Some(name.trim().to_string()),
            (_, RestaurantId::Name(name)) => Some(name.trim().to_string()),
            _ => None,
        };
        let item_name = display_name.clone().unwrap_or_else(|| key.row_key.clone());
        let logo = self.prepare_image(
            Container::RestaurantLogos,
            &draft.area,
            &item_name,
            draft.logo.as_ref(),
        )?;

        let mut columns = RestaurantColumns {
            restaurant_name: display_name,
            logo_blob_name: None,
            logo_url: None,
        };
        if let Some((logo, upload)) = logo {
            if let Some(upload) = upload {
                self.put_image(&logo, upload).await?;
            }
            columns.logo_blob_name = Some(logo.path);
            columns.logo_url = Some(String::new());
        }

        let upserted = self
            .upserts
            .upsert(&self.config.restaurants_table, &key, &columns.to_fields())
            .await?;
        info!(%key, outcome = ?upserted.outcome, "restaurant registered");

        let entity = upserted.entity;
        let record = self.projector.project_restaurant(
            &entity.key,
            Some(entity.timestamp),
            &RestaurantRow::decode(&entity.fields),
        );
        Ok(Registered {
            outcome: upserted.outcome,
            record,
        })
    }

    /// Every restaurant stored under `area`, normalized.
    pub async fn list_restaurants_by_area(&self, area: &str) -> HubResult<Vec<NormalizedRecord>> {
        self.list(&self.config.restaurants_table, RecordKind::Restaurant, area)
            .await
    }

    // ---- Image operations ----

    /// Upload an image under its deterministic address. Uploading again with
    /// the same container, area, item and file name replaces the object.
    pub async fn upload_item_image(
        &self,
        container: Container,
        area: &str,
        item_name: &str,
        data: Bytes,
        filename: &str,
        content_type: &str,
    ) -> HubResult<ImageRef> {
        let image = compose_image_address(container, area, item_name, filename)?;
        let upload = ImageUpload {
            data,
            filename: filename.to_string(),
            content_type: content_type.to_string(),
        };
        self.put_image(&image, &upload).await?;
        Ok(image)
    }

    /// Retrievable address of a stored image.
    pub fn image_url(&self, image: &ImageRef) -> String {
        self.objects.object_url(
            self.config.containers.name(image.container),
            &image.path,
            &self.config.credential,
        )
    }

    // ---- Internals ----

    /// Resolve the image a write refers to, without contacting any store.
    fn prepare_image<'a>(
        &self,
        container: Container,
        area: &str,
        item_name: &str,
        source: Option<&'a ImageSource>,
    ) -> HubResult<Option<(ImageRef, Option<&'a ImageUpload>)>> {
        match source {
            None => Ok(None),
            Some(ImageSource::Upload(upload)) => {
                let image = compose_image_address(container, area, item_name, &upload.filename)?;
                Ok(Some((image, Some(upload))))
            }
            Some(ImageSource::Stored(path)) => {
                let path = path.trim();
                if path.is_empty() {
                    return Err(HubError::invalid("imageBlobName", "must not be empty"));
                }
                Ok(Some((ImageRef::new(container, path), None)))
            }
        }
    }

    async fn put_image(&self, image: &ImageRef, upload: &ImageUpload) -> HubResult<()> {
        let container = self.config.containers.name(image.container);
        debug!(container, path = %image.path, bytes = upload.data.len(), "uploading image");
        bounded(
            self.config.call_timeout(),
            self.objects.put(
                container,
                &image.path,
                upload.data.clone(),
                &upload.content_type,
                &self.config.credential,
            ),
        )
        .await
        .map_err(|err| {
            warn!(container, path = %image.path, error = %err, "image upload failed");
            HubError::from_store(Operation::Upload, err)
        })
    }

    async fn list(&self, table: &str, kind: RecordKind, area: &str) -> HubResult<Vec<NormalizedRecord>> {
        let area = Area::new(area)?;
        let entities = bounded(
            self.config.call_timeout(),
            self.records
                .query(table, area.as_str(), &self.config.credential),
        )
        .await
        .map_err(|err| {
            warn!(table, %area, error = %err, "query failed");
            HubError::from_store(Operation::Query, err)
        })?;
        info!(table, %area, count = entities.len(), "listed records");

        Ok(entities
            .iter()
            .map(|entity| self.projector.project(&RawRecord::decode(kind, entity)))
            .collect())
    }
}
