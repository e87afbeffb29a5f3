use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap};
use axum::response::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use mealhub_sdk::{
    Container, HubError, ImageSource, MealDraft, MealHub, MealRecord, NormalizedRecord, Outcome,
    RestaurantDraft, RestaurantId, RestaurantRecord,
};

use crate::error::{RejectedRequest, ServerError, ServerResult};
use crate::rejections::{Rejection, RejectionLog};

/// Shared state behind every handler.
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<MealHub>,
    pub rejections: Arc<dyn RejectionLog>,
}

#[derive(Debug, Deserialize)]
pub struct AreaQuery {
    pub area: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    pub area: Option<String>,
    pub item: Option<String>,
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Saved<T> {
    pub success: bool,
    pub outcome: Outcome,
    pub entity: T,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Uploaded {
    pub success: bool,
    pub blob_name: String,
    pub blob_url: String,
}

/// Health check handler.
pub async fn health_handler() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "name": "mealhub-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// ---- Meals ----

pub async fn add_meal_handler(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ServerResult<Json<Saved<MealRecord>>> {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            return Err(reject(&state, "Invalid JSON body", vec![], Value::Null, rejection.body_text()).await)
        }
    };

    let missing: Vec<String> = ["restaurant", "name", "prep", "price", "area"]
        .into_iter()
        .filter(|field| is_blank(body.get(*field)))
        .map(String::from)
        .collect();
    if !missing.is_empty() {
        let reason = format!("missing fields: {}", missing.join(", "));
        return Err(reject(&state, "Missing required fields", missing, body, reason).await);
    }

    let prep = body.get("prep").and_then(as_minutes);
    let price = body.get("price").and_then(as_amount);
    let (Some(prep_minutes), Some(price)) = (prep, price) else {
        let malformed: Vec<&str> = [("prep", prep.is_none()), ("price", price.is_none())]
            .into_iter()
            .filter_map(|(field, bad)| bad.then_some(field))
            .collect();
        let reason = format!("malformed fields: {}", malformed.join(", "));
        return Err(reject(&state, "Malformed fields", vec![], body, reason).await);
    };

    let draft = MealDraft {
        area: as_text(body.get("area")),
        name: as_text(body.get("name")),
        restaurant: as_text(body.get("restaurant")),
        description: body
            .get("description")
            .and_then(Value::as_str)
            .map(String::from),
        prep_minutes,
        price,
        image: body
            .get("imageBlobName")
            .and_then(Value::as_str)
            .filter(|path| !path.trim().is_empty())
            .map(|path| ImageSource::Stored(path.to_string())),
    };
    let registered = match state.hub.register_or_update_meal(draft).await {
        Ok(registered) => registered,
        Err(err) => return Err(refused(&state, err, body).await),
    };
    Ok(Json(Saved {
        success: true,
        outcome: registered.outcome,
        entity: registered.record,
    }))
}

pub async fn list_meals_handler(
    State(state): State<AppState>,
    Query(query): Query<AreaQuery>,
) -> ServerResult<Json<Vec<NormalizedRecord>>> {
    let area = query.area.unwrap_or_default();
    Ok(Json(state.hub.list_meals_by_area(&area).await?))
}

// ---- Restaurants ----

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantRequest {
    pub area: Option<String>,
    pub name: Option<String>,
    pub id: Option<String>,
    pub logo_blob_name: Option<String>,
}

pub async fn add_restaurant_handler(
    State(state): State<AppState>,
    body: Result<Json<Value>, JsonRejection>,
) -> ServerResult<Json<Saved<RestaurantRecord>>> {
    let body = match body {
        Ok(Json(body)) => body,
        Err(rejection) => {
            return Err(reject(&state, "Invalid JSON body", vec![], Value::Null, rejection.body_text()).await)
        }
    };
    let request: RestaurantRequest = match serde_json::from_value(body.clone()) {
        Ok(request) => request,
        Err(err) => return Err(reject(&state, "Malformed fields", vec![], body, err.to_string()).await),
    };

    let present = |v: &Option<String>| v.as_deref().is_some_and(|s| !s.trim().is_empty());
    let mut missing = Vec::new();
    if !present(&request.area) {
        missing.push("area".to_string());
    }
    if !present(&request.name) && !present(&request.id) {
        missing.push("name".to_string());
    }
    if !missing.is_empty() {
        let reason = format!("missing fields: {}", missing.join(", "));
        return Err(reject(&state, "Missing required fields", missing, body, reason).await);
    }

    let id = match (request.id, &request.name) {
        (Some(id), _) if !id.trim().is_empty() => RestaurantId::Opaque(id),
        (_, name) => RestaurantId::Name(name.clone().unwrap_or_default()),
    };
    let draft = RestaurantDraft {
        area: request.area.unwrap_or_default(),
        id,
        name: request.name,
        logo: request
            .logo_blob_name
            .filter(|path| !path.trim().is_empty())
            .map(ImageSource::Stored),
    };
    let registered = match state.hub.register_or_update_restaurant(draft).await {
        Ok(registered) => registered,
        Err(err) => return Err(refused(&state, err, body).await),
    };
    Ok(Json(Saved {
        success: true,
        outcome: registered.outcome,
        entity: registered.record,
    }))
}

pub async fn list_restaurants_handler(
    State(state): State<AppState>,
    Query(query): Query<AreaQuery>,
) -> ServerResult<Json<Vec<NormalizedRecord>>> {
    let area = query.area.unwrap_or_default();
    Ok(Json(state.hub.list_restaurants_by_area(&area).await?))
}

// ---- Images ----

pub async fn upload_image_handler(
    State(state): State<AppState>,
    Path(container): Path<String>,
    Query(query): Query<ImageQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> ServerResult<Json<Uploaded>> {
    let container: Container = container.parse().map_err(HubError::from)?;
    if body.is_empty() {
        return Err(HubError::InvalidInput {
            field: "image",
            reason: "request body is empty".into(),
        }
        .into());
    }
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream");

    let image = state
        .hub
        .upload_item_image(
            container,
            query.area.as_deref().unwrap_or_default(),
            query.item.as_deref().unwrap_or_default(),
            body,
            query.filename.as_deref().unwrap_or_default(),
            content_type,
        )
        .await?;
    info!(image = %image, "image uploaded");

    Ok(Json(Uploaded {
        success: true,
        blob_url: state.hub.image_url(&image),
        blob_name: image.path,
    }))
}

// ---- Helpers ----

async fn reject(
    state: &AppState,
    error: &str,
    missing: Vec<String>,
    payload: Value,
    reason: String,
) -> ServerError {
    warn!(%reason, "rejected request");
    let queue_logged = match state.rejections.record(Rejection { reason, payload }).await {
        Ok(kept) => kept,
        Err(err) => {
            warn!(error = %err, "failed to record rejected request");
            false
        }
    };
    ServerError::Rejected(RejectedRequest {
        error: error.to_string(),
        missing,
        queue_logged,
    })
}

/// Invalid input found by the hub is a rejected request like any other;
/// store failures pass through unchanged.
async fn refused(state: &AppState, err: HubError, payload: Value) -> ServerError {
    match err {
        HubError::InvalidInput { .. } => {
            reject(state, "Invalid fields", vec![], payload, err.to_string()).await
        }
        other => other.into(),
    }
}

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

fn as_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Whole minutes from a number or numeric string; fractions are dropped.
fn as_minutes(value: &Value) -> Option<u32> {
    let minutes = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !minutes.is_finite() || minutes < 0.0 || minutes > f64::from(u32::MAX) {
        return None;
    }
    Some(minutes.trunc() as u32)
}

fn as_amount(value: &Value) -> Option<f64> {
    let amount = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    (amount.is_finite() && amount >= 0.0).then_some(amount)
}
