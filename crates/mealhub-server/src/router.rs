use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, put};
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;
use crate::error::{ServerError, ServerResult};
use crate::handler::{self, AppState};

/// Build the axum router with all MealHub endpoints.
pub fn build_router(state: AppState, config: &ServerConfig) -> ServerResult<Router> {
    Ok(Router::new()
        .route("/v1/health", get(handler::health_handler))
        .route(
            "/api/meals",
            get(handler::list_meals_handler).post(handler::add_meal_handler),
        )
        .route(
            "/api/restaurants",
            get(handler::list_restaurants_handler).post(handler::add_restaurant_handler),
        )
        .route("/api/images/:container", put(handler::upload_image_handler))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors_layer(&config.cors_origin)?)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

fn cors_layer(origin: &str) -> ServerResult<CorsLayer> {
    let allow_origin = if origin.trim() == "*" {
        AllowOrigin::from(Any)
    } else {
        let value = HeaderValue::from_str(origin.trim())
            .map_err(|e| ServerError::Config(format!("cors_origin: {e}")))?;
        AllowOrigin::exact(value)
    };
    Ok(CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any))
}
