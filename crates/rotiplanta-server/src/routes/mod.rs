//! HTTP route handlers, all mounted under `/api`.

pub mod chat;
pub mod diet;
pub mod files;
pub mod health;

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::{Json, Router};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .nest("/api", api_routes())
        .layer(TraceLayer::new_for_http());
    if state.config.cors_enabled {
        router = router.layer(CorsLayer::permissive());
    }
    router.with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(health::routes())
        .merge(chat::routes())
        .merge(diet::routes())
        .merge(files::routes())
}

/// A string field of a JSON body. A body that is missing or not JSON
/// counts as having no fields.
pub(crate) fn string_field(body: &Result<Json<Value>, JsonRejection>, key: &str) -> Option<String> {
    let Ok(Json(value)) = body else {
        return None;
    };
    value.get(key).and_then(Value::as_str).map(str::to_string)
}
