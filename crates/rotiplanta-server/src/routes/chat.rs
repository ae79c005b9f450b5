//! Conversational endpoints, one chat table each.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Map, Value};
use tracing::info;

use rotiplanta_table::{route_response, RowAddRequest, TableType};
use rotiplanta_text::{NormalizationProfile, NOT_AVAILABLE};

use super::string_field;
use crate::error::ApiError;
use crate::state::AppState;

const INPUT_COLUMN: &str = "User";
const OUTPUT_COLUMN: &str = "AI";

/// Chat tables behind the conversational endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatTable {
    MedicineRecommendation,
    EmotionalSupport,
    CheckSymptoms,
    UserGuide,
}

impl ChatTable {
    pub fn table_id(&self) -> &'static str {
        match self {
            Self::MedicineRecommendation => "MedicineRecommendation",
            Self::EmotionalSupport => "EmotionalSupport",
            Self::CheckSymptoms => "CheckSymptoms",
            Self::UserGuide => "UserGuide",
        }
    }
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/chat", post(medicine_recommendation))
        .route("/medicine-recommendation", post(medicine_recommendation))
        .route("/emotional-support", post(emotional_support))
        .route("/check-symptoms", post(check_symptoms))
        .route("/user-guide", post(user_guide))
}

async fn medicine_recommendation(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    reply(&state, ChatTable::MedicineRecommendation, body).await
}

async fn emotional_support(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    reply(&state, ChatTable::EmotionalSupport, body).await
}

async fn check_symptoms(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    reply(&state, ChatTable::CheckSymptoms, body).await
}

async fn user_guide(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    reply(&state, ChatTable::UserGuide, body).await
}

/// Send one user message to `table` and return the cleaned answer.
async fn reply(
    state: &AppState,
    table: ChatTable,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let message = string_field(&body, "message")
        .ok_or_else(|| ApiError::BadRequest("Missing 'message' in request body".into()))?;
    info!("Chat message for {}", table.table_id());

    let mut row = Map::new();
    row.insert(INPUT_COLUMN.to_string(), Value::String(message));
    let response = state
        .table
        .add_table_rows(TableType::Chat, RowAddRequest::single(table.table_id(), row))
        .await?;

    let mut result = route_response(
        &response,
        &[OUTPUT_COLUMN],
        NormalizationProfile::ChatReply,
    )
    .ok_or_else(|| ApiError::Internal("Failed to generate a response".into()))?;
    let text = result
        .take(OUTPUT_COLUMN)
        .unwrap_or_else(|| NOT_AVAILABLE.to_string());

    Ok(Json(json!({ "response": text })))
}
