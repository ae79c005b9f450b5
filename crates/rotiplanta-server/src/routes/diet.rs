//! Profile lookup and diet recommendation endpoints.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};
use tracing::{error, info};

use rotiplanta_table::{route_response, RowAddRequest, TableType};
use rotiplanta_text::{format_for_diet_recommendation, NormalizationProfile, UserProfile};

use super::string_field;
use crate::error::ApiError;
use crate::state::AppState;

const DIET_TABLE: &str = "Diet_Recommendation";
const MEAL_COLUMNS: [&str; 3] = ["Breakfast", "Lunch", "Dinner"];

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/get-diet-recommendations", post(get_diet_recommendations))
        .route("/get_diet_recommendations", post(get_diet_recommendations))
        .route("/get-user-data", post(get_user_data))
}

/// POST /api/get-user-data: the stored profile, as stored.
async fn get_user_data(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let email = required_email(&body)?;
    let profile = find_profile(&state, &email).await?;
    Ok(Json(Value::Object(profile.into_inner())))
}

/// POST /api/get-diet-recommendations: profile plus a three-meal plan.
async fn get_diet_recommendations(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let email = required_email(&body)?;
    let profile = find_profile(&state, &email).await?;

    let formatted = format_for_diet_recommendation(Some(&profile))
        .map_err(|e| {
            error!("Profile for {} could not be formatted: {}", email, e);
            ApiError::Internal("Failed to format data".into())
        })?
        .ok_or_else(|| ApiError::Internal("Failed to format data".into()))?;

    let row = match serde_json::to_value(&formatted) {
        Ok(Value::Object(row)) => row,
        _ => return Err(ApiError::Internal("Failed to format data".into())),
    };

    info!("Requesting meal plan for {}", email);
    let response = state
        .table
        .add_table_rows(TableType::Action, RowAddRequest::single(DIET_TABLE, row))
        .await?;

    let recommendations =
        route_response(&response, &MEAL_COLUMNS, NormalizationProfile::MealPlan)
            .ok_or_else(|| ApiError::Internal("Failed to generate recommendations".into()))?;

    Ok(Json(json!({
        "user_data": profile,
        "recommendations": recommendations,
    })))
}

fn required_email(body: &Result<Json<Value>, JsonRejection>) -> Result<String, ApiError> {
    string_field(body, "email")
        .filter(|email| !email.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Email is required".into()))
}

/// An empty profile document counts as no profile.
async fn find_profile(state: &AppState, email: &str) -> Result<UserProfile, ApiError> {
    state
        .profiles
        .find_by_email(email)
        .await?
        .filter(|profile| !profile.is_empty())
        .ok_or_else(|| ApiError::NotFound("User not found".into()))
}
