use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument};

use super::prompt::build_prompt;
use crate::{
    error::{ApiResult, AppError},
    state::AppState,
};

pub fn ai_routes() -> Router<AppState> {
    Router::new().route("/generate-description", post(generate_description))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DescriptionRequest {
    pub property_data: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct DescriptionResponse {
    pub description: String,
}

#[instrument(skip(state, payload))]
pub async fn generate_description(
    State(state): State<AppState>,
    Json(payload): Json<DescriptionRequest>,
) -> ApiResult<Json<DescriptionResponse>> {
    let Some(Value::Object(data)) = payload.property_data else {
        return Err(AppError::bad_request("Invalid property data received"));
    };

    let prompt = build_prompt(&data);
    let description = state
        .describer
        .generate(&prompt)
        .await
        .map_err(|e| AppError::upstream("Failed to generate property description", e))?;

    info!(chars = description.len(), "property description generated");
    Ok(Json(DescriptionResponse { description }))
}
