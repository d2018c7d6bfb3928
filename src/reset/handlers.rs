use axum::{extract::State, routing::post, Json, Router};
use tracing::instrument;

use super::{
    dto::{ConfirmResetRequest, ResetRequest, VerifyCodeRequest},
    services,
};
use crate::{auth::dto::MessageResponse, error::ApiResult, state::AppState};

pub fn reset_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/password-reset/request", post(request_code))
        .route("/auth/password-reset/verify", post(verify_code))
        .route("/auth/password-reset/confirm", post(confirm_reset))
}

#[instrument(skip(state, payload))]
pub async fn request_code(
    State(state): State<AppState>,
    Json(payload): Json<ResetRequest>,
) -> ApiResult<Json<MessageResponse>> {
    services::request_reset(&state, &payload.email).await?;
    Ok(Json(MessageResponse::new(services::REQUEST_ACCEPTED)))
}

#[instrument(skip(state, payload))]
pub async fn verify_code(
    State(state): State<AppState>,
    Json(payload): Json<VerifyCodeRequest>,
) -> ApiResult<Json<MessageResponse>> {
    services::verify_code(&state, &payload.email, &payload.code).await?;
    Ok(Json(MessageResponse::new(services::CODE_VERIFIED)))
}

#[instrument(skip(state, payload))]
pub async fn confirm_reset(
    State(state): State<AppState>,
    Json(payload): Json<ConfirmResetRequest>,
) -> ApiResult<Json<MessageResponse>> {
    services::confirm_reset(&state, &payload.email, &payload.code, &payload.new_password).await?;
    Ok(Json(MessageResponse::new(services::PASSWORD_RESET)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fake_state;

    #[tokio::test]
    async fn request_answers_the_same_for_any_well_formed_email() {
        let (state, _) = fake_state();
        let Json(res) = request_code(
            State(state),
            Json(ResetRequest {
                email: "nobody@example.com".into(),
            }),
        )
        .await
        .unwrap();
        assert_eq!(res.message, services::REQUEST_ACCEPTED);
    }
}
