use axum::{
    extract::{Query, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{ApprovalRequest, UpdateProfileRequest, MAX_DISPLAY_NAME_LEN},
    repo_types::{ApprovalStatus, User},
};
use crate::{
    auth::extractors::CurrentUser,
    error::{ApiResult, AppError},
    listings::{filter::ListingQuery, repo_types::Listing},
    pagination::PageOf,
    state::AppState,
};

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me).put(update_me))
        .route("/me/approval-request", post(request_approval))
        .route("/me/listings", get(my_listings))
}

#[instrument(skip(user), fields(user_id = %user.id))]
pub async fn get_me(CurrentUser(user): CurrentUser) -> Json<User> {
    Json(user)
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> ApiResult<Json<User>> {
    let name = payload.display_name.trim();
    if name.is_empty() {
        return Err(AppError::bad_request("Display name is required."));
    }
    if name.chars().count() > MAX_DISPLAY_NAME_LEN {
        return Err(AppError::bad_request(format!(
            "Display name must be at most {MAX_DISPLAY_NAME_LEN} characters."
        )));
    }

    let updated = state
        .users
        .update_display_name(user.id, name)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;
    info!("display name updated");
    Ok(Json(updated))
}

/// Submits a government ID reference and queues the user for review.
#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn request_approval(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ApprovalRequest>,
) -> ApiResult<Json<User>> {
    let url = payload.govt_id_url.trim();
    if url.is_empty() {
        return Err(AppError::bad_request("A government ID document is required."));
    }

    let moved = state
        .users
        .transition_approval(
            user.id,
            &[ApprovalStatus::NotStarted, ApprovalStatus::Rejected],
            ApprovalStatus::Pending,
            Some(url.to_string()),
        )
        .await?;

    match moved {
        Some(updated) => {
            info!("approval requested");
            Ok(Json(updated))
        }
        None => {
            let current = state
                .users
                .find_by_id(user.id)
                .await?
                .map(|u| u.approval_status)
                .unwrap_or(user.approval_status);
            warn!(status = %current.as_str(), "approval request refused");
            Err(AppError::Conflict(format!(
                "Approval request not allowed while status is {}.",
                current.as_str()
            )))
        }
    }
}

/// The caller's own listings, hidden ones included unless the query asks
/// otherwise. Newest first by default.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn my_listings(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Query(query): Query<ListingQuery>,
) -> ApiResult<Json<PageOf<Listing>>> {
    let (mut filter, page) = query.into_parts()?;
    filter.created_by = Some(user.id);
    let (items, total) = state.listings.search(&filter, &page).await?;
    Ok(Json(PageOf::new(items, total, page.paging)))
}
