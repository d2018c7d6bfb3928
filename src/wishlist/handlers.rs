use axum::{
    extract::State,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{dto::MessageResponse, extractors::CurrentUser},
    error::{ApiResult, AppError},
    extract::ApiPath,
    listings::repo_types::Listing,
    state::AppState,
};

pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/me/wishlist", get(get_wishlist).post(add_to_wishlist))
        .route("/me/wishlist/:property_id", delete(remove_from_wishlist))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddToWishlistRequest {
    pub property_id: Uuid,
}

/// Saved listings in the order they were added. Listings deleted since
/// drop out; hidden ones stay visible to the user who saved them.
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn get_wishlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> ApiResult<Json<Vec<Listing>>> {
    let ids = state.wishlists.list_ids(user.id).await?;
    let listings = state.listings.find_many(&ids).await?;
    Ok(Json(listings))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<AddToWishlistRequest>,
) -> ApiResult<Json<MessageResponse>> {
    let id = payload.property_id;
    // hidden listings are indistinguishable from missing ones
    let visible = state.listings.find(id).await?.is_some_and(|l| !l.is_hidden);
    if !visible {
        return Err(AppError::not_found("Property not found"));
    }
    if state.wishlists.add(user.id, id).await? {
        info!(listing_id = %id, "added to wishlist");
        Ok(Json(MessageResponse::new("Property added to wishlist")))
    } else {
        Ok(Json(MessageResponse::new("Property already in wishlist")))
    }
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(property_id): ApiPath<Uuid>,
) -> ApiResult<Json<MessageResponse>> {
    if !state.wishlists.remove(user.id, property_id).await? {
        return Err(AppError::not_found("Property not found in wishlist"));
    }
    info!(listing_id = %property_id, "removed from wishlist");
    Ok(Json(MessageResponse::new("Property removed from wishlist")))
}
