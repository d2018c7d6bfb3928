use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{CreateListingRequest, UpdateListingRequest},
    filter::ListingQuery,
    repo_types::Listing,
    services::load_owned,
};
use crate::{
    auth::extractors::CurrentUser,
    error::{ApiResult, AppError},
    extract::ApiPath,
    pagination::PageOf,
    state::AppState,
    users::repo_types::User,
};

/// Public browse. Hidden listings are never returned whatever the query
/// says.
#[instrument(skip(state))]
pub async fn list_listings(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> ApiResult<Json<PageOf<Listing>>> {
    let (mut filter, page) = query.into_parts()?;
    filter.is_hidden = Some(false);
    let (items, total) = state.listings.search(&filter, &page).await?;
    Ok(Json(PageOf::new(items, total, page.paging)))
}

#[instrument(skip(state))]
pub async fn get_listing(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<Listing>> {
    let listing = state
        .listings
        .find(id)
        .await?
        .filter(|l| !l.is_hidden)
        .ok_or_else(|| AppError::not_found("Property not found"))?;
    Ok(Json(listing))
}

/// Runs behind `load_profile` and the approval gate, so the profile is
/// already in the request extensions.
#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn create_listing(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(payload): Json<CreateListingRequest>,
) -> ApiResult<(StatusCode, Json<Listing>)> {
    let listing = payload.into_listing(&user)?;
    state.listings.insert(&listing).await?;
    info!(listing_id = %listing.id, "listing created");
    Ok((StatusCode::CREATED, Json(listing)))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn update_listing(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
    Json(payload): Json<UpdateListingRequest>,
) -> ApiResult<Json<Listing>> {
    let mut listing = load_owned(&state, id, &user).await?;
    payload.apply(&mut listing)?;
    if !state.listings.update(&listing).await? {
        return Err(AppError::not_found("Property not found"));
    }
    info!(listing_id = %id, "listing updated");
    Ok(Json(listing))
}

#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_listing(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<StatusCode> {
    load_owned(&state, id, &user).await?;
    if !state.listings.delete(id).await? {
        return Err(AppError::not_found("Property not found"));
    }
    info!(listing_id = %id, "listing deleted");
    Ok(StatusCode::NO_CONTENT)
}
