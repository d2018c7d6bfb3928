use axum::{
    extract::{Query, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::dto::{BulkDeleteRequest, DashboardStats, DecisionResponse, UserQuery, UserStatusRequest};
use crate::{
    auth::extractors::AdminUser,
    error::{ApiResult, AppError},
    extract::ApiPath,
    listings::{
        dto::{FeatureRequest, VisibilityRequest},
        filter::ListingQuery,
        repo_types::Listing,
        services::{delete_many, BulkDeleteReport},
    },
    pagination::{PageOf, Paging},
    state::AppState,
    users::repo_types::{ApprovalStatus, User, UserFilter, UserStatusUpdate},
};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/stats", get(stats))
        .route("/admin/pending-approvals", get(pending_approvals))
        .route("/admin/users", get(list_users))
        .route("/admin/users/:id/approve", put(approve_user))
        .route("/admin/users/:id/reject", put(reject_user))
        .route("/admin/users/:id/status", put(update_user_status))
        .route("/admin/listings", get(search_listings))
        .route("/admin/listings/:id/visibility", put(set_visibility))
        .route("/admin/listings/:id/feature", put(set_featured))
        .route("/admin/listings/delete-multiple", post(delete_multiple))
}

#[instrument(skip(state, _admin))]
pub async fn stats(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<DashboardStats>> {
    let counts = state.users.count_by_approval().await?;
    let listings = state.listings.stats().await?;
    Ok(Json(DashboardStats::new(counts, listings)))
}

#[instrument(skip(state, _admin))]
pub async fn pending_approvals(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> ApiResult<Json<Vec<User>>> {
    let filter = UserFilter {
        status: Some(ApprovalStatus::Pending),
        ..Default::default()
    };
    let paging = Paging {
        page: 1,
        limit: i64::from(u16::MAX),
    };
    let (users, _) = state.users.search(&filter, paging).await?;
    Ok(Json(users))
}

#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<UserQuery>,
) -> ApiResult<Json<PageOf<User>>> {
    let (filter, paging) = query.into_parts()?;
    let (users, total) = state.users.search(&filter, paging).await?;
    Ok(Json(PageOf::new(users, total, paging)))
}

/// Moves a pending user to `to`. Users in any other state are reported
/// back unchanged with a 200.
async fn decide(
    state: &AppState,
    admin: &User,
    id: Uuid,
    to: ApprovalStatus,
    done: &str,
) -> ApiResult<Json<DecisionResponse>> {
    let moved = state
        .users
        .transition_approval(id, &[ApprovalStatus::Pending], to.clone(), None)
        .await?;
    if let Some(profile) = moved {
        info!(admin = %admin.email, user_id = %id, to = %to.as_str(), "approval decided");
        return Ok(Json(DecisionResponse {
            message: done.to_string(),
            profile,
        }));
    }

    let profile = state
        .users
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::not_found("User profile not found."))?;
    info!(user_id = %id, status = %profile.approval_status.as_str(), "user not pending; no action");
    Ok(Json(DecisionResponse {
        message: format!("User is already {}.", profile.approval_status.as_str()),
        profile,
    }))
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn approve_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<DecisionResponse>> {
    decide(&state, &admin, id, ApprovalStatus::Approved, "User approved successfully.").await
}

#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn reject_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<DecisionResponse>> {
    decide(&state, &admin, id, ApprovalStatus::Rejected, "User rejected successfully.").await
}

#[instrument(skip(state, admin, payload), fields(admin_id = %admin.id))]
pub async fn update_user_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiPath(id): ApiPath<Uuid>,
    Json(payload): Json<UserStatusRequest>,
) -> ApiResult<Json<User>> {
    let update = UserStatusUpdate::try_from(payload)?;
    if id == admin.id && (update.is_admin == Some(false) || update.account_status.is_some()) {
        return Err(AppError::bad_request(
            "Admins cannot change their own admin or account status.",
        ));
    }
    let user = state
        .users
        .update_status(id, update)
        .await?
        .ok_or_else(|| AppError::not_found("User profile not found."))?;
    info!(user_id = %id, "user status updated");
    Ok(Json(user))
}

#[instrument(skip(state, _admin))]
pub async fn search_listings(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(query): Query<ListingQuery>,
) -> ApiResult<Json<PageOf<Listing>>> {
    let (filter, page) = query.into_parts()?;
    let (items, total) = state.listings.search(&filter, &page).await?;
    Ok(Json(PageOf::new(items, total, page.paging)))
}

#[instrument(skip(state, _admin, payload))]
pub async fn set_visibility(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
    Json(payload): Json<VisibilityRequest>,
) -> ApiResult<Json<Listing>> {
    let listing = state
        .listings
        .set_hidden(id, payload.is_hidden)
        .await?
        .ok_or_else(|| AppError::not_found("Property not found"))?;
    info!(listing_id = %id, hidden = payload.is_hidden, "listing visibility changed");
    Ok(Json(listing))
}

#[instrument(skip(state, _admin, payload))]
pub async fn set_featured(
    State(state): State<AppState>,
    _admin: AdminUser,
    ApiPath(id): ApiPath<Uuid>,
    Json(payload): Json<FeatureRequest>,
) -> ApiResult<Json<Listing>> {
    let listing = state
        .listings
        .set_featured(id, payload.feature)
        .await?
        .ok_or_else(|| AppError::not_found("Property not found"))?;
    info!(listing_id = %id, featured = payload.feature, "listing feature flag changed");
    Ok(Json(listing))
}

#[instrument(skip(state, admin, payload), fields(admin_id = %admin.id))]
pub async fn delete_multiple(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Json(payload): Json<BulkDeleteRequest>,
) -> ApiResult<Json<BulkDeleteReport>> {
    Ok(Json(delete_many(&state, &payload.listing_ids).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{fake_state, sample_listing, seed_admin, seed_user};

    #[tokio::test]
    async fn approve_only_moves_pending_users() {
        let (state, _) = fake_state();
        let admin = seed_admin(&state).await;
        let pending = seed_user(&state, "p@example.com", ApprovalStatus::Pending).await;
        let fresh = seed_user(&state, "n@example.com", ApprovalStatus::NotStarted).await;

        let Json(res) = approve_user(State(state.clone()), AdminUser(admin.clone()), ApiPath(pending.id))
            .await
            .unwrap();
        assert_eq!(res.message, "User approved successfully.");
        assert_eq!(res.profile.approval_status, ApprovalStatus::Approved);

        let Json(res) = reject_user(State(state.clone()), AdminUser(admin.clone()), ApiPath(pending.id))
            .await
            .unwrap();
        assert_eq!(res.message, "User is already approved.");

        let Json(res) = approve_user(State(state.clone()), AdminUser(admin.clone()), ApiPath(fresh.id))
            .await
            .unwrap();
        assert_eq!(res.message, "User is already not_started.");
        assert_eq!(res.profile.approval_status, ApprovalStatus::NotStarted);

        let err = approve_user(State(state), AdminUser(admin), ApiPath(Uuid::new_v4()))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn pending_list_and_stats() {
        let (state, _) = fake_state();
        let admin = seed_admin(&state).await;
        seed_user(&state, "p1@example.com", ApprovalStatus::Pending).await;
        seed_user(&state, "p2@example.com", ApprovalStatus::Pending).await;
        seed_user(&state, "ok@example.com", ApprovalStatus::Approved).await;
        let mut hidden = sample_listing("Hidden");
        hidden.is_hidden = true;
        state.listings.insert(&hidden).await.unwrap();
        state.listings.insert(&sample_listing("Shown")).await.unwrap();

        let Json(pending) = pending_approvals(State(state.clone()), AdminUser(admin.clone()))
            .await
            .unwrap();
        assert_eq!(pending.len(), 2);

        let Json(s) = stats(State(state), AdminUser(admin)).await.unwrap();
        assert_eq!(s.users_by_approval["pending"], 2);
        assert_eq!(s.listings.total, 2);
        assert_eq!(s.listings.hidden, 1);
    }

    #[tokio::test]
    async fn moderation_search_sees_hidden_listings() {
        let (state, _) = fake_state();
        let admin = seed_admin(&state).await;
        let mut hidden = sample_listing("Hidden gem");
        hidden.is_hidden = true;
        state.listings.insert(&hidden).await.unwrap();

        let query = ListingQuery {
            is_hidden: Some("true".into()),
            ..Default::default()
        };
        let Json(page) = search_listings(State(state.clone()), AdminUser(admin.clone()), Query(query))
            .await
            .unwrap();
        assert_eq!(page.total, 1);

        let Json(shown) = set_visibility(
            State(state.clone()),
            AdminUser(admin.clone()),
            ApiPath(hidden.id),
            Json(VisibilityRequest { is_hidden: false }),
        )
        .await
        .unwrap();
        assert!(!shown.is_hidden);

        let Json(featured) = set_featured(
            State(state),
            AdminUser(admin),
            ApiPath(hidden.id),
            Json(FeatureRequest { feature: true }),
        )
        .await
        .unwrap();
        assert!(featured.is_featured);
    }

    #[tokio::test]
    async fn admins_cannot_block_themselves() {
        let (state, _) = fake_state();
        let admin = seed_admin(&state).await;
        let err = update_user_status(
            State(state),
            AdminUser(admin.clone()),
            ApiPath(admin.id),
            Json(UserStatusRequest {
                account_status: Some(crate::users::repo_types::AccountStatus::Blocked),
                ..Default::default()
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
