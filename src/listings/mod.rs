use axum::{
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};

use crate::{
    auth::{extractors::load_profile, gate::require_listing_approval},
    state::AppState,
};

pub mod dto;
pub mod filter;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

/// Listing creation runs `load_profile` first, then the approval gate.
/// `route_layer`s wrap outside-in, so the gate is added before the loader.
pub fn router(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/properties",
            post(handlers::create_listing)
                .route_layer(from_fn(require_listing_approval))
                .route_layer(from_fn_with_state(state, load_profile)),
        )
        .route("/properties", get(handlers::list_listings))
        .route(
            "/properties/:id",
            get(handlers::get_listing)
                .put(handlers::update_listing)
                .delete(handlers::delete_listing),
        )
}
