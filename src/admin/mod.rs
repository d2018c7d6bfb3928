//! Moderation endpoints. Every handler takes [`AdminUser`], so non-admins
//! are refused before any work happens.
//!
//! [`AdminUser`]: crate::auth::extractors::AdminUser

use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;

pub fn router() -> Router<AppState> {
    handlers::admin_routes()
}
