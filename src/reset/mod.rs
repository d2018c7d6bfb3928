//! Three-step password reset with single-use codes.

use crate::state::AppState;
use axum::Router;

pub mod code;
pub mod dto;
pub mod handlers;
pub mod notifier;
pub mod repo;
pub mod services;

pub fn router() -> Router<AppState> {
    handlers::reset_routes()
}
