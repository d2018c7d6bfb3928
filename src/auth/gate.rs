//! Listing-approval gate.
//!
//! Only users whose approval status is `approved` may create listings. The
//! profile is loaded by an earlier layer; this gate never touches the store.

use axum::{extract::Request, middleware::Next, response::Response};
use tracing::{debug, error, warn};

use super::extractors::attached_profile;
use crate::{
    error::AppError,
    users::repo_types::{ApprovalStatus, User},
};

pub const PENDING_MESSAGE: &str = "Your listing request is pending approval.";
pub const REJECTED_MESSAGE: &str =
    "Your listing request has been rejected. Please contact support.";
pub const NOT_STARTED_MESSAGE: &str =
    "Please submit your government ID for approval to list properties.";
pub const UNRECOGNIZED_MESSAGE: &str = "Your account is not yet approved to list properties.";
pub const MISSING_PROFILE_MESSAGE: &str = "User profile data is missing.";

/// Classifies a pre-fetched profile.
pub fn check_listing_approval(profile: Option<&User>) -> Result<(), AppError> {
    let Some(user) = profile else {
        error!("approval gate reached without a user profile");
        return Err(AppError::Precondition(MISSING_PROFILE_MESSAGE.into()));
    };

    let denial = match &user.approval_status {
        ApprovalStatus::Approved => {
            debug!(user_id = %user.id, "listing approval granted");
            return Ok(());
        }
        ApprovalStatus::Pending => PENDING_MESSAGE,
        ApprovalStatus::Rejected => REJECTED_MESSAGE,
        ApprovalStatus::NotStarted => NOT_STARTED_MESSAGE,
        ApprovalStatus::Unrecognized(_) => UNRECOGNIZED_MESSAGE,
    };
    warn!(
        user_id = %user.id,
        status = %user.approval_status.as_str(),
        "listing creation denied"
    );
    Err(AppError::forbidden(denial))
}

/// Middleware form of [`check_listing_approval`]. Must be layered inside
/// `load_profile`.
pub async fn require_listing_approval(req: Request, next: Next) -> Result<Response, AppError> {
    check_listing_approval(Some(attached_profile(&req)?))?;
    Ok(next.run(req).await)
}
