use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::jwt::{JwtKeys, TokenKind};
use crate::{error::AppError, state::AppState, users::repo_types::User};

/// Extracts and validates the bearer access token, returning the user ID.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Authorization token missing.".into()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization header.".into()))?;

        let claims = match keys.verify(token) {
            Ok(c) => c,
            Err(e) => {
                warn!(error = %e, "invalid or expired token");
                return Err(AppError::Unauthorized("Invalid or expired token.".into()));
            }
        };

        if claims.kind != TokenKind::Access {
            return Err(AppError::Unauthorized("Access token required.".into()));
        }

        Ok(AuthUser(claims.sub))
    }
}

/// Authenticated caller with their stored profile.
///
/// Reuses a profile already attached by [`load_profile`]; otherwise looks it
/// up. Blocked accounts are refused here so no handler sees them.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<User>() {
            return Ok(CurrentUser(user.clone()));
        }

        let AuthUser(user_id) = AuthUser::from_request_parts(parts, state).await?;
        let user = state
            .users
            .find_by_id(user_id)
            .await
            .map_err(|e| AppError::upstream("Server error retrieving user profile data.", e))?
            .ok_or_else(|| {
                warn!(%user_id, "authenticated user has no profile");
                AppError::forbidden(
                    "User profile not found. Please complete profile setup or log in again.",
                )
            })?;

        if user.is_blocked() {
            warn!(%user_id, "blocked account refused");
            return Err(AppError::forbidden("Your account has been blocked."));
        }

        debug!(%user_id, "user profile loaded");
        Ok(CurrentUser(user))
    }
}

/// [`CurrentUser`] that must also be an admin.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(user) = CurrentUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            warn!(user_id = %user.id, email = %user.email, "admin check failed");
            return Err(AppError::forbidden("Forbidden: Requires admin privileges."));
        }
        Ok(AdminUser(user))
    }
}

/// Middleware: authenticate, load the caller's profile and attach it to the
/// request extensions for later layers and handlers.
pub async fn load_profile(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let (mut parts, body) = req.into_parts();
    let CurrentUser(user) = CurrentUser::from_request_parts(&mut parts, &state).await?;
    parts.extensions.insert(user);
    Ok(next.run(Request::from_parts(parts, body)).await)
}

/// Pulls the profile `load_profile` attached; absence means the layers were
/// wired in the wrong order.
pub fn attached_profile(req: &Request) -> Result<&User, AppError> {
    req.extensions().get::<User>().ok_or_else(|| {
        error!(uri = %req.uri(), "profile missing; load_profile must run first");
        AppError::Precondition("User profile data is missing.".into())
    })
}
