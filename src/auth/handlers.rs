use axum::{
    extract::{FromRef, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, ChangePasswordRequest, LoginRequest, MessageResponse,
            PasswordStrengthRequest, RefreshRequest, RegisterRequest,
        },
        extractors::CurrentUser,
        jwt::JwtKeys,
        password::{hash_password, is_valid_email, normalize_email, verify_password, PasswordStrength},
    },
    error::{ApiResult, AppError},
    state::AppState,
    users::repo_types::{NewUser, User},
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/change-password", post(change_password))
        .route("/auth/password-strength", post(password_strength))
}

fn issue_tokens(state: &AppState, user: User) -> ApiResult<AuthResponse> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys
        .sign_access(user.id)
        .map_err(|e| AppError::upstream("Could not issue token.", e))?;
    let refresh_token = keys
        .sign_refresh(user.id)
        .map_err(|e| AppError::upstream("Could not issue token.", e))?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user,
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::bad_request("Invalid email"));
    }
    PasswordStrength::require(&payload.password)?;

    if state.users.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = hash_password(&payload.password)?;
    let display_name = payload
        .display_name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    let user = state
        .users
        .create(NewUser {
            email,
            password_hash,
            display_name,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::bad_request("Invalid email"));
    }

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    if user.is_blocked() {
        warn!(user_id = %user.id, "login refused for blocked account");
        return Err(AppError::forbidden("Your account has been blocked."));
    }

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let claims = JwtKeys::from_ref(&state)
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| {
            warn!(error = %e, "refresh rejected");
            AppError::Unauthorized("Invalid refresh token.".into())
        })?;

    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".into()))?;
    if user.is_blocked() {
        return Err(AppError::forbidden("Your account has been blocked."));
    }

    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> ApiResult<Json<MessageResponse>> {
    if !verify_password(&payload.current_password, &user.password_hash)? {
        warn!("current password mismatch");
        return Err(AppError::Unauthorized("Current password is incorrect.".into()));
    }
    PasswordStrength::require(&payload.new_password)?;

    let password_hash = hash_password(&payload.new_password)?;
    if !state.users.update_password(user.id, &password_hash).await? {
        return Err(AppError::not_found("User not found"));
    }

    info!("password changed");
    Ok(Json(MessageResponse::new("Password updated successfully.")))
}

pub async fn password_strength(
    Json(payload): Json<PasswordStrengthRequest>,
) -> Json<PasswordStrength> {
    Json(PasswordStrength::check(&payload.password))
}
