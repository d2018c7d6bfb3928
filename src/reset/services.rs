use std::time::Duration;

use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{error, info, warn, Instrument};

use super::code::{code_digest, generate_code, CodeCheck, CodeStep};
use crate::{
    auth::password::{hash_password, is_valid_email, normalize_email, PasswordStrength},
    error::AppError,
    state::AppState,
};

pub const REQUEST_ACCEPTED: &str =
    "If an account exists for this email, a reset code has been sent.";
pub const CODE_VERIFIED: &str = "Code verified. You may now set a new password.";
pub const PASSWORD_RESET: &str = "Password has been reset successfully.";

fn check_email(raw: &str) -> Result<String, AppError> {
    let email = normalize_email(raw);
    if !is_valid_email(&email) {
        return Err(AppError::bad_request("Invalid email"));
    }
    Ok(email)
}

fn rejection(check: CodeCheck) -> Result<(), AppError> {
    let message = match check {
        CodeCheck::Accepted => return Ok(()),
        CodeCheck::Mismatch { remaining } => {
            format!("Invalid code. {remaining} attempt(s) remaining.")
        }
        CodeCheck::Locked => "Too many failed attempts. Please request a new code.".into(),
        CodeCheck::Expired => "Code has expired. Please request a new code.".into(),
        CodeCheck::Used | CodeCheck::Missing => {
            "No active reset request. Please request a new code.".into()
        }
        CodeCheck::NotVerified => "Code must be verified before resetting the password.".into(),
    };
    Err(AppError::BadRequest(message))
}

/// Step 1. A code record is stored for every well-formed email so later
/// steps behave the same whether or not the account exists. The account
/// lookup and delivery run in a background task, so the response time does
/// not depend on whether the email is registered.
pub async fn request_reset(state: &AppState, raw_email: &str) -> Result<(), AppError> {
    let email = check_email(raw_email)?;
    let reset = &state.config.reset;

    let code = generate_code();
    let now = OffsetDateTime::now_utc();
    let expires_at = now + TimeDuration::minutes(reset.code_ttl_minutes);
    state
        .reset_codes
        .issue(&email, &code_digest(&email, &code), expires_at, now)
        .await
        .map_err(|e| AppError::upstream("Could not start password reset.", e))?;

    tokio::spawn(deliver_code(state.clone(), email, code).in_current_span());
    Ok(())
}

async fn deliver_code(state: AppState, email: String, code: String) {
    let user = match state.users.find_by_email(&email).await {
        Ok(user) => user,
        Err(e) => {
            error!(error = ?e, "reset code delivery skipped: account lookup failed");
            return;
        }
    };
    let Some(user) = user.filter(|u| !u.is_blocked()) else {
        info!("password reset requested for unknown or blocked account");
        return;
    };

    let timeout = Duration::from_secs(state.config.reset.notify_timeout_secs);
    match tokio::time::timeout(timeout, state.notifier.send_reset_code(&email, &code)).await {
        Ok(Ok(())) => info!(user_id = %user.id, "password reset code dispatched"),
        Ok(Err(e)) => error!(user_id = %user.id, error = ?e, "reset code delivery failed"),
        Err(_) => error!(user_id = %user.id, ?timeout, "reset code delivery timed out"),
    }
}

/// Step 2. Leaves the password untouched.
pub async fn verify_code(state: &AppState, raw_email: &str, code: &str) -> Result<(), AppError> {
    let email = check_email(raw_email)?;
    let check = state
        .reset_codes
        .attempt(
            &email,
            &code_digest(&email, code),
            OffsetDateTime::now_utc(),
            CodeStep::Verify,
            state.config.reset.max_attempts,
        )
        .await?;
    if check != CodeCheck::Accepted {
        warn!(outcome = ?check, "reset code verification refused");
    }
    rejection(check)
}

/// Step 3. Everything that can fail on bad input or a missing account runs
/// before the code is touched, so only a successful redemption burns it.
pub async fn confirm_reset(
    state: &AppState,
    raw_email: &str,
    code: &str,
    new_password: &str,
) -> Result<(), AppError> {
    let email = check_email(raw_email)?;
    PasswordStrength::require(new_password)?;
    let password_hash = hash_password(new_password)?;

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!("reset confirmation for unknown account");
        return Err(AppError::bad_request(
            "No active reset request. Please request a new code.",
        ));
    };

    let check = state
        .reset_codes
        .attempt(
            &email,
            &code_digest(&email, code),
            OffsetDateTime::now_utc(),
            CodeStep::Redeem,
            state.config.reset.max_attempts,
        )
        .await?;
    if check != CodeCheck::Accepted {
        warn!(outcome = ?check, "reset code redemption refused");
    }
    rejection(check)?;

    if !state.users.update_password(user.id, &password_hash).await? {
        return Err(AppError::not_found("User not found"));
    }
    info!(user_id = %user.id, "password reset completed");
    Ok(())
}
