use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::{auth::password::PasswordStrength, users::repo::CreateUserError};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, AppError>;

/// Every failure a handler can surface, mapped onto one status code each.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Password does not meet the requirements.")]
    WeakPassword(PasswordStrength),
    /// A handler ran without something an earlier layer must provide.
    #[error("{0}")]
    Precondition(String),
    /// Store, notifier or LLM failure; `details` is for diagnostics only.
    #[error("{message}")]
    Upstream { message: String, details: String },
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn upstream(message: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Upstream {
            message: message.into(),
            details: format!("{err:#}"),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::WeakPassword(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Precondition(_) | Self::Upstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::upstream("Internal server error", err)
    }
}

impl From<CreateUserError> for AppError {
    fn from(err: CreateUserError) -> Self {
        match err {
            CreateUserError::DuplicateEmail => Self::Conflict("Email already registered".into()),
            CreateUserError::Store(e) => e.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::WeakPassword(strength) => json!({
                "message": self.to_string(),
                "requirements": strength,
            }),
            Self::Upstream { message, details } => {
                error!(%status, %message, %details, "upstream failure");
                json!({ "message": message, "details": details })
            }
            Self::Precondition(message) => {
                error!(%status, %message, "request precondition violated");
                json!({ "message": message })
            }
            _ => json!({ "message": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
