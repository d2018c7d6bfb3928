use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use regex::Regex;
use serde::Serialize;
use tracing::error;

use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 8;

lazy_static! {
    static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    static ref SPECIAL_RE: Regex = Regex::new(r#"[!@#$%^&*()_+\-=\[\]{};':"\\|,.<>/?]"#).unwrap();
}

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

/// Per-criterion result of the password rules, reported to clients so the
/// form can tick each requirement off independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordStrength {
    pub has_min_length: bool,
    pub has_number: bool,
    pub has_special: bool,
    pub has_uppercase: bool,
    pub has_lowercase: bool,
}

impl PasswordStrength {
    pub fn check(password: &str) -> Self {
        Self {
            has_min_length: password.chars().count() >= MIN_PASSWORD_LEN,
            has_number: password.chars().any(|c| c.is_ascii_digit()),
            has_special: SPECIAL_RE.is_match(password),
            has_uppercase: password.chars().any(|c| c.is_ascii_uppercase()),
            has_lowercase: password.chars().any(|c| c.is_ascii_lowercase()),
        }
    }

    pub fn is_valid(&self) -> bool {
        self.has_min_length
            && self.has_number
            && self.has_special
            && self.has_uppercase
            && self.has_lowercase
    }

    /// Fails with every criterion attached when any one is unmet.
    pub fn require(password: &str) -> Result<(), AppError> {
        let strength = Self::check(password);
        if strength.is_valid() {
            Ok(())
        } else {
            Err(AppError::WeakPassword(strength))
        }
    }
}
