//! One-time password reset codes.
//!
//! A code moves `awaiting_code -> verified -> complete`. `failed` is reached
//! after too many wrong guesses; an expired code is discarded. Both are dead
//! ends and need a fresh request. Only the SHA-256 digest of a code is ever
//! stored.

use rand::{rngs::OsRng, Rng};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use time::OffsetDateTime;

pub const CODE_DIGITS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeState {
    AwaitingCode,
    Verified,
    Complete,
    Failed,
}

impl CodeState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingCode => "awaiting_code",
            Self::Verified => "verified",
            Self::Complete => "complete",
            Self::Failed => "failed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "awaiting_code" => Some(Self::AwaitingCode),
            "verified" => Some(Self::Verified),
            "complete" => Some(Self::Complete),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }
}

/// Which step of the flow is presenting the code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeStep {
    Verify,
    Redeem,
}

/// Outcome of presenting a code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeCheck {
    Accepted,
    Mismatch { remaining: i32 },
    Locked,
    Expired,
    Used,
    NotVerified,
    Missing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetCode {
    pub email: String,
    pub digest: String,
    pub expires_at: OffsetDateTime,
    pub attempts: i32,
    pub state: CodeState,
}

impl ResetCode {
    pub fn new(email: &str, digest: String, expires_at: OffsetDateTime) -> Self {
        Self {
            email: email.to_string(),
            digest,
            expires_at,
            attempts: 0,
            state: CodeState::AwaitingCode,
        }
    }

    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        now >= self.expires_at
    }

    /// Applies one presentation of `digest` and mutates the record to
    /// match. The caller persists the result under the same lock it read
    /// the record with.
    pub fn attempt(
        &mut self,
        digest: &str,
        now: OffsetDateTime,
        step: CodeStep,
        max_attempts: i32,
    ) -> CodeCheck {
        match self.state {
            CodeState::Complete => return CodeCheck::Used,
            CodeState::Failed => return CodeCheck::Locked,
            CodeState::AwaitingCode | CodeState::Verified => {}
        }
        if self.is_expired(now) {
            return CodeCheck::Expired;
        }
        if !digests_match(&self.digest, digest) {
            self.attempts += 1;
            if self.attempts >= max_attempts {
                self.state = CodeState::Failed;
                return CodeCheck::Locked;
            }
            return CodeCheck::Mismatch {
                remaining: max_attempts - self.attempts,
            };
        }
        match step {
            CodeStep::Verify => {
                self.state = CodeState::Verified;
                CodeCheck::Accepted
            }
            CodeStep::Redeem if self.state == CodeState::Verified => {
                self.state = CodeState::Complete;
                CodeCheck::Accepted
            }
            CodeStep::Redeem => CodeCheck::NotVerified,
        }
    }
}

/// Six random decimal digits.
pub fn generate_code() -> String {
    format!("{:0width$}", OsRng.gen_range(0..1_000_000u32), width = CODE_DIGITS)
}

/// Hex SHA-256 of the code bound to its email, so equal codes issued to
/// different accounts never share a digest.
pub fn code_digest(email: &str, code: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.as_bytes());
    hasher.update(b":");
    hasher.update(code.trim().as_bytes());
    hex::encode(hasher.finalize())
}

fn digests_match(a: &str, b: &str) -> bool {
    a.len() == b.len() && bool::from(a.as_bytes().ct_eq(b.as_bytes()))
}
