use serde::{Deserialize, Serialize, Serializer};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Whether a user may create listings. Stored as free text; values outside
/// the four known states are kept verbatim rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalStatus {
    NotStarted,
    Pending,
    Approved,
    Rejected,
    Unrecognized(String),
}

impl ApprovalStatus {
    pub const KNOWN: [ApprovalStatus; 4] = [
        ApprovalStatus::NotStarted,
        ApprovalStatus::Pending,
        ApprovalStatus::Approved,
        ApprovalStatus::Rejected,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::NotStarted => "not_started",
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
            Self::Unrecognized(raw) => raw,
        }
    }

    /// Lenient parse used when reading stored rows.
    pub fn from_stored(raw: &str) -> Self {
        Self::parse_known(raw).unwrap_or_else(|| Self::Unrecognized(raw.to_string()))
    }

    /// Strict parse used for client input.
    pub fn parse_known(raw: &str) -> Option<Self> {
        match raw {
            "not_started" => Some(Self::NotStarted),
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl Serialize for ApprovalStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Active,
    Blocked,
}

impl AccountStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Blocked => "blocked",
        }
    }

    /// Anything that is not explicitly active is treated as blocked.
    pub fn from_stored(raw: &str) -> Self {
        if raw == "active" {
            Self::Active
        } else {
            Self::Blocked
        }
    }
}

/// User record as stored in the `users` table.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub display_name: Option<String>,
    pub approval_status: String,
    pub account_status: String,
    pub govt_id_url: Option<String>,
    pub is_admin: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// User profile as seen by the rest of the application.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // argon2 PHC string, never exposed
    pub display_name: Option<String>,
    pub approval_status: ApprovalStatus,
    pub account_status: AccountStatus,
    pub govt_id_url: Option<String>,
    pub is_admin: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        Self {
            id: r.id,
            email: r.email,
            password_hash: r.password_hash,
            display_name: r.display_name,
            approval_status: ApprovalStatus::from_stored(&r.approval_status),
            account_status: AccountStatus::from_stored(&r.account_status),
            govt_id_url: r.govt_id_url,
            is_admin: r.is_admin,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

impl User {
    pub fn is_blocked(&self) -> bool {
        self.account_status == AccountStatus::Blocked
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub display_name: Option<String>,
}

/// Admin-side changes to a user; absent fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserStatusUpdate {
    pub is_admin: Option<bool>,
    pub approval_status: Option<ApprovalStatus>,
    pub account_status: Option<AccountStatus>,
}

#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub search: Option<String>,
    pub status: Option<ApprovalStatus>,
}

impl UserFilter {
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, user: &User) -> bool {
        if let Some(status) = &self.status {
            if &user.approval_status != status {
                return false;
            }
        }
        match self.search_term() {
            Some(term) => {
                user.email.to_lowercase().contains(&term)
                    || user
                        .display_name
                        .as_deref()
                        .is_some_and(|n| n.to_lowercase().contains(&term))
            }
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_status_parsing() {
        assert_eq!(ApprovalStatus::from_stored("pending"), ApprovalStatus::Pending);
        assert_eq!(
            ApprovalStatus::from_stored("on_hold"),
            ApprovalStatus::Unrecognized("on_hold".into())
        );
        assert_eq!(ApprovalStatus::parse_known("on_hold"), None);
        for s in ApprovalStatus::KNOWN {
            assert_eq!(ApprovalStatus::parse_known(s.as_str()), Some(s.clone()));
        }
    }

    #[test]
    fn approval_status_serializes_as_stored_text() {
        let json = serde_json::to_string(&ApprovalStatus::NotStarted).unwrap();
        assert_eq!(json, "\"not_started\"");
        let json = serde_json::to_string(&ApprovalStatus::Unrecognized("legacy".into())).unwrap();
        assert_eq!(json, "\"legacy\"");
    }

    #[test]
    fn unknown_account_status_fails_closed() {
        assert_eq!(AccountStatus::from_stored("active"), AccountStatus::Active);
        assert_eq!(AccountStatus::from_stored("suspended"), AccountStatus::Blocked);
    }

    #[test]
    fn user_json_hides_password_hash() {
        let now = OffsetDateTime::now_utc();
        let user = User::from(UserRow {
            id: Uuid::new_v4(),
            email: "test@example.com".into(),
            password_hash: "$argon2id$secret".into(),
            display_name: Some("Test".into()),
            approval_status: "approved".into(),
            account_status: "active".into(),
            govt_id_url: None,
            is_admin: false,
            created_at: now,
            updated_at: now,
        });
        let json = serde_json::to_string(&user).unwrap();
        assert!(json.contains("test@example.com"));
        assert!(json.contains("\"approvalStatus\":\"approved\""));
        assert!(!json.contains("argon2"));
    }
}
