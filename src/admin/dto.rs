use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    listings::repo_types::ListingStats,
    pagination::Paging,
    users::repo_types::{AccountStatus, ApprovalStatus, User, UserFilter, UserStatusUpdate},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: i64,
    /// Keyed by approval status as stored.
    pub users_by_approval: BTreeMap<String, i64>,
    pub listings: ListingStats,
}

impl DashboardStats {
    pub fn new(counts: Vec<(String, i64)>, listings: ListingStats) -> Self {
        let mut users_by_approval: BTreeMap<String, i64> = ApprovalStatus::KNOWN
            .iter()
            .map(|s| (s.as_str().to_string(), 0))
            .collect();
        for (status, n) in counts {
            *users_by_approval.entry(status).or_default() += n;
        }
        Self {
            total_users: users_by_approval.values().sum(),
            users_by_approval,
            listings,
        }
    }
}

/// Response to approve/reject, with the profile as it now stands.
#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub message: String,
    pub profile: User,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

impl UserQuery {
    pub fn into_parts(self) -> Result<(UserFilter, Paging), AppError> {
        let status = match self.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => None,
            Some(raw) => Some(
                ApprovalStatus::parse_known(raw)
                    .ok_or_else(|| AppError::bad_request("Invalid status filter."))?,
            ),
        };
        let filter = UserFilter {
            search: self.search,
            status,
        };
        Ok((filter, Paging::new(self.page, self.limit)?))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStatusRequest {
    pub is_admin: Option<bool>,
    pub approval_status: Option<String>,
    pub account_status: Option<AccountStatus>,
}

impl TryFrom<UserStatusRequest> for UserStatusUpdate {
    type Error = AppError;

    fn try_from(r: UserStatusRequest) -> Result<Self, Self::Error> {
        let approval_status = r
            .approval_status
            .as_deref()
            .map(|raw| {
                ApprovalStatus::parse_known(raw)
                    .ok_or_else(|| AppError::bad_request("Invalid approval status."))
            })
            .transpose()?;
        if r.is_admin.is_none() && approval_status.is_none() && r.account_status.is_none() {
            return Err(AppError::bad_request("No status fields provided."));
        }
        Ok(Self {
            is_admin: r.is_admin,
            approval_status,
            account_status: r.account_status,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteRequest {
    #[serde(default)]
    pub listing_ids: Vec<String>,
}
