use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::repo_types::Listing;
use crate::{error::AppError, state::AppState, users::repo_types::User};

/// Per-id outcome of a bulk delete.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub id: String,
    pub deleted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteReport {
    pub deleted_count: usize,
    pub results: Vec<DeleteOutcome>,
}

/// Deletes each id independently. One bad or missing id never stops the
/// rest; store failures are reported on the item they hit.
pub async fn delete_many(state: &AppState, raw_ids: &[String]) -> Result<BulkDeleteReport, AppError> {
    if raw_ids.is_empty() {
        return Err(AppError::bad_request("No listing IDs provided."));
    }

    let mut results = Vec::with_capacity(raw_ids.len());
    for raw in raw_ids {
        let outcome = match Uuid::parse_str(raw.trim()) {
            Err(_) => failure(raw, "Invalid listing ID"),
            Ok(id) => match state.listings.delete(id).await {
                Ok(true) => DeleteOutcome {
                    id: raw.clone(),
                    deleted: true,
                    error: None,
                },
                Ok(false) => failure(raw, "Listing not found"),
                Err(e) => {
                    error!(listing_id = %id, error = ?e, "bulk delete item failed");
                    failure(raw, "Failed to delete listing")
                }
            },
        };
        results.push(outcome);
    }

    let deleted_count = results.iter().filter(|r| r.deleted).count();
    info!(requested = raw_ids.len(), deleted_count, "bulk listing delete");
    Ok(BulkDeleteReport {
        deleted_count,
        results,
    })
}

fn failure(raw: &str, why: &str) -> DeleteOutcome {
    DeleteOutcome {
        id: raw.to_string(),
        deleted: false,
        error: Some(why.to_string()),
    }
}

/// Loads a listing the caller may modify: its creator or any admin.
pub async fn load_owned(state: &AppState, id: Uuid, caller: &User) -> Result<Listing, AppError> {
    let listing = state
        .listings
        .find(id)
        .await?
        .ok_or_else(|| AppError::not_found("Property not found"))?;
    if listing.created_by != caller.id && !caller.is_admin {
        warn!(listing_id = %id, user_id = %caller.id, "listing modification denied");
        return Err(AppError::forbidden(
            "You do not have permission to modify this property.",
        ));
    }
    Ok(listing)
}
