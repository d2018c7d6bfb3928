use serde::Serialize;

use crate::error::AppError;

pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page: i64,
    pub limit: i64,
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl Paging {
    /// Validates 1-based paging input; oversized limits are clamped.
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Result<Self, AppError> {
        let page = page.unwrap_or(1);
        if page < 1 {
            return Err(AppError::bad_request("Page must be a positive integer."));
        }
        let limit = limit.unwrap_or(DEFAULT_LIMIT);
        if limit < 1 {
            return Err(AppError::bad_request("Limit must be a positive integer."));
        }
        let limit = limit.min(MAX_LIMIT);
        if (page - 1).checked_mul(limit).is_none() {
            return Err(AppError::bad_request("Page is out of range."));
        }
        Ok(Self { page, limit })
    }

    /// Never overflows for values built by [`Paging::new`].
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// One page of results plus the unpaged total.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageOf<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

impl<T> PageOf<T> {
    pub fn new(items: Vec<T>, total: i64, paging: Paging) -> Self {
        let total_pages = (total + paging.limit - 1) / paging.limit;
        Self {
            items,
            total,
            page: paging.page,
            limit: paging.limit,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_offsets() {
        let p = Paging::new(None, None).unwrap();
        assert_eq!(p, Paging::default());
        assert_eq!(p.offset(), 0);
        assert_eq!(Paging::new(Some(3), Some(20)).unwrap().offset(), 40);
    }

    #[test]
    fn rejects_non_positive_and_clamps_large_limits() {
        assert!(Paging::new(Some(0), None).is_err());
        assert!(Paging::new(None, Some(0)).is_err());
        assert_eq!(Paging::new(None, Some(5000)).unwrap().limit, MAX_LIMIT);
    }

    #[test]
    fn huge_page_is_rejected_instead_of_overflowing() {
        let err = Paging::new(Some(i64::MAX), None).unwrap_err();
        assert_eq!(err.status(), axum::http::StatusCode::BAD_REQUEST);
        assert!(Paging::new(Some(i64::MAX / MAX_LIMIT), Some(MAX_LIMIT)).is_ok());
        assert!(Paging::new(Some(i64::MAX / MAX_LIMIT + 2), Some(MAX_LIMIT)).is_err());
    }

    #[test]
    fn total_pages_rounds_up() {
        let page = PageOf::new(vec![1, 2], 21, Paging::new(Some(1), Some(10)).unwrap());
        assert_eq!(page.total_pages, 3);
        let empty: PageOf<i32> = PageOf::new(vec![], 0, Paging::default());
        assert_eq!(empty.total_pages, 0);
    }
}
