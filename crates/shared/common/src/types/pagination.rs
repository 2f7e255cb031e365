//! Pagination types for list queries.

use serde::{Deserialize, Serialize};

use domain::{status, DomainError, DomainResult};

/// Validated page request. Pages are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaginationParams {
    pub page: u64,
    pub limit: u64,
}

impl PaginationParams {
    /// Both `page` and `limit` must be at least 1.
    pub fn new(page: u64, limit: u64) -> DomainResult<Self> {
        if page == 0 {
            return Err(DomainError::invalid_field("page", "Page must be at least 1."));
        }
        if limit == 0 {
            return Err(DomainError::invalid_field("limit", "Limit must be at least 1."));
        }
        Ok(Self { page, limit })
    }

    /// Number of matching items preceding this page
    pub fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

/// Paginated response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub page: u64,
    pub limit: u64,
    /// Items returned in this page
    pub filter_count: u64,
    /// Items matching the filter across all pages
    pub total_count: u64,
    pub status: u16,
    pub message: String,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, params: PaginationParams, total_count: u64, message: impl Into<String>) -> Self {
        Self {
            filter_count: data.len() as u64,
            data,
            page: params.page,
            limit: params.limit,
            total_count,
            status: status::OK,
            message: message.into(),
        }
    }

    /// Number of pages needed to cover `total_count`
    pub fn total_pages(&self) -> u64 {
        if self.limit > 0 {
            self.total_count.div_ceil(self.limit)
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::ErrorKind;

    #[test]
    fn test_offset() {
        assert_eq!(PaginationParams::new(1, 10).unwrap().offset(), 0);
        assert_eq!(PaginationParams::new(3, 10).unwrap().offset(), 20);
    }

    #[test]
    fn test_zero_page_or_limit_rejected() {
        let error = PaginationParams::new(0, 10).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Validation);
        assert_eq!(error.field(), Some("page"));

        let error = PaginationParams::new(1, 0).unwrap_err();
        assert_eq!(error.field(), Some("limit"));
    }

    #[test]
    fn test_paginated_counts() {
        let params = PaginationParams::new(2, 3).unwrap();
        let page = Paginated::new(vec![1, 2], params, 5, "ok");

        assert_eq!(page.filter_count, 2);
        assert_eq!(page.total_count, 5);
        assert_eq!(page.total_pages(), 2);
    }

    #[test]
    fn test_paginated_shape() {
        let params = PaginationParams::new(1, 2).unwrap();
        let json = serde_json::to_value(Paginated::new(vec!["a"], params, 1, "ok")).unwrap();

        assert_eq!(json["filterCount"], 1);
        assert_eq!(json["totalCount"], 1);
        assert_eq!(json["page"], 1);
        assert_eq!(json["limit"], 2);
        assert_eq!(json["status"], 200);
    }
}
