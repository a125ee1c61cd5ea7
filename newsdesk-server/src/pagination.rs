//! Pagination for article listings

use serde::Serialize;

/// Default page size
pub const DEFAULT_LIMIT: i64 = 10;

/// Largest page a client may request
pub const MAX_LIMIT: i64 = 100;

/// Sanitized page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Page number (1-indexed)
    pub page: i64,
    /// Rows per page
    pub limit: i64,
}

impl PageRequest {
    /// Clamp page to at least 1 and limit to `1..=MAX_LIMIT`
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT),
        }
    }

    /// Offset for SQL LIMIT/OFFSET
    pub fn offset(&self) -> i64 {
        (self.page - 1) * self.limit
    }

    pub fn paginate(&self, total: i64) -> Pagination {
        Pagination {
            page: self.page,
            limit: self.limit,
            total,
            pages: (total + self.limit - 1) / self.limit,
        }
    }
}

/// Pagination metadata returned with a listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let p = PageRequest::new(None, None);
        assert_eq!(p, PageRequest { page: 1, limit: 10 });
        assert_eq!(p.offset(), 0);
    }

    #[test]
    fn test_clamps_out_of_range() {
        assert_eq!(PageRequest::new(Some(0), Some(0)), PageRequest { page: 1, limit: 1 });
        assert_eq!(PageRequest::new(Some(-3), Some(500)), PageRequest { page: 1, limit: 100 });
    }

    #[test]
    fn test_offset_and_pages() {
        let p = PageRequest::new(Some(3), Some(20));
        assert_eq!(p.offset(), 40);

        let meta = p.paginate(45);
        assert_eq!(meta.pages, 3);
        assert_eq!(meta.total, 45);
    }

    #[test]
    fn test_empty_result_has_zero_pages() {
        assert_eq!(PageRequest::new(None, None).paginate(0).pages, 0);
    }

    #[test]
    fn test_exact_page_boundary() {
        assert_eq!(PageRequest::new(Some(1), Some(10)).paginate(20).pages, 2);
    }
}
