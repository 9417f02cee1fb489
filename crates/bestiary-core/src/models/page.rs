//! Pagination request and result

use serde::{Deserialize, Serialize};

/// Default page size when the caller omits `limit`
pub const DEFAULT_LIMIT: u32 = 20;

/// Paginated listing request
///
/// No upper bound is placed on `limit`: a caller asking for a huge page
/// receives one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PageRequest {
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub offset: Option<u32>,
    /// Exact category name to filter on
    #[serde(default)]
    pub category: Option<String>,
}

impl PageRequest {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: Some(limit),
            offset: Some(offset),
            category: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Page size, `DEFAULT_LIMIT` when omitted. `Some(0)` means an empty
    /// page (with the correct total), not "no limit".
    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_LIMIT)
    }

    pub fn offset(&self) -> u32 {
        self.offset.unwrap_or(0)
    }

    /// Category to filter on; an empty name means no filter
    pub fn category_filter(&self) -> Option<&str> {
        self.category.as_deref().filter(|name| !name.is_empty())
    }

    /// Request with defaults filled in, used for cache keys so that
    /// `limit: None` and `limit: Some(20)` share an entry (likewise an
    /// empty category and no category)
    pub fn normalized(&self) -> Self {
        Self {
            limit: Some(self.limit()),
            offset: Some(self.offset()),
            category: self.category_filter().map(str::to_string),
        }
    }
}

/// One page of results plus the filtered total before paging
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let req = PageRequest::default();
        assert_eq!(req.limit(), 20);
        assert_eq!(req.offset(), 0);
        assert!(req.category.is_none());
    }

    #[test]
    fn test_normalized_fills_defaults() {
        let req = PageRequest::default().with_category("Fire");
        let norm = req.normalized();

        assert_eq!(norm.limit, Some(20));
        assert_eq!(norm.offset, Some(0));
        assert_eq!(norm.category.as_deref(), Some("Fire"));
        assert_eq!(norm, PageRequest::new(20, 0).with_category("Fire"));
    }

    #[test]
    fn test_empty_category_is_no_filter() {
        let req = PageRequest::new(5, 0).with_category("");

        assert!(req.category_filter().is_none());
        assert_eq!(req.normalized(), PageRequest::new(5, 0));
        assert_eq!(
            PageRequest::new(5, 0).with_category(" ").category_filter(),
            Some(" ")
        );
    }
}
