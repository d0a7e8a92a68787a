//! Query model for paginated list screens.
//!
//! A [`QueryDescriptor`] captures one logical "fetch this list" request:
//! resource, page, page size, filters, and free-text search. Descriptors
//! are immutable once dispatched; every user interaction produces a new
//! descriptor via the `with_*` builders. A [`QueryToken`] tags each
//! dispatch so that late responses for superseded queries can be dropped.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::QueryError;

/// Default number of items per page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Parameters identifying one logical list fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryDescriptor {
    resource: String,
    page: u32,
    page_size: u32,
    filters: BTreeMap<String, String>,
    search: String,
}

impl QueryDescriptor {
    /// Create a descriptor for the first page of a resource with the
    /// default page size and no filters.
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            filters: BTreeMap::new(),
            search: String::new(),
        }
    }

    /// Returns a copy targeting the given page.
    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page;
        self
    }

    /// Returns a copy with the given page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Returns a copy with `field` filtered to `value`.
    ///
    /// Filter keys are unique; setting an existing field replaces its value.
    pub fn with_filter(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    /// Returns a copy with the filter on `field` removed.
    pub fn without_filter(mut self, field: &str) -> Self {
        self.filters.remove(field);
        self
    }

    /// Returns a copy with the given free-text search.
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    /// The logical resource this query targets (e.g. "students").
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// The 1-based page number.
    pub fn page(&self) -> u32 {
        self.page
    }

    /// The page size.
    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// The field filters, in stable key order.
    pub fn filters(&self) -> &BTreeMap<String, String> {
        &self.filters
    }

    /// The free-text search string (possibly empty).
    pub fn search(&self) -> &str {
        &self.search
    }

    /// Validate the descriptor before dispatch.
    ///
    /// # Errors
    ///
    /// Returns an error for page 0 or page size 0; these can never name a
    /// valid page and must be rejected without a network call.
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.page == 0 {
            return Err(QueryError::PageZero);
        }
        if self.page_size == 0 {
            return Err(QueryError::PageSizeZero);
        }
        Ok(())
    }

    /// Encode the descriptor as URL query parameters.
    ///
    /// Produces `page`, `pageSize`, `search` (when non-empty), and one
    /// parameter per filter field.
    pub fn to_query_params(&self) -> Vec<(String, String)> {
        let mut params = vec![
            ("page".to_string(), self.page.to_string()),
            ("pageSize".to_string(), self.page_size.to_string()),
        ];
        if !self.search.is_empty() {
            params.push(("search".to_string(), self.search.clone()));
        }
        for (field, value) in &self.filters {
            params.push((field.clone(), value.clone()));
        }
        params
    }
}

/// A monotonically increasing tag distinguishing dispatch order of queries
/// within one list controller.
///
/// A response is applied to UI state only if its token still equals the
/// controller's current token at resolution time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QueryToken(u64);

impl QueryToken {
    /// Create a token with the given sequence value.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Returns the sequence value.
    pub const fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for QueryToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One page of results for a list screen.
///
/// Derived, never mutated; each fetch produces a fresh result.
#[derive(Debug, Clone, PartialEq)]
pub struct ListResult<T> {
    /// The items on this page, in server order.
    pub items: Vec<T>,
    /// Total number of matching items across all pages.
    pub total_count: u64,
    /// The 1-based page this result covers.
    pub page: u32,
    /// The page size the query asked for.
    pub page_size: u32,
}

impl<T> ListResult<T> {
    /// Number of pages needed to hold `total_count` items.
    ///
    /// An empty result set has zero pages.
    pub fn total_pages(&self) -> u32 {
        if self.page_size == 0 {
            return 0;
        }
        self.total_count.div_ceil(self.page_size as u64) as u32
    }

    /// True if no further page follows this one.
    pub fn is_last_page(&self) -> bool {
        self.page >= self.total_pages()
    }

    /// True if this page holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
