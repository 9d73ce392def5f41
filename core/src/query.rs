use crate::record::Record;
use serde::Serialize;
use std::sync::Arc;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 20;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("page and page_size must be >= 1")]
    InvalidPagination { page: i64, page_size: i64 },
}

/// A validated search request. Construction is the only place pagination
/// bounds are checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    query: String,
    page: usize,
    page_size: usize,
}

impl SearchRequest {
    pub fn new(query: impl Into<String>, page: i64, page_size: i64) -> Result<Self, QueryError> {
        if page < 1 || page_size < 1 {
            return Err(QueryError::InvalidPagination { page, page_size });
        }
        // Values beyond usize only ever select an empty page.
        let page = usize::try_from(page).unwrap_or(usize::MAX);
        let page_size = usize::try_from(page_size).unwrap_or(usize::MAX);
        Ok(Self { query: query.into(), page, page_size })
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Half-open `[start, end)` window into a match set of `len` items.
    pub fn window(&self, len: usize) -> (usize, usize) {
        let start = (self.page - 1).saturating_mul(self.page_size).min(len);
        let end = start.saturating_add(self.page_size).min(len);
        (start, end)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchPage {
    pub query: String,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub items: Vec<Arc<Record>>,
}

impl SearchPage {
    /// Cut one page out of an already ordered, deduplicated match set.
    pub fn paginate(request: &SearchRequest, matches: Vec<Arc<Record>>) -> Self {
        let total = matches.len();
        let (start, end) = request.window(total);
        let items = matches.into_iter().skip(start).take(end - start).collect();
        Self {
            query: request.query.clone(),
            total,
            page: request.page,
            page_size: request.page_size,
            items,
        }
    }
}
