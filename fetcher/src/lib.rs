//! Paginated client for the upstream message store.
//!
//! The upstream is walked with `?skip=<offset>&limit=<page_size>` until it
//! signals the end, either with an empty `items` list or with one of the
//! configured terminal statuses (HTTP 400 by default).

use reqwest::{header, Client};
use search_core::Record;
use serde::Deserialize;
use std::time::Duration;

pub use reqwest::{StatusCode, Url};

pub const DEFAULT_PAGE_SIZE: usize = 1000;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);
pub const DEFAULT_USER_AGENT: &str = concat!("message-mirror/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Clone)]
pub struct FetcherConfig {
    pub base_url: Url,
    pub page_size: usize,
    /// Applied to every page request on its own.
    pub timeout: Duration,
    /// Statuses that mean "no more data" rather than failure.
    pub terminal_statuses: Vec<StatusCode>,
    pub user_agent: String,
}

impl FetcherConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            page_size: DEFAULT_PAGE_SIZE,
            timeout: DEFAULT_TIMEOUT,
            terminal_statuses: vec![StatusCode::BAD_REQUEST],
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_terminal_statuses(mut self, statuses: Vec<StatusCode>) -> Self {
        self.terminal_statuses = statuses;
        self
    }

    pub fn is_terminal(&self, status: StatusCode) -> bool {
        self.terminal_statuses.contains(&status)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid fetcher config: {0}")]
    InvalidConfig(String),
    #[error("failed to build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("upstream returned {status} at skip={offset}")]
    Status { status: StatusCode, offset: usize },
    #[error("request failed at skip={offset}: {source}")]
    Transport {
        offset: usize,
        #[source]
        source: reqwest::Error,
    },
    #[error("malformed page at skip={offset}: {source}")]
    Decode {
        offset: usize,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Offset of the page that failed, when the failure came from a request.
    pub fn offset(&self) -> Option<usize> {
        match self {
            FetchError::Status { offset, .. }
            | FetchError::Transport { offset, .. }
            | FetchError::Decode { offset, .. } => Some(*offset),
            FetchError::InvalidConfig(_) | FetchError::Client(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchSummary {
    pub records: usize,
    /// HTTP requests issued, including the one that hit the end of data.
    pub requests: usize,
}

#[derive(Deserialize)]
struct PageBody {
    items: Vec<Record>,
}

enum Page {
    Items(Vec<Record>),
    End,
}

pub struct Fetcher {
    client: Client,
    config: FetcherConfig,
}

impl Fetcher {
    pub fn new(config: FetcherConfig) -> Result<Self, FetchError> {
        if config.page_size == 0 {
            return Err(FetchError::InvalidConfig("page_size must be >= 1".into()));
        }
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetcherConfig {
        &self.config
    }

    /// Fetch every page and return the records in upstream order.
    pub async fn fetch_all(&self) -> Result<Vec<Record>, FetchError> {
        let mut all = Vec::new();
        self.fetch_pages(|page| all.extend(page)).await?;
        Ok(all)
    }

    /// Fetch every page, handing each one to `on_page` as it arrives.
    ///
    /// On failure the pages already handed over stay with the caller; the
    /// error carries the offset of the page that failed.
    pub async fn fetch_pages<F>(&self, mut on_page: F) -> Result<FetchSummary, FetchError>
    where
        F: FnMut(Vec<Record>),
    {
        let mut summary = FetchSummary::default();
        let mut offset = 0usize;
        loop {
            summary.requests += 1;
            match self.fetch_page(offset).await? {
                Page::End => break,
                Page::Items(items) if items.is_empty() => break,
                Page::Items(items) => {
                    tracing::debug!(offset, count = items.len(), "fetched page");
                    summary.records += items.len();
                    on_page(items);
                    offset = offset.saturating_add(self.config.page_size);
                }
            }
        }
        tracing::info!(records = summary.records, requests = summary.requests, "reached end of upstream data");
        Ok(summary)
    }

    async fn fetch_page(&self, offset: usize) -> Result<Page, FetchError> {
        let resp = self
            .client
            .get(self.config.base_url.clone())
            .header(header::ACCEPT, "application/json")
            .query(&[("skip", offset), ("limit", self.config.page_size)])
            .send()
            .await
            .map_err(|source| FetchError::Transport { offset, source })?;

        let status = resp.status();
        if self.config.is_terminal(status) {
            tracing::debug!(offset, %status, "terminal status from upstream");
            return Ok(Page::End);
        }
        if !status.is_success() {
            return Err(FetchError::Status { status, offset });
        }

        let bytes = resp.bytes().await.map_err(|source| FetchError::Transport { offset, source })?;
        let body: PageBody =
            serde_json::from_slice(&bytes).map_err(|source| FetchError::Decode { offset, source })?;
        Ok(Page::Items(body.items))
    }
}
