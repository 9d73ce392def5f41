use crate::cache::{CacheOptions, LoadMode};
use anyhow::{Context, Result};
use clap::Parser;
use fetcher::{FetcherConfig, StatusCode, Url};
use search_core::MatchStrategy;
use std::net::SocketAddr;
use std::time::Duration;

#[derive(Parser, Debug, Clone)]
#[command(name = "server")]
#[command(about = "Keyword search over an in-memory mirror of a paginated message store")]
pub struct Config {
    /// Upstream endpoint serving `{"items": [...]}` pages
    #[arg(long, env = "BASE_URL")]
    pub base_url: Url,
    /// Host to bind
    #[arg(long, env = "SEARCH_HOST", default_value = "0.0.0.0")]
    pub host: String,
    /// Port to bind
    #[arg(long, env = "SEARCH_PORT", default_value_t = 8080)]
    pub port: u16,
    /// When to load the upstream mirror
    #[arg(long, env = "LOAD_MODE", value_enum, default_value_t = LoadMode::Eager)]
    pub load_mode: LoadMode,
    /// Query matching: inverted-index (whole words) or linear-scan (substring)
    #[arg(long, env = "MATCH_STRATEGY", default_value_t = MatchStrategy::InvertedIndex)]
    pub strategy: MatchStrategy,
    /// Records requested per upstream page
    #[arg(long, env = "FETCH_PAGE_SIZE", default_value_t = fetcher::DEFAULT_PAGE_SIZE)]
    pub fetch_page_size: usize,
    /// Timeout for each upstream page request, in seconds
    #[arg(long, env = "FETCH_TIMEOUT_SECS", default_value_t = 15)]
    pub fetch_timeout_secs: u64,
    /// Upstream statuses meaning "no more pages" (comma-separated)
    #[arg(long, env = "TERMINAL_STATUS", value_delimiter = ',', default_value = "400", value_parser = parse_status)]
    pub terminal_status: Vec<StatusCode>,
    /// In eager mode, serve an empty corpus if the initial load fails
    #[arg(long, env = "SERVE_EMPTY_ON_FAILURE")]
    pub serve_empty_on_failure: bool,
    /// Allowed CORS origins (comma-separated); any origin when unset
    #[arg(long, env = "CORS_ALLOW_ORIGIN")]
    pub cors_allow_origin: Option<String>,
}

fn parse_status(s: &str) -> Result<StatusCode, String> {
    let code: u16 = s.trim().parse().map_err(|_| format!("not a status code: {s}"))?;
    StatusCode::from_u16(code).map_err(|e| e.to_string())
}

impl Config {
    pub fn fetcher_config(&self) -> FetcherConfig {
        FetcherConfig::new(self.base_url.clone())
            .with_page_size(self.fetch_page_size)
            .with_timeout(Duration::from_secs(self.fetch_timeout_secs))
            .with_terminal_statuses(self.terminal_status.clone())
    }

    pub fn cache_options(&self) -> CacheOptions {
        CacheOptions {
            mode: self.load_mode,
            strategy: self.strategy,
            serve_empty_on_failure: self.serve_empty_on_failure,
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", self.host, self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cfg = Config::try_parse_from(["server", "--base-url", "http://upstream/messages/"]).unwrap();
        assert_eq!(cfg.load_mode, LoadMode::Eager);
        assert_eq!(cfg.strategy, MatchStrategy::InvertedIndex);
        assert_eq!(cfg.terminal_status, vec![StatusCode::BAD_REQUEST]);
        assert_eq!(cfg.fetcher_config().page_size, 1000);
        assert_eq!(cfg.bind_addr().unwrap().port(), 8080);
    }

    #[test]
    fn overrides() {
        let cfg = Config::try_parse_from([
            "server",
            "--base-url",
            "http://upstream/messages/",
            "--load-mode",
            "lazy",
            "--strategy",
            "linear-scan",
            "--terminal-status",
            "400,404",
            "--serve-empty-on-failure",
        ])
        .unwrap();
        let opts = cfg.cache_options();
        assert_eq!(opts.mode, LoadMode::Lazy);
        assert_eq!(opts.strategy, MatchStrategy::LinearScan);
        assert!(opts.serve_empty_on_failure);
        assert_eq!(cfg.terminal_status, vec![StatusCode::BAD_REQUEST, StatusCode::NOT_FOUND]);
    }

    #[test]
    fn rejects_bad_status() {
        let res = Config::try_parse_from(["server", "--base-url", "http://upstream/", "--terminal-status", "abc"]);
        assert!(res.is_err());
    }
}
