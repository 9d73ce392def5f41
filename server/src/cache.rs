//! Cache lifecycle: when the upstream mirror is loaded relative to serving.
//!
//! The controller owns the corpus and a status channel moving through
//! `Empty -> Loading -> Ready` (or back to `Empty` when a load fails before
//! ingesting anything). At most one load cycle runs at a time; concurrent
//! triggers queue on a single-flight mutex and observe the cycle that was
//! already running instead of starting another.

use fetcher::{FetchError, Fetcher};
use parking_lot::{Mutex, RwLock};
use search_core::{Corpus, CorpusStats, MatchStrategy, QueryError, SearchPage, SearchRequest};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// When the load cycle runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LoadMode {
    /// Load completes before the listener accepts connections.
    #[default]
    Eager,
    /// Serve immediately; load on a background task, results fill in as pages arrive.
    Background,
    /// Load on the first query; concurrent first queries share one load.
    Lazy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Empty,
    Loading,
    Ready,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub records: usize,
    pub unique_terms: usize,
    pub requests: usize,
}

#[derive(Debug, thiserror::Error)]
#[error("load failed after ingesting {ingested} records: {source}")]
pub struct LoadError {
    pub ingested: usize,
    #[source]
    pub source: FetchError,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CacheOptions {
    pub mode: LoadMode,
    pub strategy: MatchStrategy,
    /// Eager mode only: go `Ready` with an empty corpus instead of treating a
    /// failed startup load as fatal.
    pub serve_empty_on_failure: bool,
}

type BackgroundLoad = JoinHandle<Result<LoadReport, LoadError>>;

struct Inner {
    fetcher: Fetcher,
    options: CacheOptions,
    corpus: RwLock<Corpus>,
    status: watch::Sender<CacheStatus>,
    single_flight: tokio::sync::Mutex<()>,
    cycles_started: AtomicU64,
    cycles_finished: AtomicU64,
    last_report: Mutex<Option<LoadReport>>,
    background: Mutex<Option<BackgroundLoad>>,
}

#[derive(Clone)]
pub struct CacheController {
    inner: Arc<Inner>,
}

impl CacheController {
    pub fn new(fetcher: Fetcher, options: CacheOptions) -> Self {
        let (status, _) = watch::channel(CacheStatus::Empty);
        Self {
            inner: Arc::new(Inner {
                fetcher,
                corpus: RwLock::new(Corpus::new(options.strategy)),
                options,
                status,
                single_flight: tokio::sync::Mutex::new(()),
                cycles_started: AtomicU64::new(0),
                cycles_finished: AtomicU64::new(0),
                last_report: Mutex::new(None),
                background: Mutex::new(None),
            }),
        }
    }

    pub fn mode(&self) -> LoadMode {
        self.inner.options.mode
    }

    pub fn strategy(&self) -> MatchStrategy {
        self.inner.options.strategy
    }

    pub fn status(&self) -> CacheStatus {
        *self.inner.status.borrow()
    }

    /// Number of load cycles started since creation.
    pub fn load_cycles(&self) -> u64 {
        self.inner.cycles_started.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> CorpusStats {
        self.inner.corpus.read().stats()
    }

    /// Kick off loading the way the configured mode wants it at startup.
    ///
    /// Eager awaits the full load; a failure is returned unless
    /// `serve_empty_on_failure` is set. Background spawns the load task.
    /// Lazy does nothing until the first query.
    pub async fn start(&self) -> Result<(), LoadError> {
        match self.mode() {
            LoadMode::Eager => match self.load().await {
                Ok(report) => {
                    tracing::info!(records = report.records, unique_terms = report.unique_terms, "cache ready");
                    Ok(())
                }
                Err(err) if self.inner.options.serve_empty_on_failure => {
                    tracing::warn!(error = %err, "initial load failed, serving degraded cache");
                    Ok(())
                }
                Err(err) => Err(err),
            },
            LoadMode::Background => {
                self.spawn_background();
                Ok(())
            }
            LoadMode::Lazy => {
                tracing::info!("cache will load on first query");
                Ok(())
            }
        }
    }

    /// Run a load cycle unless the cache is already `Ready`, degraded or not.
    pub async fn load(&self) -> Result<LoadReport, LoadError> {
        let _flight = self.inner.single_flight.lock().await;
        let cached = *self.inner.last_report.lock();
        if let (CacheStatus::Ready, Some(report)) = (self.status(), cached) {
            return Ok(report);
        }
        self.run_cycle().await
    }

    /// Load on demand. Callers that queued behind a cycle which finished
    /// while they waited return without starting another, whatever that
    /// cycle's outcome.
    pub async fn ensure_loaded(&self) {
        if self.status() == CacheStatus::Ready {
            return;
        }
        let seen = self.inner.cycles_finished.load(Ordering::Acquire);
        let _flight = self.inner.single_flight.lock().await;
        if self.status() == CacheStatus::Ready || self.inner.cycles_finished.load(Ordering::Acquire) != seen {
            return;
        }
        // Failures are logged inside the cycle; queries see whatever was ingested.
        let _ = self.run_cycle().await;
    }

    /// Wait until some load cycle has brought the cache to `Ready`.
    pub async fn wait_ready(&self) {
        let mut rx = self.inner.status.subscribe();
        let _ = rx.wait_for(|s| *s == CacheStatus::Ready).await;
    }

    /// Start the load on a tokio task owned by the controller. A second call
    /// while a task is held is a no-op.
    pub fn spawn_background(&self) {
        let mut slot = self.inner.background.lock();
        if slot.is_some() {
            return;
        }
        let this = self.clone();
        *slot = Some(tokio::spawn(async move { this.load().await }));
    }

    /// Await the background load, if one was spawned and not yet joined.
    pub async fn join_background(&self) -> Option<Result<LoadReport, LoadError>> {
        let handle = self.inner.background.lock().take()?;
        match handle.await {
            Ok(outcome) => Some(outcome),
            Err(err) => {
                tracing::error!(error = %err, "background load task did not complete");
                None
            }
        }
    }

    pub fn abort_background(&self) {
        if let Some(handle) = self.inner.background.lock().take() {
            if !handle.is_finished() {
                tracing::info!("aborting background load");
            }
            handle.abort();
        }
    }

    /// Validate, make sure the mode's readiness rule holds, then resolve.
    ///
    /// Invalid pagination is rejected before any loading is triggered. In eager
    /// mode this waits for `Ready`, so `start` (or `load`) must be called on
    /// the controller, otherwise the call never returns.
    pub async fn search(&self, query: &str, page: i64, page_size: i64) -> Result<SearchPage, QueryError> {
        let request = SearchRequest::new(query, page, page_size)?;
        match self.mode() {
            LoadMode::Eager => self.wait_ready().await,
            LoadMode::Lazy => self.ensure_loaded().await,
            LoadMode::Background => {}
        }
        Ok(self.inner.corpus.read().search(&request))
    }

    // Caller holds `single_flight`.
    async fn run_cycle(&self) -> Result<LoadReport, LoadError> {
        let inner = &*self.inner;
        let cycle = inner.cycles_started.fetch_add(1, Ordering::AcqRel) + 1;
        *inner.corpus.write() = Corpus::new(inner.options.strategy);
        inner.status.send_replace(CacheStatus::Loading);
        tracing::info!(
            cycle,
            mode = ?inner.options.mode,
            strategy = %inner.options.strategy,
            base_url = %inner.fetcher.config().base_url,
            "cache load started"
        );

        let mut pages = 0usize;
        let fetched = inner
            .fetcher
            .fetch_pages(|page| {
                inner.corpus.write().ingest(page);
                pages += 1;
            })
            .await;
        let stats = inner.corpus.read().stats();

        let outcome = match fetched {
            Ok(summary) => {
                let report = LoadReport {
                    records: stats.records,
                    unique_terms: stats.unique_terms,
                    requests: summary.requests,
                };
                *inner.last_report.lock() = Some(report);
                inner.status.send_replace(CacheStatus::Ready);
                tracing::info!(cycle, records = report.records, unique_terms = report.unique_terms, "cache load finished");
                Ok(report)
            }
            Err(source) => {
                let degrade = match inner.options.mode {
                    LoadMode::Eager => inner.options.serve_empty_on_failure,
                    LoadMode::Background | LoadMode::Lazy => stats.records > 0,
                };
                if degrade {
                    let records = match inner.options.mode {
                        LoadMode::Eager => {
                            *inner.corpus.write() = Corpus::new(inner.options.strategy);
                            0
                        }
                        LoadMode::Background | LoadMode::Lazy => stats.records,
                    };
                    // The failed request counts too.
                    *inner.last_report.lock() = Some(LoadReport {
                        records,
                        unique_terms: if records == 0 { 0 } else { stats.unique_terms },
                        requests: pages + 1,
                    });
                    inner.status.send_replace(CacheStatus::Ready);
                    tracing::warn!(cycle, error = %source, records, "cache load failed, serving degraded corpus");
                } else {
                    *inner.corpus.write() = Corpus::new(inner.options.strategy);
                    inner.status.send_replace(CacheStatus::Empty);
                    tracing::error!(cycle, error = %source, "cache load failed");
                }
                Err(LoadError { ingested: stats.records, source })
            }
        };
        inner.cycles_finished.fetch_add(1, Ordering::AcqRel);
        outcome
    }
}
