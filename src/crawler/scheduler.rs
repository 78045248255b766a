//! Crawl scheduler: recursive same-origin fan-out
//!
//! Every discovered link becomes its own task. A task:
//! 1. Returns if the run is stopped
//! 2. Returns if the link leaves the seed's host
//! 3. Asks the visit ledger for admission
//! 4. Fetches the page through the concurrency gate
//! 5. Extracts the page record and stores it
//! 6. Spawns one child task per outgoing link
//!
//! All tasks are spawned on one run-wide [`TaskTracker`]. A parent is still
//! tracked while it spawns its children, so the tracker only drains once the
//! whole transitive task tree has finished.

use crate::config::{Config, CrawlerConfig, DEFAULT_MAX_CONCURRENCY, DEFAULT_MAX_PAGES};
use crate::crawler::{
    extract_page_data, Admission, CancellationController, ConcurrencyGate, HttpFetcher,
    PageFetcher, PageRecord, VisitLedger,
};
use crate::output::CrawlStats;
use crate::url::{extract_domain, same_host};
use crate::{CrawlError, FetchError, UrlError};
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::task::TaskTracker;
use url::Url;

/// Limits applied to one crawl run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Maximum number of fetches in flight at once
    pub max_concurrency: usize,

    /// Maximum number of distinct pages admitted
    pub max_pages: usize,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            max_pages: DEFAULT_MAX_PAGES,
        }
    }
}

impl From<&CrawlerConfig> for CrawlOptions {
    fn from(config: &CrawlerConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrency,
            max_pages: config.max_pages,
        }
    }
}

/// Everything a finished run produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// The seed URL the run started from
    pub base_url: String,

    /// Extracted pages keyed by normalized URL
    pub pages: HashMap<String, PageRecord>,

    /// Visit counts keyed by normalized URL
    pub visits: HashMap<String, u32>,

    pub stats: CrawlStats,
}

#[derive(Debug, Default)]
struct Counters {
    fetch_failures: AtomicUsize,
    fetches_aborted: AtomicUsize,
    extraction_failures: AtomicUsize,
    invalid_links: AtomicUsize,
    external_links_skipped: AtomicUsize,
}

impl Counters {
    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::Relaxed)
    }
}

/// State shared by every task of one run
struct CrawlContext<F> {
    base_url: Url,
    fetcher: F,
    ledger: VisitLedger,
    gate: ConcurrencyGate,
    cancel: Arc<CancellationController>,
    tracker: TaskTracker,
    pages: Mutex<HashMap<String, PageRecord>>,
    counters: Counters,
}

/// Same-origin crawler over a [`PageFetcher`]
pub struct Crawler<F> {
    context: Arc<CrawlContext<F>>,
}

impl<F: PageFetcher> Crawler<F> {
    /// Prepares a crawl of everything reachable from `seed` on its host
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - ready to [`crawl`](Self::crawl)
    /// * `Err(CrawlError::Url)` - the seed is not an absolute URL with a host
    pub fn new(seed: &str, options: CrawlOptions, fetcher: F) -> crate::Result<Self> {
        let base_url = Url::parse(seed).map_err(|source| UrlError::Parse {
            url: seed.to_string(),
            source,
        })?;
        if extract_domain(&base_url).is_none() {
            return Err(UrlError::MissingHost(seed.to_string()).into());
        }

        let cancel = Arc::new(CancellationController::new());
        let context = CrawlContext {
            base_url,
            fetcher,
            ledger: VisitLedger::new(options.max_pages, Arc::clone(&cancel)),
            gate: ConcurrencyGate::new(options.max_concurrency),
            cancel,
            tracker: TaskTracker::new(),
            pages: Mutex::new(HashMap::new()),
            counters: Counters::default(),
        };

        Ok(Self {
            context: Arc::new(context),
        })
    }

    /// Handle to the run's stop latch
    ///
    /// Tripping it from outside (e.g. on Ctrl-C) winds the crawl down the
    /// same way reaching the page budget does.
    pub fn cancellation(&self) -> Arc<CancellationController> {
        Arc::clone(&self.context.cancel)
    }

    /// Runs the crawl to completion
    ///
    /// Returns once the seed task and every task it transitively spawned
    /// have finished. Per-page failures are logged and counted, never
    /// returned.
    pub async fn crawl(self) -> CrawlReport {
        let started_at = Utc::now();
        let context = self.context;

        tracing::info!(
            "Starting crawl of {} (max concurrency: {}, max pages: {})",
            context.base_url,
            context.gate.capacity(),
            context.ledger.max_pages()
        );

        let seed = context.base_url.to_string();
        context.tracker.spawn(Arc::clone(&context).visit(seed));
        context.tracker.close();
        context.tracker.wait().await;

        let finished_at = Utc::now();
        let pages = std::mem::take(
            &mut *context
                .pages
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        let visits = context.ledger.snapshot();
        let pages_admitted = visits.len();

        let stats = CrawlStats {
            started_at,
            finished_at,
            pages_admitted,
            pages_extracted: pages.len(),
            total_visits: visits.values().map(|&count| u64::from(count)).sum(),
            fetch_failures: Counters::get(&context.counters.fetch_failures),
            fetches_aborted: Counters::get(&context.counters.fetches_aborted),
            extraction_failures: Counters::get(&context.counters.extraction_failures),
            invalid_links: Counters::get(&context.counters.invalid_links),
            external_links_skipped: Counters::get(&context.counters.external_links_skipped),
            budget_reached: context.cancel.is_stopped()
                && pages_admitted >= context.ledger.max_pages(),
        };

        tracing::info!(
            "Crawl completed: {} pages admitted, {} extracted in {:?}",
            stats.pages_admitted,
            stats.pages_extracted,
            stats.duration()
        );

        CrawlReport {
            base_url: context.base_url.to_string(),
            pages,
            visits,
            stats,
        }
    }
}

impl<F: PageFetcher> CrawlContext<F> {
    /// Boxed entry point for one crawl task
    ///
    /// The concrete boxed type lets a task spawn further tasks of the same
    /// kind without a recursive future type.
    fn visit(self: Arc<Self>, url: String) -> BoxFuture<'static, ()> {
        async move { self.crawl_page(url).await }.boxed()
    }

    async fn crawl_page(self: &Arc<Self>, url: String) {
        if self.cancel.is_stopped() {
            return;
        }

        let page_url = match Url::parse(&url) {
            Ok(page_url) => page_url,
            Err(e) => {
                tracing::debug!("Skipping invalid URL '{}': {}", url, e);
                Counters::bump(&self.counters.invalid_links);
                return;
            }
        };

        if !same_host(&self.base_url, &page_url) {
            tracing::debug!("'{}' is outside {}, skipping", url, self.base_url);
            Counters::bump(&self.counters.external_links_skipped);
            return;
        }

        let key = match self.ledger.try_admit(&url) {
            Ok(Admission::Admitted(key)) => key,
            Ok(Admission::Rejected(reason)) => {
                tracing::debug!("Not crawling '{}': {:?}", url, reason);
                return;
            }
            Err(e) => {
                tracing::debug!("Skipping '{}': {}", url, e);
                Counters::bump(&self.counters.invalid_links);
                return;
            }
        };

        tracing::debug!("Crawling '{}'", url);

        let fetched = self
            .gate
            .run(|| async {
                // A slot may free up long after this task queued for it
                if self.cancel.is_stopped() {
                    return Err(CrawlError::from(FetchError::Aborted { url: url.clone() }));
                }
                self.fetcher
                    .fetch(&page_url, self.cancel.token())
                    .await
                    .map_err(CrawlError::from)
            })
            .await;

        let body = match fetched {
            Ok(body) => body,
            Err(CrawlError::Fetch(FetchError::Aborted { .. })) => {
                tracing::debug!("Fetch of '{}' abandoned, crawl is stopping", url);
                Counters::bump(&self.counters.fetches_aborted);
                return;
            }
            Err(e) => {
                tracing::warn!("Failed to fetch '{}': {}", url, e);
                Counters::bump(&self.counters.fetch_failures);
                return;
            }
        };

        let record = match extract_page_data(&body, &url) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Failed to extract '{}': {}", url, e);
                Counters::bump(&self.counters.extraction_failures);
                return;
            }
        };

        if !self.cancel.is_stopped() {
            for link in &record.outgoing_links {
                self.tracker.spawn(Arc::clone(self).visit(link.clone()));
            }
        }

        self.pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, record);
    }
}

/// Crawls `seed` over HTTP using the given configuration
///
/// # Example
///
/// ```no_run
/// use sitewalk::{crawl_site, Config};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let report = crawl_site("https://example.com", &Config::default()).await?;
/// println!("Crawled {} pages", report.pages.len());
/// # Ok(())
/// # }
/// ```
pub async fn crawl_site(seed: &str, config: &Config) -> crate::Result<CrawlReport> {
    let fetcher = HttpFetcher::from_config(&config.user_agent, &config.crawler)?;
    let crawler = Crawler::new(seed, CrawlOptions::from(&config.crawler), fetcher)?;
    Ok(crawler.crawl().await)
}
