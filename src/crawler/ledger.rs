//! Visit ledger: which pages a crawl has started, and how often each was seen
//!
//! The ledger is the single source of truth for admission. The budget check,
//! the duplicate check and the insert all happen under one lock, so two
//! concurrent callers can never both be admitted for the same page and the
//! budget can never be overshot.

use crate::crawler::CancellationController;
use crate::url::normalize_url;
use crate::UrlResult;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

/// Outcome of asking the ledger to admit a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// First encounter; the caller owns crawling this page
    Admitted(String),
    /// The caller must not crawl this page
    Rejected(Rejection),
}

impl Admission {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Self::Admitted(_))
    }
}

/// Why a URL was not admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// The run was already stopped before this call
    StoppedEarly,
    /// The page budget is spent; this call stopped the run
    BudgetExhausted,
    /// The page was admitted earlier; its count was incremented
    AlreadyVisited,
}

/// Shared map from normalized URL to visit count
#[derive(Debug)]
pub struct VisitLedger {
    visits: Mutex<HashMap<String, u32>>,
    max_pages: usize,
    cancel: Arc<CancellationController>,
}

impl VisitLedger {
    /// Creates an empty ledger that admits at most `max_pages` distinct pages
    pub fn new(max_pages: usize, cancel: Arc<CancellationController>) -> Self {
        Self {
            visits: Mutex::new(HashMap::new()),
            max_pages,
            cancel,
        }
    }

    /// Tries to admit a URL for first-time crawling
    ///
    /// # Returns
    ///
    /// * `Ok(Admission::Admitted(key))` - the caller should fetch the page
    /// * `Ok(Admission::Rejected(_))` - stopped, budget spent, or seen before
    /// * `Err(UrlError)` - the URL could not be normalized
    pub fn try_admit(&self, raw_url: &str) -> UrlResult<Admission> {
        let key = normalize_url(raw_url)?;

        let mut visits = self.visits.lock().unwrap_or_else(PoisonError::into_inner);

        if self.cancel.is_stopped() {
            return Ok(Admission::Rejected(Rejection::StoppedEarly));
        }

        if visits.len() >= self.max_pages {
            tracing::info!(
                "Reached maximum number of pages to crawl ({})",
                self.max_pages
            );
            self.cancel.trip();
            return Ok(Admission::Rejected(Rejection::BudgetExhausted));
        }

        if let Some(count) = visits.get_mut(&key) {
            *count += 1;
            return Ok(Admission::Rejected(Rejection::AlreadyVisited));
        }

        visits.insert(key.clone(), 1);
        Ok(Admission::Admitted(key))
    }

    /// Point-in-time copy of every key and its visit count
    pub fn snapshot(&self) -> HashMap<String, u32> {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of distinct pages admitted so far
    pub fn admitted(&self) -> usize {
        self.visits
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn max_pages(&self) -> usize {
        self.max_pages
    }
}
