//! Statistics gathered over one crawl run
//!
//! This module holds the run counters and renders them for the end-of-run
//! summary.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Crawl statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlStats {
    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the last task of the run finished
    pub finished_at: DateTime<Utc>,

    /// Distinct pages admitted by the visit ledger
    pub pages_admitted: usize,

    /// Pages fetched and extracted successfully
    pub pages_extracted: usize,

    /// Total encounters of admitted pages, first visits included
    pub total_visits: u64,

    /// Pages whose fetch failed
    pub fetch_failures: usize,

    /// Fetches abandoned because the run was stopped
    pub fetches_aborted: usize,

    /// Pages whose HTML could not be processed
    pub extraction_failures: usize,

    /// Links that could not be parsed or normalized
    pub invalid_links: usize,

    /// Links that pointed away from the seed's host
    pub external_links_skipped: usize,

    /// True if the run stopped because the page budget was spent
    pub budget_reached: bool,
}

impl CrawlStats {
    /// Wall-clock duration of the run
    pub fn duration(&self) -> Duration {
        (self.finished_at - self.started_at)
            .to_std()
            .unwrap_or_default()
    }

    /// Revisits of already-admitted pages
    pub fn duplicate_visits(&self) -> u64 {
        self.total_visits
            .saturating_sub(self.pages_admitted as u64)
    }

    /// Percentage of admitted pages that were extracted
    pub fn success_rate(&self) -> f64 {
        if self.pages_admitted == 0 {
            return 0.0;
        }
        self.pages_extracted as f64 / self.pages_admitted as f64 * 100.0
    }
}

/// Formats crawl statistics for the console
pub fn format_statistics(stats: &CrawlStats) -> String {
    let mut out = String::new();

    out.push_str("=== Crawl Statistics ===\n\n");
    out.push_str(&format!("Started: {}\n", stats.started_at.to_rfc3339()));
    out.push_str(&format!("Finished: {}\n", stats.finished_at.to_rfc3339()));
    out.push_str(&format!(
        "Duration: {:.2} seconds\n\n",
        stats.duration().as_secs_f64()
    ));

    out.push_str(&format!("Pages admitted: {}\n", stats.pages_admitted));
    out.push_str(&format!("Pages extracted: {}\n", stats.pages_extracted));
    out.push_str(&format!("Success rate: {:.2}%\n", stats.success_rate()));
    out.push_str(&format!("Duplicate visits: {}\n\n", stats.duplicate_visits()));

    out.push_str("Skipped:\n");
    out.push_str(&format!("  Fetch failures: {}\n", stats.fetch_failures));
    out.push_str(&format!("  Fetches aborted: {}\n", stats.fetches_aborted));
    out.push_str(&format!(
        "  Extraction failures: {}\n",
        stats.extraction_failures
    ));
    out.push_str(&format!("  Invalid links: {}\n", stats.invalid_links));
    out.push_str(&format!(
        "  External links: {}\n",
        stats.external_links_skipped
    ));

    if stats.budget_reached {
        out.push_str("\nStopped early: page budget reached\n");
    }

    out
}

/// Prints crawl statistics to stdout
pub fn print_statistics(stats: &CrawlStats) {
    print!("{}", format_statistics(stats));
}
