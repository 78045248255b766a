//! Crawler module for same-origin page traversal
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the [`PageFetcher`] seam
//! - HTML extraction into [`PageRecord`]s
//! - The visit ledger, concurrency gate and stop latch shared by a run
//! - The recursive scheduler that ties them together

mod cancel;
mod fetcher;
mod gate;
mod ledger;
mod parser;
mod scheduler;

pub use cancel::CancellationController;
pub use fetcher::{build_http_client, HttpFetcher, PageFetcher};
pub use gate::ConcurrencyGate;
pub use ledger::{Admission, Rejection, VisitLedger};
pub use parser::{extract_page_data, PageRecord};
pub use scheduler::{crawl_site, CrawlOptions, CrawlReport, Crawler};
