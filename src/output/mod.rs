//! Output module for crawl reports
//!
//! This module handles:
//! - Writing the CSV page report
//! - Formatting the visit-count report
//! - Recording and printing crawl statistics

mod csv_report;
pub mod stats;
mod visits;

pub use csv_report::{write_csv, write_csv_report, REPORT_HEADERS};
pub use stats::{format_statistics, print_statistics, CrawlStats};
pub use visits::{format_visit_report, sort_visits};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
