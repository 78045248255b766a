//! URL handling module for sitewalk
//!
//! This module provides the dedup key normalization and the host comparison
//! that keeps a crawl on its seed's origin.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, same_host};
pub use normalize::normalize_url;
