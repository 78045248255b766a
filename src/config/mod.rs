//! Configuration module for sitewalk
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file. Command-line arguments are applied on top of it.
//!
//! # Example
//!
//! ```no_run
//! use sitewalk::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("sitewalk.toml")).unwrap();
//! println!("Crawler will admit at most {} pages", config.crawler.max_pages);
//! ```

mod parser;
mod types;
mod validation;

pub use types::{Config, CrawlerConfig, OutputConfig, UserAgentConfig};
pub use types::{DEFAULT_MAX_CONCURRENCY, DEFAULT_MAX_PAGES};

pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
pub use validation::validate;
