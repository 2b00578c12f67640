//! Configuration module for Product-Scout
//!
//! This module handles loading, parsing, and validating TOML configuration files,
//! and turns a configured site into validated [`CrawlSettings`].
//!
//! # Example
//!
//! ```no_run
//! use product_scout::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scout.toml")).unwrap();
//! for site in &config.sites {
//!     let settings = config.crawl_settings(site).unwrap();
//!     println!("{} -> up to {} products", settings.domain, settings.max_products);
//! }
//! ```

mod parser;
mod settings;
mod types;
mod validation;

// Re-export types
pub use settings::{CrawlSettings, MAX_CONCURRENCY, MIN_TIMEOUT};
pub use types::{
    ClassifierConfig, Config, CrawlerConfig, FetcherConfig, OutputConfig, SiteEntry,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{load_config, parse_config};
