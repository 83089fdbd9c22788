//! Case-Harvest: a resumable legal case corpus harvester
//!
//! This crate implements a deliberately slow, strictly sequential crawler that
//! fetches legal case documents by numeric identifier, extracts the judgment
//! text and title, and appends each case to a plain-text corpus file. Terminal
//! outcomes (done or failed) are persisted to flat files so an interrupted run
//! resumes without re-fetching anything.

pub mod config;
pub mod crawler;
pub mod ledger;
pub mod output;
pub mod proxy;

use thiserror::Error;

/// Main error type for harvester operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error for {url}: {source}")]
    Http { url: String, source: reqwest::Error },

    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Ledger error: {0}")]
    Ledger(#[from] ledger::LedgerError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for harvester operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{CaseRecord, CrawlOrchestrator, CrawlStats, FetchOutcome};
pub use ledger::IdentifierLedger;
pub use output::CorpusWriter;
pub use proxy::{ProxyConfig, ProxyRotator};
