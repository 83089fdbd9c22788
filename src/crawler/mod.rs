//! Crawler module for case fetching and orchestration
//!
//! This module contains the core harvesting logic, including:
//! - The per-case fetch state machine with rate-limit backoff
//! - Judgment text extraction from document pages
//! - Batch orchestration with randomized pacing and the retry pass

mod coordinator;
mod extractor;
mod fetcher;

pub use coordinator::{CrawlOrchestrator, CrawlStats};
pub use extractor::{extract_case, ExtractedCase};
pub use fetcher::{CaseFetcher, CaseRecord, FetchOutcome};

use crate::config::Config;
use crate::Result;
use std::time::Duration;

/// Runs a complete harvest: the configured range pass, then the retry pass
///
/// This is the main entry point for a crawl. It will:
/// 1. Load the identifier ledger and proxy list
/// 2. Build the HTTP client
/// 3. Process the configured identifier range in batches
/// 4. Retry previously failed identifiers and reconcile the ledger
///
/// # Arguments
///
/// * `config` - The harvester configuration
///
/// # Returns
///
/// * `Ok(CrawlStats)` - Harvest completed; counters for the run
/// * `Err(HarvestError)` - Harvest failed
pub async fn harvest(config: Config) -> Result<CrawlStats> {
    let mut orchestrator = CrawlOrchestrator::new(config)?;
    orchestrator.run().await
}

/// Draws a uniform duration from `[min_secs, max_secs)`
///
/// Collapsed or inverted ranges yield the minimum, so a zeroed test
/// configuration sleeps for zero time.
pub(crate) fn jittered(min_secs: f64, max_secs: f64) -> Duration {
    use rand::Rng;

    let secs = if max_secs > min_secs {
        rand::thread_rng().gen_range(min_secs..max_secs)
    } else {
        min_secs
    };
    Duration::from_secs_f64(secs)
}
