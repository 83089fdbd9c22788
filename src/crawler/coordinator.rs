//! Crawl orchestration
//!
//! Drives batches of identifiers through the fetcher and corpus writer with
//! randomized pacing, then runs the bounded retry pass over previously
//! failed identifiers. Batches are independently resilient: an error inside
//! one batch is logged and followed by a cooldown, and the crawl moves on
//! to the next batch.

use crate::config::Config;
use crate::crawler::fetcher::{CaseFetcher, FetchOutcome};
use crate::crawler::jittered;
use crate::ledger::IdentifierLedger;
use crate::output::CorpusWriter;
use crate::proxy::ProxyRotator;
use crate::Result;
use rand::Rng;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Counters accumulated over one harvester run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CrawlStats {
    /// Records appended to the corpus
    pub added: u64,

    /// Cases fetched but confirmed to have no judgment section
    pub empty: u64,

    /// Cases that exhausted their attempts without success
    pub failed: u64,

    /// Identifiers skipped because they were already resolved
    pub skipped: u64,

    /// Previously failed cases recovered during the retry pass
    pub recovered: u64,
}

/// Drives the whole crawl: range batches first, then the retry pass
///
/// Holds all mutable state for a run: the ledger (via the fetcher), proxy
/// rotation, the corpus writer, and the run counters.
pub struct CrawlOrchestrator {
    config: Arc<Config>,
    fetcher: CaseFetcher,
    writer: CorpusWriter,
    stats: CrawlStats,
}

impl CrawlOrchestrator {
    /// Creates an orchestrator, loading ledger and proxy state from disk
    pub fn new(config: Config) -> Result<Self> {
        let config = Arc::new(config);

        let ledger = IdentifierLedger::load(
            Path::new(&config.output.processed_path),
            Path::new(&config.output.failed_path),
        )?;
        tracing::info!(
            "Ledger loaded: {} done, {} failed",
            ledger.done_count(),
            ledger.failed_count()
        );

        let rotator = match &config.output.proxy_list_path {
            Some(path) => ProxyRotator::load(Path::new(path))?,
            None => ProxyRotator::default(),
        };

        if config.crawler.max_workers > 1 {
            tracing::info!(
                "max-workers is {}, but requests are issued one at a time",
                config.crawler.max_workers
            );
        }

        let fetcher = CaseFetcher::new(Arc::clone(&config), ledger, rotator)?;
        let writer = CorpusWriter::new(Path::new(&config.output.corpus_path));

        Ok(Self {
            config,
            fetcher,
            writer,
            stats: CrawlStats::default(),
        })
    }

    /// Counters accumulated so far
    pub fn stats(&self) -> CrawlStats {
        self.stats
    }

    /// Read access to the ledger
    pub fn ledger(&self) -> &IdentifierLedger {
        self.fetcher.ledger()
    }

    /// Runs the configured range pass followed by the bounded retry pass
    pub async fn run(&mut self) -> Result<CrawlStats> {
        let start = self.config.crawler.start_id;
        let end = self.config.crawler.end_id;
        let batch_size = self.config.crawler.batch_size;
        let max_retries = self.config.crawler.max_retries;

        self.run_range(start, end, batch_size).await?;

        tracing::info!("Starting retry of failed cases");
        self.retry_failed(max_retries).await?;

        let stats = self.stats;
        tracing::info!(
            "Run complete: {} added ({} recovered), {} empty, {} failed, {} skipped",
            stats.added,
            stats.recovered,
            stats.empty,
            stats.failed,
            stats.skipped
        );
        Ok(stats)
    }

    /// Partitions `[start, end]` into batches and processes each with pacing
    ///
    /// A batch-level error is caught and logged, followed by an extended
    /// cooldown; the next batch proceeds regardless.
    pub async fn run_range(&mut self, start: u64, end: u64, batch_size: u64) -> Result<()> {
        self.writer.ensure_exists()?;

        let batch_size = batch_size.max(1);
        let mut batch_start = start;
        while batch_start <= end {
            let batch_end = batch_start.saturating_add(batch_size - 1).min(end);
            tracing::info!("Processing batch {batch_start} to {batch_end}");

            if let Err(err) = self.run_batch(batch_start, batch_end).await {
                tracing::error!("Error processing batch {batch_start}-{batch_end}: {err}");
                let cooldown = Duration::from_secs_f64(self.config.delays.batch_cooldown);
                tracing::info!(
                    "Cooling down for {:.0}s after batch error",
                    cooldown.as_secs_f64()
                );
                tokio::time::sleep(cooldown).await;
            } else if batch_end < end {
                let pause = jittered(
                    self.config.delays.batch_break_min,
                    self.config.delays.batch_break_max,
                );
                tracing::info!(
                    "Taking a {:.1}s break between batches",
                    pause.as_secs_f64()
                );
                tokio::time::sleep(pause).await;
            }

            batch_start = match batch_end.checked_add(1) {
                Some(next) => next,
                None => break,
            };
        }

        Ok(())
    }

    /// Processes one contiguous batch of identifiers sequentially
    async fn run_batch(&mut self, batch_start: u64, batch_end: u64) -> Result<()> {
        let pending: Vec<u64> = (batch_start..=batch_end)
            .filter(|id| !self.fetcher.ledger().is_resolved(*id))
            .collect();

        let total = batch_end - batch_start + 1;
        self.stats.skipped += total - pending.len() as u64;
        tracing::info!(
            "Processing {} new cases out of {} in batch",
            pending.len(),
            total
        );

        for id in pending {
            match self.fetcher.fetch_case(id).await? {
                FetchOutcome::Record(record) => {
                    self.writer.append(&record)?;
                    self.stats.added += 1;
                    tracing::info!("Added case {id}");
                }
                FetchOutcome::Empty => {
                    self.stats.empty += 1;
                }
                FetchOutcome::Failed => {
                    self.stats.failed += 1;
                }
                FetchOutcome::Skipped => {
                    self.stats.skipped += 1;
                }
            }

            self.pace(self.config.delays.nap_min, self.config.delays.nap_max)
                .await;
        }

        Ok(())
    }

    /// Re-attempts previously failed identifiers for up to `max_retries` passes
    ///
    /// Works on a copy of the failed set. Any Done outcome (record or empty)
    /// drops the identifier from the working copy; whatever remains after
    /// all passes becomes the new persisted failed set.
    pub async fn retry_failed(&mut self, max_retries: u32) -> Result<()> {
        let mut remaining = self.fetcher.ledger().failed_ids();
        if remaining.is_empty() {
            tracing::info!("No failed cases to retry");
            return Ok(());
        }

        tracing::info!("Retrying {} failed cases", remaining.len());

        for attempt in 1..=max_retries {
            tracing::info!("Retry attempt {attempt}/{max_retries}");
            let mut recovered_this_pass = 0u64;

            let pass_ids = std::mem::take(&mut remaining);
            for id in pass_ids {
                match self.fetcher.retry_case(id).await? {
                    FetchOutcome::Record(record) => {
                        self.writer.append(&record)?;
                        self.stats.added += 1;
                        self.stats.recovered += 1;
                        recovered_this_pass += 1;
                        tracing::info!("Added previously failed case {id}");
                    }
                    FetchOutcome::Empty => {
                        self.stats.recovered += 1;
                        self.stats.empty += 1;
                        recovered_this_pass += 1;
                    }
                    FetchOutcome::Failed => {
                        remaining.push(id);
                    }
                    FetchOutcome::Skipped => {}
                }

                self.pace(
                    self.config.delays.retry_nap_min,
                    self.config.delays.retry_nap_max,
                )
                .await;
            }

            tracing::info!("Retry {attempt}: recovered {recovered_this_pass} cases");
            if remaining.is_empty() {
                break;
            }
        }

        self.fetcher
            .ledger_mut()
            .reconcile_failed(remaining.into_iter().collect())?;
        Ok(())
    }

    /// Sleeps the inter-request delay, with an occasional longer nap
    async fn pace(&self, nap_min: f64, nap_max: f64) {
        let delays = &self.config.delays;
        tokio::time::sleep(jittered(delays.request_min, delays.request_max)).await;

        if rand::thread_rng().gen::<f64>() < delays.nap_chance {
            let nap = jittered(nap_min, nap_max);
            tracing::info!("Taking a longer nap for {:.1}s", nap.as_secs_f64());
            tokio::time::sleep(nap).await;
        }
    }
}
