//! Per-case fetch state machine
//!
//! Each identifier runs through skip / fetch / extract and lands in exactly
//! one terminal outcome. A rate-limit response gets a single retry after an
//! extended randomized backoff; any other transport failure marks the
//! identifier failed. A page without a judgment section is a valid Done
//! outcome, not an error.

use crate::config::Config;
use crate::crawler::extractor::extract_case;
use crate::crawler::jittered;
use crate::ledger::IdentifierLedger;
use crate::proxy::{ProxyConfig, ProxyRotator};
use crate::{HarvestError, Result};
use reqwest::{Client, StatusCode};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// A fully extracted case ready for the corpus
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseRecord {
    /// Case identifier in the source repository
    pub id: u64,

    /// Case title; defaults to `Case {id}` when the page has no heading
    pub title: String,

    /// Plain judgment text
    pub judgment: String,
}

/// Terminal classification of a single fetch invocation
#[derive(Debug)]
pub enum FetchOutcome {
    /// Identifier already has a terminal outcome; no request was made
    Skipped,

    /// Document fetched and judgment extracted; marked done
    Record(CaseRecord),

    /// Document exists but carries no judgment section; marked done
    Empty,

    /// Transport failure after any retries; marked failed
    Failed,
}

/// Fetches case documents and classifies each into a terminal outcome
///
/// Owns the ledger for the lifetime of the crawl: every invocation that
/// issues a request ends with exactly one of `mark_done`/`mark_failed`.
pub struct CaseFetcher {
    config: Arc<Config>,
    ledger: IdentifierLedger,
    rotator: ProxyRotator,
    direct: Client,

    /// Proxied clients, built lazily and keyed by the plaintext proxy URL
    /// (the HTTP client applies proxies at construction, not per request)
    proxied: HashMap<String, Client>,
}

impl CaseFetcher {
    /// Creates a fetcher with a direct client built up front
    pub fn new(
        config: Arc<Config>,
        ledger: IdentifierLedger,
        rotator: ProxyRotator,
    ) -> Result<Self> {
        let direct = build_client(&config, None)?;

        Ok(Self {
            config,
            ledger,
            rotator,
            direct,
            proxied: HashMap::new(),
        })
    }

    /// Read access to the ledger, for callers that plan work around it
    pub fn ledger(&self) -> &IdentifierLedger {
        &self.ledger
    }

    /// Mutable ledger access, for retry reconciliation
    pub fn ledger_mut(&mut self) -> &mut IdentifierLedger {
        &mut self.ledger
    }

    /// Fetches one case, skipping identifiers with a known outcome
    ///
    /// The skip path issues no request and causes no side effect.
    pub async fn fetch_case(&mut self, id: u64) -> Result<FetchOutcome> {
        if self.ledger.is_resolved(id) {
            tracing::debug!("Skipping case {id}: already resolved");
            return Ok(FetchOutcome::Skipped);
        }

        self.fetch_unresolved(id).await
    }

    /// Re-attempts a previously failed case, bypassing the resolved check
    ///
    /// Used only by the bounded retry pass; a failed identifier counts as
    /// resolved, so `fetch_case` would never reach the network for it. The
    /// caller is responsible for reconciling the failed set afterwards.
    pub async fn retry_case(&mut self, id: u64) -> Result<FetchOutcome> {
        self.fetch_unresolved(id).await
    }

    async fn fetch_unresolved(&mut self, id: u64) -> Result<FetchOutcome> {
        let url = format!(
            "{}/doc/{}/",
            self.config.source.base_url.trim_end_matches('/'),
            id
        );

        // The cursor advances per request, independent of the outcome
        let client = match self.rotator.next() {
            Some(proxy) => self.proxied_client(&proxy)?.clone(),
            None => self.direct.clone(),
        };

        let body = match self.request_document(&client, &url, id).await {
            Ok(body) => body,
            Err(err) => {
                tracing::warn!("Failed to fetch {url}: {err}");
                self.ledger.mark_failed(id)?;
                return Ok(FetchOutcome::Failed);
            }
        };

        let extracted = extract_case(&body);
        let Some(judgment) = extracted.judgment else {
            tracing::warn!("No judgment text found for case {id}");
            self.ledger.mark_done(id)?;
            return Ok(FetchOutcome::Empty);
        };

        let title = extracted
            .title
            .unwrap_or_else(|| format!("Case {id}"));
        self.ledger.mark_done(id)?;

        Ok(FetchOutcome::Record(CaseRecord {
            id,
            title,
            judgment,
        }))
    }

    /// Issues the GET, retrying exactly once after an extended backoff on a
    /// rate-limit response
    async fn request_document(&self, client: &Client, url: &str, id: u64) -> Result<String> {
        let mut response =
            client
                .get(url)
                .send()
                .await
                .map_err(|source| HarvestError::Http {
                    url: url.to_string(),
                    source,
                })?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let pause = jittered(
                self.config.delays.rate_limit_min,
                self.config.delays.rate_limit_max,
            );
            tracing::warn!(
                "Rate limited on case {id}, backing off for {:.1}s",
                pause.as_secs_f64()
            );
            tokio::time::sleep(pause).await;

            response = client
                .get(url)
                .send()
                .await
                .map_err(|source| HarvestError::Http {
                    url: url.to_string(),
                    source,
                })?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(HarvestError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| HarvestError::Http {
            url: url.to_string(),
            source,
        })
    }

    /// Gets or lazily builds the client routed through the given proxy
    fn proxied_client(&mut self, proxy: &ProxyConfig) -> Result<&Client> {
        match self.proxied.entry(proxy.http.clone()) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let client = build_client(&self.config, Some(proxy))?;
                Ok(entry.insert(client))
            }
        }
    }
}

/// Builds an HTTP client, optionally routed through a proxy
fn build_client(config: &Config, proxy: Option<&ProxyConfig>) -> Result<Client> {
    let mut builder = Client::builder()
        .user_agent(config.source.user_agent.clone())
        .timeout(Duration::from_secs(config.crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true);

    if let Some(proxy) = proxy {
        builder = builder
            .proxy(reqwest::Proxy::http(&proxy.http)?)
            .proxy(reqwest::Proxy::https(&proxy.https)?);
    }

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CrawlerConfig, DelayConfig, OutputConfig, SourceConfig};

    fn test_config() -> Config {
        Config {
            crawler: CrawlerConfig {
                start_id: 1,
                end_id: 10,
                batch_size: 5,
                max_retries: 3,
                max_workers: 1,
                request_timeout_secs: 5,
            },
            source: SourceConfig {
                base_url: "https://example.org".to_string(),
                user_agent: "TestHarvester/1.0".to_string(),
            },
            delays: DelayConfig::default(),
            output: OutputConfig {
                corpus_path: "corpus.txt".to_string(),
                processed_path: "processed_ids.txt".to_string(),
                failed_path: "failed_ids.txt".to_string(),
                proxy_list_path: None,
            },
        }
    }

    #[test]
    fn test_build_direct_client() {
        let config = test_config();
        assert!(build_client(&config, None).is_ok());
    }

    #[test]
    fn test_build_proxied_client() {
        let config = test_config();
        let proxy = ProxyConfig::from_entry("10.0.0.1:3128");
        assert!(build_client(&config, Some(&proxy)).is_ok());
    }

    // Fetch behavior against live responses is covered by the wiremock
    // tests in tests/crawl_tests.rs
}
