use serde::Deserialize;

/// Main configuration structure for the harvester
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub source: SourceConfig,
    #[serde(default)]
    pub delays: DelayConfig,
    pub output: OutputConfig,
}

/// Crawl range and retry behavior
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlerConfig {
    /// First case identifier to fetch (inclusive)
    #[serde(rename = "start-id")]
    pub start_id: u64,

    /// Last case identifier to fetch (inclusive)
    #[serde(rename = "end-id")]
    pub end_id: u64,

    /// Number of consecutive identifiers per batch
    #[serde(rename = "batch-size")]
    pub batch_size: u64,

    /// Number of passes over the failed set after the range pass
    #[serde(rename = "max-retries", default = "default_max_retries")]
    pub max_retries: u32,

    /// Accepted for compatibility; requests are always issued one at a time
    #[serde(rename = "max-workers", default = "default_max_workers")]
    pub max_workers: u32,

    /// Per-request timeout in seconds
    #[serde(rename = "request-timeout-secs", default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_max_retries() -> u32 {
    3
}

fn default_max_workers() -> u32 {
    1
}

fn default_request_timeout() -> u64 {
    15
}

/// Document repository configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Base URL of the document repository; documents live at `{base-url}/doc/{id}/`
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent", default = "default_user_agent")]
    pub user_agent: String,
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/91.0.4472.124 Safari/537.36"
        .to_string()
}

/// Pause configuration; every pause is drawn uniformly from its range, in seconds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DelayConfig {
    /// Delay after each request
    #[serde(rename = "request-min")]
    pub request_min: f64,
    #[serde(rename = "request-max")]
    pub request_max: f64,

    /// Extended backoff after a rate-limit response, before the single retry
    #[serde(rename = "rate-limit-min")]
    pub rate_limit_min: f64,
    #[serde(rename = "rate-limit-max")]
    pub rate_limit_max: f64,

    /// Probability of an extra nap after any single request
    #[serde(rename = "nap-chance")]
    pub nap_chance: f64,

    /// Nap length during the range pass
    #[serde(rename = "nap-min")]
    pub nap_min: f64,
    #[serde(rename = "nap-max")]
    pub nap_max: f64,

    /// Nap length during the retry pass
    #[serde(rename = "retry-nap-min")]
    pub retry_nap_min: f64,
    #[serde(rename = "retry-nap-max")]
    pub retry_nap_max: f64,

    /// Break between batches
    #[serde(rename = "batch-break-min")]
    pub batch_break_min: f64,
    #[serde(rename = "batch-break-max")]
    pub batch_break_max: f64,

    /// Cooldown after a batch-level error
    #[serde(rename = "batch-cooldown")]
    pub batch_cooldown: f64,
}

impl Default for DelayConfig {
    fn default() -> Self {
        Self {
            request_min: 0.0,
            request_max: 3.0,
            rate_limit_min: 10.0,
            rate_limit_max: 20.0,
            nap_chance: 0.1,
            nap_min: 5.0,
            nap_max: 8.0,
            retry_nap_min: 10.0,
            retry_nap_max: 30.0,
            batch_break_min: 10.0,
            batch_break_max: 20.0,
            batch_cooldown: 120.0,
        }
    }
}

/// Output and state file configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path of the aggregate corpus file
    #[serde(rename = "corpus-path")]
    pub corpus_path: String,

    /// Path of the done-identifier ledger file
    #[serde(rename = "processed-path", default = "default_processed_path")]
    pub processed_path: String,

    /// Path of the failed-identifier ledger file
    #[serde(rename = "failed-path", default = "default_failed_path")]
    pub failed_path: String,

    /// Optional proxy list file, one endpoint per line; absent means direct connection
    #[serde(rename = "proxy-list-path")]
    pub proxy_list_path: Option<String>,
}

fn default_processed_path() -> String {
    "processed_ids.txt".to_string()
}

fn default_failed_path() -> String {
    "failed_ids.txt".to_string()
}
