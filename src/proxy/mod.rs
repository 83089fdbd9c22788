//! Round-robin proxy rotation
//!
//! Proxies are listed one endpoint per line in an optional file; a missing
//! file means direct connection. The cursor advances on every retrieval,
//! regardless of whether the request that used the previous proxy succeeded,
//! so the list is walked in a fixed cycle.

use std::fs;
use std::path::Path;

/// A proxy endpoint normalized for both transport legs
///
/// The HTTP client registers plaintext and encrypted proxies separately, and
/// a bare `host:port` entry carries no scheme, so each leg gets its own
/// assumed scheme. Entries with an explicit scheme are used verbatim for
/// both legs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyConfig {
    /// Proxy URL used for plaintext (http) requests
    pub http: String,

    /// Proxy URL used for encrypted (https) requests
    pub https: String,
}

impl ProxyConfig {
    /// Normalizes a single proxy list entry
    pub fn from_entry(entry: &str) -> Self {
        let entry = entry.trim();
        if entry.contains("://") {
            Self {
                http: entry.to_string(),
                https: entry.to_string(),
            }
        } else {
            Self {
                http: format!("http://{}", entry),
                https: format!("https://{}", entry),
            }
        }
    }
}

/// Round-robin selection over a fixed proxy list
#[derive(Debug, Default)]
pub struct ProxyRotator {
    entries: Vec<ProxyConfig>,
    cursor: usize,
}

impl ProxyRotator {
    /// Creates a rotator over the given endpoint entries
    pub fn new(entries: Vec<String>) -> Self {
        Self {
            entries: entries.iter().map(|e| ProxyConfig::from_entry(e)).collect(),
            cursor: 0,
        }
    }

    /// Loads a rotator from a proxy list file
    ///
    /// A missing file yields an empty rotator (direct connection). Blank
    /// lines are ignored.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No proxy file found, using direct connection");
                return Ok(Self::default());
            }
            Err(e) => return Err(e),
        };

        let entries: Vec<String> = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect();

        tracing::info!("Loaded {} proxies", entries.len());
        Ok(Self::new(entries))
    }

    /// Returns the proxy at the cursor and advances it circularly
    ///
    /// Returns `None` when no proxies are configured.
    pub fn next(&mut self) -> Option<ProxyConfig> {
        if self.entries.is_empty() {
            return None;
        }

        let config = self.entries[self.cursor].clone();
        self.cursor = (self.cursor + 1) % self.entries.len();
        Some(config)
    }

    /// Number of configured proxy endpoints
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no proxies are configured
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
