//! Order-history page fetching using wreq for TLS fingerprint emulation.
//!
//! Each page fetch mirrors the throwaway-tab lifecycle: open the tagged
//! URL (with bounded retry), wait for a settle delay so hydrated order
//! summaries finish rendering, extract, and discard the page.

use crate::config::Config;
use crate::orders::extractor::extract_page;
use crate::orders::models::{PageResult, SpendingError, TimeRange};
use crate::orders::storefronts::Storefront;
use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::RngExt;
use std::time::Duration;
use tracing::{debug, info, warn};
use wreq::Client;
use wreq_util::Emulation;

/// Query marker tagging synthetic scrape navigations so other surfaces
/// of the system can recognize and skip re-processing them.
pub const SCRAPING_MARKER: &str = "_scraping=1";

/// Trait for fetching one order-history listing page - enables mocking
/// the whole tab lifecycle in pagination and cache tests.
#[async_trait]
pub trait PageFetch: Send + Sync {
    /// Fetches and extracts the page at the given pagination offset.
    ///
    /// A page that cannot be opened after bounded retries yields
    /// `SpendingError::TabCreateFailed`; blocked pages are not errors
    /// here, they flow through `PageResult::is_blocked`.
    async fn fetch_page(&self, start_index: u32) -> Result<PageResult, SpendingError>;
}

/// HTTP page fetcher with browser impersonation and anti-bot measures.
pub struct TabFetcher {
    client: Client,
    storefront: Storefront,
    range: TimeRange,
    delay_ms: u64,
    delay_jitter_ms: u64,
    settle_ms: u64,
    attempts: u32,
    backoff_ms: u64,
    base_url: Option<String>,
}

impl TabFetcher {
    /// Creates a new fetcher for one (storefront, range) pair.
    pub fn new(config: &Config, storefront: Storefront, range: TimeRange) -> Result<Self> {
        Self::with_base_url(config, storefront, range, None)
    }

    /// Creates a new fetcher with an optional custom base URL (for testing).
    pub fn with_base_url(
        config: &Config,
        storefront: Storefront,
        range: TimeRange,
        base_url: Option<String>,
    ) -> Result<Self> {
        let mut builder = Client::builder()
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10));

        // Configure proxy if specified
        if let Some(proxy_url) = &config.proxy {
            debug!("Configuring proxy: {}", proxy_url);
            let proxy = wreq::Proxy::all(proxy_url).context("Failed to configure proxy")?;
            builder = builder.proxy(proxy);
        }

        let client = builder.build()?;

        Ok(Self {
            client,
            storefront,
            range,
            delay_ms: config.delay_ms,
            delay_jitter_ms: config.delay_jitter_ms,
            settle_ms: config.settle_ms,
            attempts: config.fetch_attempts.max(1),
            backoff_ms: config.fetch_backoff_ms,
            base_url,
        })
    }

    /// Returns the base URL (custom for testing, or storefront-based).
    fn base_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| self.storefront.base_url())
    }

    /// Builds the order-history URL for a pagination offset.
    fn page_url(&self, start_index: u32) -> String {
        let mut url = format!(
            "{}/your-orders/orders?timeFilter={}&{}",
            self.base_url(),
            self.range.filter(),
            SCRAPING_MARKER
        );
        if start_index > 0 {
            url.push_str(&format!("&startIndex={}", start_index));
        }
        url
    }

    /// Single attempt to open the page and read its HTML.
    async fn open_page(&self, url: &str) -> Result<String> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .emulation(Emulation::Chrome131)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8")
            .header("Accept-Language", self.storefront.accept_language())
            .header("Accept-Encoding", "gzip, deflate, br")
            .header("Cache-Control", "no-cache")
            .header("Pragma", "no-cache")
            .header("Sec-Ch-Ua", "\"Chromium\";v=\"131\", \"Not_A Brand\";v=\"24\"")
            .header("Sec-Ch-Ua-Mobile", "?0")
            .header("Sec-Ch-Ua-Platform", "\"macOS\"")
            .header("Sec-Fetch-Dest", "document")
            .header("Sec-Fetch-Mode", "navigate")
            .header("Sec-Fetch-Site", "none")
            .header("Sec-Fetch-User", "?1")
            .header("Upgrade-Insecure-Requests", "1")
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        debug!("Response status: {}", status);

        if status == 503 {
            warn!("Rate limited (503). Consider using a proxy or increasing delay.");
        }

        if !status.is_success() {
            anyhow::bail!("Page open failed with status: {}", status);
        }

        response.text().await.context("Failed to read response body")
    }

    /// Adds a random delay before each page request to mimic human pacing.
    async fn delay(&self) {
        if self.delay_ms == 0 {
            return;
        }

        let jitter = if self.delay_jitter_ms > 0 {
            rand::rng().random_range(0..=self.delay_jitter_ms)
        } else {
            0
        };

        let total_delay = self.delay_ms + jitter;
        debug!("Delaying {}ms", total_delay);
        tokio::time::sleep(Duration::from_millis(total_delay)).await;
    }
}

#[async_trait]
impl PageFetch for TabFetcher {
    async fn fetch_page(&self, start_index: u32) -> Result<PageResult, SpendingError> {
        let url = self.page_url(start_index);
        info!("Fetching {} orders page at offset {}", self.range, start_index);

        self.delay().await;

        for attempt in 0..self.attempts {
            match self.open_page(&url).await {
                Ok(html) => {
                    // Let client-side rendered order summaries settle
                    // before extraction.
                    if self.settle_ms > 0 {
                        tokio::time::sleep(Duration::from_millis(self.settle_ms)).await;
                    }
                    return Ok(extract_page(&html, self.storefront));
                }
                Err(e) => {
                    warn!("Attempt {}/{} failed: {}", attempt + 1, self.attempts, e);
                    if attempt + 1 < self.attempts {
                        let backoff = self.backoff_ms << attempt;
                        debug!("Backing off {}ms before retry", backoff);
                        tokio::time::sleep(Duration::from_millis(backoff)).await;
                    }
                }
            }
        }

        Err(SpendingError::TabCreateFailed)
    }
}
