//! Typed request/response boundary exposed to UI collaborators.
//!
//! The widget, checkout banner, and CLI all speak this shape: a tagged
//! request naming one of the two supported ranges, answered by exactly one
//! of a success report, a no-cache signal, or a closed error code.

use crate::aggregate::currency_totals;
use crate::cache::RangeCache;
use crate::config::Config;
use crate::orders::fetch::{PageFetch, TabFetcher};
use crate::orders::models::{CurrencyAggregate, SpendingError, TimeRange};
use crate::orders::paginate::PagingLimits;
use crate::orders::storefronts::Storefront;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Inbound request from a UI collaborator. The time range is baked into
/// the action name: only two ranges exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum SpendingRequest {
    #[serde(rename = "GET_SPENDING_30")]
    Spending30 {
        #[serde(default)]
        force: bool,
        #[serde(default, rename = "cacheOnly")]
        cache_only: bool,
    },
    #[serde(rename = "GET_SPENDING_3M")]
    Spending3M {
        #[serde(default)]
        force: bool,
        #[serde(default, rename = "cacheOnly")]
        cache_only: bool,
    },
}

impl SpendingRequest {
    /// The time range the action names.
    pub fn range(&self) -> TimeRange {
        match self {
            SpendingRequest::Spending30 { .. } => TimeRange::Last30Days,
            SpendingRequest::Spending3M { .. } => TimeRange::LastThreeMonths,
        }
    }

    fn flags(&self) -> (bool, bool) {
        match *self {
            SpendingRequest::Spending30 { force, cache_only }
            | SpendingRequest::Spending3M { force, cache_only } => (force, cache_only),
        }
    }
}

/// Successful spending report for one range on the caller's storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingReport {
    pub total: f64,
    pub order_count: u32,
    /// True when the page ceiling was hit: the real total may be larger.
    pub limit_reached: bool,
    /// Epoch milliseconds when the aggregate was computed.
    pub updated_at: u64,
    pub symbol: String,
    pub currency: String,
    /// Per-currency totals across every storefront with a fresh cache
    /// entry for this range.
    pub all_currencies: Vec<CurrencyAggregate>,
}

/// Outbound response: exactly one of report, no-cache signal, or error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SpendingResponse {
    Report(SpendingReport),
    NoCache {
        #[serde(rename = "noCache")]
        no_cache: bool,
    },
    Failure {
        error: SpendingError,
    },
}

impl SpendingResponse {
    fn no_cache() -> Self {
        SpendingResponse::NoCache { no_cache: true }
    }
}

impl From<SpendingError> for SpendingResponse {
    fn from(error: SpendingError) -> Self {
        SpendingResponse::Failure { error }
    }
}

/// Builds the page fetcher for one (storefront, range) pair - the seam
/// where tests swap the live HTTP fetcher for a scripted one.
pub trait PageFetchProvider: Send + Sync {
    fn fetcher(&self, storefront: Storefront, range: TimeRange) -> Result<Arc<dyn PageFetch>>;
}

/// Production provider backed by [`TabFetcher`].
pub struct TabFetcherProvider {
    config: Config,
    base_url: Option<String>,
}

impl TabFetcherProvider {
    pub fn new(config: Config) -> Self {
        Self { config, base_url: None }
    }

    /// Points every fetcher at a custom base URL (for testing).
    pub fn with_base_url(config: Config, base_url: String) -> Self {
        Self { config, base_url: Some(base_url) }
    }
}

impl PageFetchProvider for TabFetcherProvider {
    fn fetcher(&self, storefront: Storefront, range: TimeRange) -> Result<Arc<dyn PageFetch>> {
        let fetcher =
            TabFetcher::with_base_url(&self.config, storefront, range, self.base_url.clone())
                .context("Failed to create page fetcher")?;
        Ok(Arc::new(fetcher))
    }
}

/// Background-side endpoint: resolves the caller's storefront, consults
/// the cache, and drives the scrape pipeline on a miss.
pub struct Router {
    cache: RangeCache,
    provider: Box<dyn PageFetchProvider>,
    limits: PagingLimits,
}

impl Router {
    /// Creates a router with the production fetcher and the configured
    /// cache location.
    pub fn new(config: &Config) -> Result<Self> {
        let cache = RangeCache::open(config.resolved_cache_path(), config.cache_ttl_ms)?;
        let provider = Box::new(TabFetcherProvider::new(config.clone()));
        Ok(Self::with_parts(cache, provider, PagingLimits::new(config.page_size, config.max_pages)))
    }

    /// Assembles a router from explicit parts (for testing).
    pub fn with_parts(
        cache: RangeCache,
        provider: Box<dyn PageFetchProvider>,
        limits: PagingLimits,
    ) -> Self {
        Self { cache, provider, limits }
    }

    /// Access to the underlying cache (for maintenance commands).
    pub fn cache(&self) -> &RangeCache {
        &self.cache
    }

    /// Handles one request on behalf of `sender_host`, the hostname of
    /// the page the request originated from.
    pub async fn handle(&self, request: SpendingRequest, sender_host: &str) -> SpendingResponse {
        let Some(storefront) = Storefront::from_host(sender_host) else {
            warn!("Request from unrecognized host: {}", sender_host);
            return SpendingError::UnknownDomain.into();
        };

        let range = request.range();
        let (force, cache_only) = request.flags();
        info!(
            "Handling {} request for {} (force: {}, cache_only: {})",
            range, storefront, force, cache_only
        );

        let fetcher = match self.provider.fetcher(storefront, range) {
            Ok(fetcher) => fetcher,
            Err(e) => {
                warn!("Could not build page fetcher: {:#}", e);
                return SpendingError::TabCreateFailed.into();
            }
        };

        let outcome = self
            .cache
            .read_or_fetch(range, storefront.domain(), &*fetcher, self.limits, force, cache_only)
            .await;

        match outcome {
            Ok(Some(aggregate)) => SpendingResponse::Report(SpendingReport {
                total: aggregate.total,
                order_count: aggregate.order_count,
                limit_reached: aggregate.limit_reached,
                updated_at: aggregate.computed_at,
                symbol: storefront.symbol().to_string(),
                currency: storefront.currency().to_string(),
                all_currencies: currency_totals(&self.cache, range),
            }),
            Ok(None) => SpendingResponse::no_cache(),
            Err(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::models::PageResult;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tempfile::TempDir;

    struct FixedFetcher {
        result: Result<PageResult, SpendingError>,
        calls: Arc<AtomicU32>,
    }

    #[async_trait]
    impl PageFetch for FixedFetcher {
        async fn fetch_page(&self, start_index: u32) -> Result<PageResult, SpendingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if start_index > 0 {
                return Ok(PageResult::empty());
            }
            self.result
        }
    }

    struct FixedProvider {
        result: Result<PageResult, SpendingError>,
        calls: Arc<AtomicU32>,
    }

    impl FixedProvider {
        fn new(result: Result<PageResult, SpendingError>) -> Self {
            Self { result, calls: Arc::new(AtomicU32::new(0)) }
        }
    }

    impl PageFetchProvider for FixedProvider {
        fn fetcher(&self, _storefront: Storefront, _range: TimeRange) -> Result<Arc<dyn PageFetch>> {
            Ok(Arc::new(FixedFetcher { result: self.result, calls: Arc::clone(&self.calls) }))
        }
    }

    fn make_router(dir: &TempDir, result: Result<PageResult, SpendingError>) -> (Router, Arc<AtomicU32>) {
        let cache = RangeCache::open(dir.path().join("cache.json"), 60_000).unwrap();
        let provider = FixedProvider::new(result);
        let calls = Arc::clone(&provider.calls);
        (Router::with_parts(cache, Box::new(provider), PagingLimits::new(10, 20)), calls)
    }

    fn get_30(force: bool, cache_only: bool) -> SpendingRequest {
        SpendingRequest::Spending30 { force, cache_only }
    }

    #[test]
    fn test_request_deserialization() {
        let request: SpendingRequest =
            serde_json::from_str(r#"{"action":"GET_SPENDING_30","force":true}"#).unwrap();
        assert_eq!(request, SpendingRequest::Spending30 { force: true, cache_only: false });
        assert_eq!(request.range(), TimeRange::Last30Days);

        let request: SpendingRequest =
            serde_json::from_str(r#"{"action":"GET_SPENDING_3M","cacheOnly":true}"#).unwrap();
        assert_eq!(request, SpendingRequest::Spending3M { force: false, cache_only: true });
        assert_eq!(request.range(), TimeRange::LastThreeMonths);

        // Flags default to false when absent
        let request: SpendingRequest =
            serde_json::from_str(r#"{"action":"GET_SPENDING_30"}"#).unwrap();
        assert_eq!(request, SpendingRequest::Spending30 { force: false, cache_only: false });

        assert!(serde_json::from_str::<SpendingRequest>(r#"{"action":"GET_SPENDING_7D"}"#).is_err());
    }

    #[tokio::test]
    async fn test_unknown_domain() {
        let dir = TempDir::new().unwrap();
        let (router, calls) = make_router(
            &dir,
            Ok(PageResult { sum: 10.0, order_count: 1, is_blocked: false }),
        );

        let response = router.handle(get_30(false, false), "example.com").await;
        assert_eq!(response, SpendingResponse::from(SpendingError::UnknownDomain));
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"error":"UNKNOWN_DOMAIN"}"#);
    }

    #[tokio::test]
    async fn test_success_report_shape() {
        let dir = TempDir::new().unwrap();
        let (router, _calls) = make_router(
            &dir,
            Ok(PageResult { sum: 150.5, order_count: 4, is_blocked: false }),
        );

        let response = router.handle(get_30(false, false), "www.amazon.it").await;
        let SpendingResponse::Report(report) = response else {
            panic!("expected a report, got {:?}", response);
        };

        assert!((report.total - 150.5).abs() < 1e-9);
        assert_eq!(report.order_count, 4);
        assert!(!report.limit_reached);
        assert!(report.updated_at > 0);
        assert_eq!(report.currency, "EUR");
        assert_eq!(report.symbol, "€");
        assert_eq!(report.all_currencies.len(), 1);
        assert_eq!(report.all_currencies[0].currency, "EUR");

        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"orderCount\":4"));
        assert!(json.contains("\"limitReached\":false"));
        assert!(json.contains("\"updatedAt\""));
        assert!(json.contains("\"allCurrencies\""));
    }

    #[tokio::test]
    async fn test_cache_only_miss_returns_no_cache() {
        let dir = TempDir::new().unwrap();
        let (router, calls) = make_router(
            &dir,
            Ok(PageResult { sum: 10.0, order_count: 1, is_blocked: false }),
        );

        let response = router.handle(get_30(false, true), "amazon.it").await;
        assert_eq!(response, SpendingResponse::NoCache { no_cache: true });
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"noCache":true}"#);
    }

    #[tokio::test]
    async fn test_auth_required_surfaces() {
        let dir = TempDir::new().unwrap();
        let (router, _calls) = make_router(
            &dir,
            Ok(PageResult { sum: 0.0, order_count: 0, is_blocked: true }),
        );

        let response = router.handle(get_30(false, false), "amazon.it").await;
        assert_eq!(response, SpendingResponse::from(SpendingError::AuthRequired));

        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"error":"AUTH_REQUIRED"}"#);
    }

    #[tokio::test]
    async fn test_tab_create_failed_surfaces() {
        let dir = TempDir::new().unwrap();
        let (router, _calls) = make_router(&dir, Err(SpendingError::TabCreateFailed));

        let response = router.handle(get_30(false, false), "amazon.it").await;
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"error":"TAB_CREATE_FAILED"}"#);
    }

    #[tokio::test]
    async fn test_second_request_served_from_cache() {
        let dir = TempDir::new().unwrap();
        let (router, calls) = make_router(
            &dir,
            Ok(PageResult { sum: 99.0, order_count: 2, is_blocked: false }),
        );

        let first = router.handle(get_30(false, false), "amazon.it").await;
        assert!(matches!(first, SpendingResponse::Report(_)));
        let after_first = calls.load(Ordering::SeqCst);

        let second = router.handle(get_30(false, false), "amazon.it").await;
        assert!(matches!(second, SpendingResponse::Report(_)));
        assert_eq!(calls.load(Ordering::SeqCst), after_first);
    }

    #[tokio::test]
    async fn test_force_refetches() {
        let dir = TempDir::new().unwrap();
        let (router, calls) = make_router(
            &dir,
            Ok(PageResult { sum: 99.0, order_count: 2, is_blocked: false }),
        );

        router.handle(get_30(false, false), "amazon.it").await;
        let after_first = calls.load(Ordering::SeqCst);

        router.handle(get_30(true, false), "amazon.it").await;
        assert!(calls.load(Ordering::SeqCst) > after_first);
    }

    #[test]
    fn test_response_untagged_roundtrip() {
        let no_cache: SpendingResponse = serde_json::from_str(r#"{"noCache":true}"#).unwrap();
        assert_eq!(no_cache, SpendingResponse::NoCache { no_cache: true });

        let failure: SpendingResponse =
            serde_json::from_str(r#"{"error":"AUTH_REQUIRED"}"#).unwrap();
        assert_eq!(failure, SpendingResponse::from(SpendingError::AuthRequired));
    }
}
