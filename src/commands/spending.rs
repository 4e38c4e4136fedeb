//! Spending command implementations over the router and cache.

use crate::aggregate::currency_totals;
use crate::cache::RangeCache;
use crate::config::Config;
use crate::orders::models::TimeRange;
use crate::router::{Router, SpendingRequest};
use anyhow::{Context, Result};
use tracing::info;

/// Executes spending queries against the caller's configured storefront.
pub struct SpendingCommand {
    config: Config,
}

impl SpendingCommand {
    /// Creates a new spending command.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Fetches the spending report for one range and returns it as JSON.
    pub async fn fetch(&self, range: TimeRange, force: bool, cache_only: bool) -> Result<String> {
        let router = Router::new(&self.config).context("Failed to initialize router")?;
        self.fetch_with_router(&router, range, force, cache_only).await
    }

    /// Fetches with a provided router (for testing).
    pub async fn fetch_with_router(
        &self,
        router: &Router,
        range: TimeRange,
        force: bool,
        cache_only: bool,
    ) -> Result<String> {
        let request = match range {
            TimeRange::Last30Days => SpendingRequest::Spending30 { force, cache_only },
            TimeRange::LastThreeMonths => SpendingRequest::Spending3M { force, cache_only },
        };

        info!("Fetching {} spending for {}", range, self.config.storefront);

        let response = router.handle(request, self.config.storefront.domain()).await;
        serde_json::to_string_pretty(&response).context("Failed to encode response")
    }

    /// Returns the cross-currency totals for one range as JSON.
    pub fn total(&self, range: TimeRange) -> Result<String> {
        let cache = RangeCache::open(self.config.resolved_cache_path(), self.config.cache_ttl_ms)
            .context("Failed to open cache")?;

        let totals = currency_totals(&cache, range);
        serde_json::to_string_pretty(&totals).context("Failed to encode totals")
    }

    /// Clears every cached range aggregate.
    pub fn clear_cache(&self) -> Result<String> {
        let cache = RangeCache::open(self.config.resolved_cache_path(), self.config.cache_ttl_ms)
            .context("Failed to open cache")?;

        cache.clear();
        Ok(format!("Cleared cache at {}", self.config.resolved_cache_path().display()))
    }
}
