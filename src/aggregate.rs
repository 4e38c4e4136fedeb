//! Cross-storefront aggregation of cached range totals, grouped by currency.

use crate::cache::RangeCache;
use crate::orders::models::{CurrencyAggregate, TimeRange};
use crate::orders::storefronts::Storefront;
use tracing::{debug, warn};

/// Folds every fresh cache entry for `range` into per-currency buckets,
/// sorted descending by total. Expired entries are evicted by the cache
/// as part of the read.
///
/// Values are summed as-is per currency; no FX conversion happens here.
pub fn currency_totals(cache: &RangeCache, range: TimeRange) -> Vec<CurrencyAggregate> {
    let mut buckets: Vec<CurrencyAggregate> = Vec::new();

    for (domain, aggregate) in cache.entries_for_range(range) {
        let Some(storefront) = Storefront::from_host(&domain) else {
            // A cache key left behind by a storefront we no longer know.
            warn!("Skipping cache entry for unrecognized domain {}", domain);
            continue;
        };

        let currency = storefront.currency();
        match buckets.iter_mut().find(|b| b.currency == currency) {
            Some(bucket) => {
                bucket.total += aggregate.total;
                bucket.order_count += aggregate.order_count;
            }
            None => buckets.push(CurrencyAggregate {
                currency: currency.to_string(),
                symbol: storefront.symbol().to_string(),
                total: aggregate.total,
                order_count: aggregate.order_count,
            }),
        }
    }

    buckets.sort_by(|a, b| b.total.partial_cmp(&a.total).unwrap_or(std::cmp::Ordering::Equal));

    debug!("Aggregated {} currencies for {}", buckets.len(), range);
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orders::models::RangeAggregate;
    use tempfile::TempDir;

    fn aggregate(total: f64, orders: u32) -> RangeAggregate {
        RangeAggregate { total, order_count: orders, limit_reached: false, computed_at: 0 }
    }

    fn make_cache(dir: &TempDir) -> RangeCache {
        RangeCache::open(dir.path().join("cache.json"), 60_000).unwrap()
    }

    #[test]
    fn test_groups_same_currency_across_domains() {
        let dir = TempDir::new().unwrap();
        let cache = make_cache(&dir);

        // Two EUR storefronts plus one GBP: exactly two buckets.
        cache.write(TimeRange::Last30Days, "amazon.it", aggregate(100.0, 4));
        cache.write(TimeRange::Last30Days, "amazon.de", aggregate(50.0, 2));
        cache.write(TimeRange::Last30Days, "amazon.co.uk", aggregate(80.0, 1));

        let totals = currency_totals(&cache, TimeRange::Last30Days);
        assert_eq!(totals.len(), 2);

        // Sorted descending by total: EUR (150) before GBP (80).
        assert_eq!(totals[0].currency, "EUR");
        assert!((totals[0].total - 150.0).abs() < 1e-9);
        assert_eq!(totals[0].order_count, 6);
        assert_eq!(totals[0].symbol, "€");

        assert_eq!(totals[1].currency, "GBP");
        assert!((totals[1].total - 80.0).abs() < 1e-9);
    }

    #[test]
    fn test_sort_order_flips_with_totals() {
        let dir = TempDir::new().unwrap();
        let cache = make_cache(&dir);

        cache.write(TimeRange::Last30Days, "amazon.it", aggregate(10.0, 1));
        cache.write(TimeRange::Last30Days, "amazon.co.uk", aggregate(500.0, 9));

        let totals = currency_totals(&cache, TimeRange::Last30Days);
        assert_eq!(totals[0].currency, "GBP");
        assert_eq!(totals[1].currency, "EUR");
    }

    #[test]
    fn test_ranges_are_independent() {
        let dir = TempDir::new().unwrap();
        let cache = make_cache(&dir);

        cache.write(TimeRange::Last30Days, "amazon.it", aggregate(10.0, 1));
        cache.write(TimeRange::LastThreeMonths, "amazon.it", aggregate(99.0, 5));

        let totals = currency_totals(&cache, TimeRange::Last30Days);
        assert_eq!(totals.len(), 1);
        assert!((totals[0].total - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_empty_cache_yields_no_buckets() {
        let dir = TempDir::new().unwrap();
        let cache = make_cache(&dir);
        assert!(currency_totals(&cache, TimeRange::Last30Days).is_empty());
    }
}
