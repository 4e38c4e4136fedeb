//! Sequential pagination over one (time range, storefront) order listing.

use crate::orders::fetch::PageFetch;
use crate::orders::models::{RangeTotals, SpendingError};
use tracing::{debug, info};

/// Paging limits, taken from [`crate::config::Config`].
#[derive(Debug, Clone, Copy)]
pub struct PagingLimits {
    /// Orders shown per full listing page.
    pub page_size: u32,
    /// Hard ceiling on pages fetched for one range.
    pub max_pages: u32,
}

impl PagingLimits {
    pub fn new(page_size: u32, max_pages: u32) -> Self {
        Self { page_size: page_size.max(1), max_pages: max_pages.max(1) }
    }
}

/// Fetches pages strictly sequentially until a termination rule fires and
/// returns the accumulated totals.
///
/// Pages are never fetched in parallel: opening several simultaneous
/// navigations against the same account session risks tripping
/// anti-automation defenses.
///
/// Termination is one of:
/// - an empty page (normal end of the order list),
/// - a short page (fewer orders than `page_size` marks the last page),
/// - the page ceiling, which sets `limit_reached` on the totals.
///
/// A blocked page or an unopenable page aborts the whole range with the
/// matching error and nothing is cached upstream.
pub async fn fetch_range(
    fetcher: &dyn PageFetch,
    limits: PagingLimits,
) -> Result<RangeTotals, SpendingError> {
    let mut totals = RangeTotals::default();

    for page in 0..limits.max_pages {
        let result = fetcher.fetch_page(page * limits.page_size).await?;

        if result.is_blocked {
            info!("Page {} blocked by sign-in or CAPTCHA, aborting range", page + 1);
            return Err(SpendingError::AuthRequired);
        }

        debug!(
            "Page {}: {} orders, {:.2}",
            page + 1,
            result.order_count,
            result.sum
        );

        if result.order_count == 0 {
            debug!("No more orders found, stopping");
            break;
        }

        totals.total += result.sum;
        totals.order_count += result.order_count;

        if result.order_count < limits.page_size {
            debug!("Short page ({} < {}), this is the last page", result.order_count, limits.page_size);
            break;
        }

        if page + 1 == limits.max_pages {
            info!("Reached page ceiling ({} pages), total may undercount", limits.max_pages);
            totals.limit_reached = true;
        }
    }

    info!(
        "Range total: {} orders, {:.2}{}",
        totals.order_count,
        totals.total,
        if totals.limit_reached { " (limit reached)" } else { "" }
    );

    Ok(totals)
}
