//! Data models for spending ranges, page scrapes, and aggregates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Rolling time window supported by the order-history page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TimeRange {
    #[default]
    #[serde(rename = "last30")]
    Last30Days,
    #[serde(rename = "months-3")]
    LastThreeMonths,
}

impl TimeRange {
    /// Returns the `timeFilter` query value used by the order-history page.
    pub fn filter(&self) -> &'static str {
        match self {
            TimeRange::Last30Days => "last30",
            TimeRange::LastThreeMonths => "months-3",
        }
    }

    /// Returns both supported ranges.
    pub fn all() -> &'static [TimeRange] {
        &[TimeRange::Last30Days, TimeRange::LastThreeMonths]
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.filter())
    }
}

impl FromStr for TimeRange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "30" | "30d" | "last30" => Ok(TimeRange::Last30Days),
            "3m" | "months-3" | "3months" => Ok(TimeRange::LastThreeMonths),
            _ => Err(format!("Unknown time range: {}. Use: 30, 3m", s)),
        }
    }
}

/// Result of extracting one order-history listing page.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult {
    /// Sum of all matched order totals on the page.
    pub sum: f64,
    /// Number of line items that contributed a positive amount.
    pub order_count: u32,
    /// True when the page showed a CAPTCHA challenge or a sign-in form
    /// instead of order data. `sum`/`order_count` are meaningless then.
    pub is_blocked: bool,
}

impl PageResult {
    /// A page that contributed nothing (no matches, or malformed markup).
    pub fn empty() -> Self {
        Self { sum: 0.0, order_count: 0, is_blocked: false }
    }
}

/// Totals accumulated across the pages of one range fetch, before the
/// cache stamps a timestamp on them.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RangeTotals {
    pub total: f64,
    pub order_count: u32,
    /// True iff pagination stopped at the page ceiling while full pages
    /// were still coming back, meaning the true total may be larger.
    pub limit_reached: bool,
}

impl RangeTotals {
    /// Stamps the totals into a cacheable aggregate.
    pub fn into_aggregate(self, computed_at: u64) -> RangeAggregate {
        RangeAggregate {
            total: self.total,
            order_count: self.order_count,
            limit_reached: self.limit_reached,
            computed_at,
        }
    }
}

/// The unit of caching, one per (time range, storefront domain).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RangeAggregate {
    pub total: f64,
    pub order_count: u32,
    pub limit_reached: bool,
    /// Epoch milliseconds when the range fetch completed.
    pub computed_at: u64,
}

/// Per-currency totals derived across all fresh cache entries of a range.
/// Recomputed on every read, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyAggregate {
    pub currency: String,
    pub symbol: String,
    pub total: f64,
    pub order_count: u32,
}

/// The closed set of error codes that may cross the router boundary.
/// No other failure shape reaches callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum SpendingError {
    /// The session expired or a CAPTCHA challenge appeared mid-scrape.
    #[error("authentication required: sign-in or CAPTCHA page encountered")]
    #[serde(rename = "AUTH_REQUIRED")]
    AuthRequired,

    /// The order-history page could not be opened after bounded retries.
    #[error("failed to open order-history page after retries")]
    #[serde(rename = "TAB_CREATE_FAILED")]
    TabCreateFailed,

    /// The requesting host is not a recognized Amazon storefront.
    #[error("unrecognized storefront domain")]
    #[serde(rename = "UNKNOWN_DOMAIN")]
    UnknownDomain,
}

/// Current wall-clock time in epoch milliseconds.
pub fn epoch_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_millis() as u64).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_range_filters() {
        assert_eq!(TimeRange::Last30Days.filter(), "last30");
        assert_eq!(TimeRange::LastThreeMonths.filter(), "months-3");
        assert_eq!(TimeRange::Last30Days.to_string(), "last30");
    }

    #[test]
    fn test_time_range_parsing() {
        assert_eq!("30".parse::<TimeRange>().unwrap(), TimeRange::Last30Days);
        assert_eq!("last30".parse::<TimeRange>().unwrap(), TimeRange::Last30Days);
        assert_eq!("3m".parse::<TimeRange>().unwrap(), TimeRange::LastThreeMonths);
        assert_eq!("months-3".parse::<TimeRange>().unwrap(), TimeRange::LastThreeMonths);
        assert!("week".parse::<TimeRange>().is_err());
    }

    #[test]
    fn test_time_range_serde() {
        assert_eq!(serde_json::to_string(&TimeRange::Last30Days).unwrap(), "\"last30\"");
        assert_eq!(serde_json::to_string(&TimeRange::LastThreeMonths).unwrap(), "\"months-3\"");
    }

    #[test]
    fn test_page_result_empty() {
        let result = PageResult::empty();
        assert_eq!(result.sum, 0.0);
        assert_eq!(result.order_count, 0);
        assert!(!result.is_blocked);
    }

    #[test]
    fn test_range_totals_into_aggregate() {
        let totals = RangeTotals { total: 123.45, order_count: 7, limit_reached: true };
        let aggregate = totals.into_aggregate(1_700_000_000_000);
        assert_eq!(aggregate.total, 123.45);
        assert_eq!(aggregate.order_count, 7);
        assert!(aggregate.limit_reached);
        assert_eq!(aggregate.computed_at, 1_700_000_000_000);
    }

    #[test]
    fn test_aggregate_serde_field_names() {
        let aggregate = RangeAggregate {
            total: 10.0,
            order_count: 2,
            limit_reached: false,
            computed_at: 42,
        };
        let json = serde_json::to_string(&aggregate).unwrap();
        assert!(json.contains("\"orderCount\":2"));
        assert!(json.contains("\"limitReached\":false"));
        assert!(json.contains("\"computedAt\":42"));

        let parsed: RangeAggregate = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, aggregate);
    }

    #[test]
    fn test_spending_error_codes() {
        assert_eq!(serde_json::to_string(&SpendingError::AuthRequired).unwrap(), "\"AUTH_REQUIRED\"");
        assert_eq!(
            serde_json::to_string(&SpendingError::TabCreateFailed).unwrap(),
            "\"TAB_CREATE_FAILED\""
        );
        assert_eq!(
            serde_json::to_string(&SpendingError::UnknownDomain).unwrap(),
            "\"UNKNOWN_DOMAIN\""
        );
    }

    #[test]
    fn test_epoch_ms_monotonic_enough() {
        let a = epoch_ms();
        let b = epoch_ms();
        assert!(b >= a);
        assert!(a > 1_600_000_000_000); // sanity: after 2020
    }
}
