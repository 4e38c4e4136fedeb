//! amz-spending - Amazon order-history spending tracker
//!
//! Fetches paginated order-history pages with TLS fingerprint emulation,
//! extracts locale-formatted order totals, and caches per-range aggregates.

pub mod aggregate;
pub mod cache;
pub mod commands;
pub mod config;
pub mod orders;
pub mod router;

pub use config::Config;
pub use orders::models::{RangeAggregate, SpendingError, TimeRange};
pub use orders::storefronts::Storefront;
pub use router::{Router, SpendingRequest, SpendingResponse};
