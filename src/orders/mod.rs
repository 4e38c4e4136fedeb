//! Order-history scraping: storefront registry, amount parsing, page
//! extraction, tab-style page fetching, and pagination.

pub mod amount;
pub mod extractor;
pub mod fetch;
pub mod models;
pub mod paginate;
pub mod selectors;
pub mod storefronts;

pub use fetch::{PageFetch, TabFetcher};
pub use models::{PageResult, RangeAggregate, SpendingError, TimeRange};
pub use storefronts::Storefront;
