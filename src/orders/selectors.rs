//! CSS selectors for Amazon order-history pages.
//!
//! This file contains all CSS selectors used for parsing order pages.
//! Update this file when Amazon changes their HTML structure.
//!
//! **Update process**: When extraction starts returning zero matches on a
//! live account, capture an HTML sample, update selectors, and add a test
//! fixture.

use scraper::Selector;
use std::sync::LazyLock;

/// Order-header summary line item. One order card renders several of
/// these (date, total, ship-to); the total item carries the amount as
/// its last text line.
pub static ORDER_HEADER_ITEM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".order-header__header-list-item").unwrap());

/// Sign-in form shown when the session has expired mid-scrape.
pub static SIGNIN_FORM: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("form[action*='signin']").unwrap());

/// Marker substring found in the body text of CAPTCHA challenge pages,
/// compared case-insensitively.
pub static CAPTCHA_MARKER: &str = "captcha";
