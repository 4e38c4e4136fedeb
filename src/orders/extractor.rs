//! Extraction of per-page order totals from rendered order-history HTML.

use crate::orders::amount::parse_amount;
use crate::orders::models::PageResult;
use crate::orders::selectors::{CAPTCHA_MARKER, ORDER_HEADER_ITEM, SIGNIN_FORM};
use crate::orders::storefronts::Storefront;
use scraper::Html;
use tracing::{debug, trace};

/// Extracts the structural summary of one order-history listing page.
///
/// Infallible by contract: a page with unexpected markup degrades to an
/// empty result, which pagination treats as a stop condition.
pub fn extract_page(html: &str, storefront: Storefront) -> PageResult {
    let document = Html::parse_document(html);

    let is_blocked = detect_blocked(&document);
    if is_blocked {
        debug!("Page is blocked by CAPTCHA or sign-in form");
        return PageResult { sum: 0.0, order_count: 0, is_blocked: true };
    }

    let labels = storefront.total_labels();
    let format = storefront.number_format();

    let mut sum = 0.0;
    let mut order_count = 0;

    for item in document.select(&ORDER_HEADER_ITEM) {
        // Text nodes of the item stand in for its rendered lines; the
        // amount is conventionally the last one.
        let lines: Vec<&str> =
            item.text().map(str::trim).filter(|line| !line.is_empty()).collect();

        if lines.is_empty() {
            continue;
        }

        let joined = lines.join("\n").to_lowercase();
        if !labels.iter().any(|label| joined.contains(label)) {
            continue;
        }

        let price_line = lines[lines.len() - 1];
        let amount = parse_amount(price_line, format);
        trace!("Matched order total line {:?} -> {}", price_line, amount);

        // Zero means "no parseable amount", not a real order.
        if amount > 0.0 {
            sum += amount;
            order_count += 1;
        }
    }

    debug!("Extracted {} orders summing {:.2}", order_count, sum);

    PageResult { sum, order_count, is_blocked: false }
}

/// Checks the two block signals: a CAPTCHA marker in the body text or a
/// sign-in form element.
fn detect_blocked(document: &Html) -> bool {
    if document.select(&SIGNIN_FORM).next().is_some() {
        return true;
    }

    let body_text: String = document.root_element().text().collect();
    body_text.to_lowercase().contains(CAPTCHA_MARKER)
}
