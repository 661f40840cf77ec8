use regex::Regex;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};
use std::str::FromStr;
use std::sync::OnceLock;

fn price_regex() -> &'static Regex {
    static PRICE_REGEX: OnceLock<Regex> = OnceLock::new();
    // Digits with optional comma grouping, then at most one decimal part
    PRICE_REGEX.get_or_init(|| Regex::new(r"\d[\d,]*(?:\.\d+)?").expect("price pattern is valid"))
}

/// Find the first element matching `selector` in `html` and parse a price
/// out of its visible text.
///
/// `None` covers every "nothing usable here" case: an unparsable selector,
/// no matching element, or text without a number. Callers treat it as the
/// cue to try a more expensive fetch strategy.
pub fn extract_price(html: &str, selector: &str) -> Option<Decimal> {
    let selector = Selector::parse(selector).ok()?;
    let document = Html::parse_document(html);
    let element = document.select(&selector).next()?;

    parse_price_text(&element_text(element))
}

/// Visible text of an element with each text node trimmed and the pieces
/// joined, so split markup such as `19<sup>.99</sup>` reads `19.99`.
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect()
}

/// Parse the first number in `text`. Commas are grouping separators and are
/// dropped; `.` is always the decimal point.
pub fn parse_price_text(text: &str) -> Option<Decimal> {
    let matched = price_regex().find(text)?;
    let digits = matched.as_str().replace(',', "");
    if digits.is_empty() {
        return None;
    }
    Decimal::from_str(&digits).ok()
}

/// Whether `selector` is valid CSS as understood by the extractor.
pub fn is_valid_selector(selector: &str) -> bool {
    !selector.trim().is_empty() && Selector::parse(selector).is_ok()
}
