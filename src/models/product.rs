use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::models::{decimal_json, PriceHistoryEntry};

/// Readings whose absolute difference is at or below this are the same price.
pub const PRICE_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductRecord {
    pub url: String,
    pub selector: String,

    #[serde(default, with = "decimal_json::option")]
    pub current_price: Option<Decimal>,
    #[serde(default, with = "decimal_json::option")]
    pub previous_price: Option<Decimal>,

    pub added_at: DateTime<Utc>,
    #[serde(default)]
    pub last_checked_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub price_history: Vec<PriceHistoryEntry>,
}

/// How a fresh reading relates to the record it was applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    First,
    Unchanged,
    Changed { old: Decimal },
}

impl ProductRecord {
    pub fn new(url: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            selector: selector.into(),
            current_price: None,
            previous_price: None,
            added_at: Utc::now(),
            last_checked_at: None,
            price_history: Vec::new(),
        }
    }

    /// Apply a successfully fetched price.
    ///
    /// The first reading seeds `current_price` and the history; a reading
    /// within [`PRICE_TOLERANCE`] of the current price only touches
    /// `last_checked_at`; anything further away shifts the current price into
    /// `previous_price` and appends to the history.
    pub fn observe(&mut self, price: Decimal, at: DateTime<Utc>) -> Observation {
        self.last_checked_at = Some(at);

        match self.current_price {
            None => {
                self.current_price = Some(price);
                self.price_history.push(PriceHistoryEntry::new(at, price));
                Observation::First
            }
            Some(old) if !is_price_change(old, price) => Observation::Unchanged,
            Some(old) => {
                self.previous_price = Some(old);
                self.current_price = Some(price);
                self.price_history.push(PriceHistoryEntry::new(at, price));
                Observation::Changed { old }
            }
        }
    }

    pub fn last_entry(&self) -> Option<&PriceHistoryEntry> {
        self.price_history.last()
    }
}

pub fn is_price_change(old: Decimal, new: Decimal) -> bool {
    (new - old).abs() > PRICE_TOLERANCE
}

/// `$` and two decimals, halves rounded away from zero.
pub fn format_price(price: Decimal) -> String {
    format!("${:.2}", price.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
}
