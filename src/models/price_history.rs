use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::decimal_json;

/// One recorded price, appended on a first observation or a change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PriceHistoryEntry {
    pub timestamp: DateTime<Utc>,
    #[serde(with = "decimal_json")]
    pub price: Decimal,
}

impl PriceHistoryEntry {
    pub fn new(timestamp: DateTime<Utc>, price: Decimal) -> Self {
        Self { timestamp, price }
    }
}
