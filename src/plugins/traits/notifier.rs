use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeType {
    Increased,
    Decreased,
    Unchanged,
}

/// A detected price change, as handed to every registered notifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceChangeEvent {
    pub product_name: String,
    pub old_price: Decimal,
    pub new_price: Decimal,
    pub url: String,
    pub detected_at: DateTime<Utc>,
}

impl PriceChangeEvent {
    pub fn new(
        product_name: impl Into<String>,
        old_price: Decimal,
        new_price: Decimal,
        url: impl Into<String>,
    ) -> Self {
        Self {
            product_name: product_name.into(),
            old_price,
            new_price,
            url: url.into(),
            detected_at: Utc::now(),
        }
    }

    pub fn change_type(&self) -> ChangeType {
        match self.new_price.cmp(&self.old_price) {
            std::cmp::Ordering::Greater => ChangeType::Increased,
            std::cmp::Ordering::Less => ChangeType::Decreased,
            std::cmp::Ordering::Equal => ChangeType::Unchanged,
        }
    }

    /// Signed `new - old`.
    pub fn difference(&self) -> Decimal {
        self.new_price - self.old_price
    }

    /// Signed percentage relative to the old price; `None` when the old price is zero.
    pub fn percent_change(&self) -> Option<Decimal> {
        self.difference()
            .checked_div(self.old_price)
            .map(|ratio| ratio * Decimal::ONE_HUNDRED)
    }
}

/// One decimal and a `%` sign, halves rounded away from zero.
pub fn format_percent(pct: Decimal) -> String {
    format!("{:.1}%", pct.round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationResult {
    pub success: bool,
    pub message_id: Option<String>,
    pub error: Option<String>,
}

/// Trait for implementing notification transports (Slack, ...)
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Plugin metadata
    fn name(&self) -> &str;
    fn plugin_type(&self) -> &str;
    fn description(&self) -> &str;

    async fn announce(
        &self,
        event: &PriceChangeEvent,
    ) -> Result<NotificationResult, Box<dyn std::error::Error + Send + Sync>>;

    async fn shutdown(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}
