use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

use crate::extractor::is_valid_selector;
use crate::models::{format_price, Observation, PriceHistoryEntry, ProductRecord};
use crate::plugins::manager::PluginManager;
use crate::plugins::traits::PriceChangeEvent;
use crate::scraper::PriceSource;
use crate::store::PriceStore;
use crate::utils::error::{AppError, Result};

/// What a single product check found.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CheckOutcome {
    FirstObservation { price: Decimal },
    Unchanged { price: Decimal },
    Changed { old: Decimal, new: Decimal },
    Failed { reason: String },
}

impl CheckOutcome {
    pub fn is_change(&self) -> bool {
        matches!(self, CheckOutcome::Changed { .. })
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, CheckOutcome::Failed { .. })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SweepReport {
    pub checked: usize,
    pub changed: usize,
    pub failed: usize,
    pub outcomes: Vec<(String, CheckOutcome)>,
    pub total_time_ms: u64,
}

/// Owns the store and decides, for every fresh reading, what changes and who hears about it.
pub struct ProductManager {
    store: PriceStore,
    source: Arc<dyn PriceSource>,
    notifiers: PluginManager,
    inter_request_delay: Duration,
}

impl ProductManager {
    pub fn new(
        store: PriceStore,
        source: Arc<dyn PriceSource>,
        notifiers: PluginManager,
        inter_request_delay: Duration,
    ) -> Self {
        Self {
            store,
            source,
            notifiers,
            inter_request_delay,
        }
    }

    pub fn store(&self) -> &PriceStore {
        &self.store
    }

    pub fn notifiers(&self) -> &PluginManager {
        &self.notifiers
    }

    /// Start tracking a product. The initial fetch is best effort: a failure
    /// leaves the price unknown until the next successful check.
    pub async fn add_product(&mut self, name: &str, url: &str, selector: &str) -> Result<ProductRecord> {
        if self.store.contains(name) {
            return Err(AppError::DuplicateProduct { name: name.to_string() });
        }

        if name.trim().is_empty() {
            return Err(AppError::Validation("Product name must not be empty".to_string()));
        }

        match url::Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            _ => return Err(AppError::Validation(format!("Invalid URL: {}", url))),
        }

        if !is_valid_selector(selector) {
            return Err(AppError::Validation(format!("Invalid CSS selector: {}", selector)));
        }

        let mut record = ProductRecord::new(url, selector);
        match self.source.fetch_price(url, selector).await {
            Ok(price) => {
                record.observe(price, Utc::now());
                tracing::info!("Added {} at {}", name, format_price(price));
            }
            Err(e) => {
                tracing::warn!("Added {} without an initial price: {}", name, e);
            }
        }

        self.store.add(name, record.clone())?;
        Ok(record)
    }

    pub fn remove_product(&mut self, name: &str) -> Result<ProductRecord> {
        let record = self.store.remove(name)?;
        tracing::info!("Removed {}", name);
        Ok(record)
    }

    pub fn list_products(&self) -> impl Iterator<Item = (&String, &ProductRecord)> {
        self.store.list()
    }

    pub fn price_history(&self, name: &str) -> Result<&[PriceHistoryEntry]> {
        self.store
            .get(name)
            .map(|record| record.price_history.as_slice())
            .ok_or_else(|| AppError::ProductNotFound { name: name.to_string() })
    }

    /// Fetch the current price of `name` and apply it.
    ///
    /// Fetch failures become [`CheckOutcome::Failed`] and leave the record
    /// untouched. Only unknown names and persistence failures are errors.
    pub async fn check_product(&mut self, name: &str) -> Result<CheckOutcome> {
        let record = self
            .store
            .get(name)
            .ok_or_else(|| AppError::ProductNotFound { name: name.to_string() })?;
        let (url, selector) = (record.url.clone(), record.selector.clone());

        let price = match self.source.fetch_price(&url, &selector).await {
            Ok(price) => price,
            Err(e) => {
                tracing::warn!("Check failed for {}: {}", name, e);
                return Ok(CheckOutcome::Failed { reason: e.to_string() });
            }
        };

        let mut observed = record.clone();
        let outcome = match observed.observe(price, Utc::now()) {
            Observation::First => {
                tracing::info!("{}: first price {}", name, format_price(price));
                CheckOutcome::FirstObservation { price }
            }
            Observation::Unchanged => {
                tracing::debug!("{}: unchanged at {}", name, format_price(price));
                CheckOutcome::Unchanged { price }
            }
            Observation::Changed { old } => {
                tracing::info!(
                    "{}: price changed {} -> {}",
                    name,
                    format_price(old),
                    format_price(price)
                );
                let event = PriceChangeEvent::new(name, old, price, url.as_str());
                let delivered = self.notifiers.announce(&event).await;
                tracing::debug!("{}: alert delivered by {} notifier(s)", name, delivered);
                CheckOutcome::Changed { old, new: price }
            }
        };

        self.store.update(name, |record| *record = observed)?;
        Ok(outcome)
    }

    /// Check every product once, in store order, pausing between products.
    pub async fn check_all(&mut self) -> Result<SweepReport> {
        let start_time = Instant::now();
        let names = self.store.names();
        let mut report = SweepReport::default();

        tracing::info!("Checking {} products", names.len());

        for (index, name) in names.iter().enumerate() {
            if index > 0 && !self.inter_request_delay.is_zero() {
                tokio::time::sleep(self.inter_request_delay).await;
            }

            let outcome = self.check_product(name).await?;
            report.checked += 1;
            if outcome.is_change() {
                report.changed += 1;
            }
            if outcome.is_failure() {
                report.failed += 1;
            }
            report.outcomes.push((name.clone(), outcome));
        }

        report.total_time_ms = start_time.elapsed().as_millis() as u64;
        tracing::info!(
            "Sweep complete: {} checked, {} changed, {} failed in {}ms",
            report.checked,
            report.changed,
            report.failed,
            report.total_time_ms
        );

        Ok(report)
    }
}
