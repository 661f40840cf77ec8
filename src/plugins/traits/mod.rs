pub mod notifier;

pub use notifier::{format_percent, ChangeType, NotificationResult, Notifier, PriceChangeEvent};
