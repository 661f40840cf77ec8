pub mod config;
pub mod extractor;
pub mod models;
pub mod plugins;
pub mod product_manager;
pub mod scheduler;
pub mod scraper;
pub mod store;
pub mod utils;

// Re-export commonly used types
pub use crate::config::AppConfig;
pub use crate::models::{PriceHistoryEntry, ProductCatalog, ProductRecord};
pub use crate::product_manager::{CheckOutcome, ProductManager, SweepReport};
pub use crate::scheduler::{PriceWatcher, WatcherStats};
pub use crate::scraper::{ChromeRenderer, PriceFetcher, PriceSource, RenderingFetcher};
pub use crate::store::PriceStore;
pub use crate::utils::error::{AppError, FetchError};

pub type Result<T> = std::result::Result<T, AppError>;
