use std::path::PathBuf;

use thiserror::Error;

/// Why a single price fetch failed.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Network error fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("Could not extract a price from {url} with selector '{selector}': {reason}")]
    Extraction {
        url: String,
        selector: String,
        reason: String,
    },
}

impl FetchError {
    pub fn network(url: &str, message: impl Into<String>) -> Self {
        FetchError::Network {
            url: url.to_string(),
            message: message.into(),
        }
    }

    pub fn extraction(url: &str, selector: &str, reason: impl Into<String>) -> Self {
        FetchError::Extraction {
            url: url.to_string(),
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_network(&self) -> bool {
        matches!(self, FetchError::Network { .. })
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to persist {}: {source}", .path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Scheduler error: {0}")]
    Scheduler(#[from] tokio_cron_scheduler::JobSchedulerError),

    #[error("Product {name} already tracked")]
    DuplicateProduct { name: String },

    #[error("Product {name} not found")]
    ProductNotFound { name: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AppError::Persistence {
            path: path.into(),
            source,
        }
    }

    /// Conditions the CLI reports as warnings rather than failures.
    pub fn is_warning(&self) -> bool {
        matches!(
            self,
            AppError::DuplicateProduct { .. } | AppError::ProductNotFound { .. }
        )
    }
}

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
