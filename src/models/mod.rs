use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub mod decimal_json;
pub mod price_history;
pub mod product;

// Re-exports for convenience
pub use price_history::*;
pub use product::*;

/// The persisted document: every tracked product keyed by its unique name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProductCatalog {
    #[serde(default)]
    pub products: BTreeMap<String, ProductRecord>,
}
