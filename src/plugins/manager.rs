use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use super::traits::{Notifier, PriceChangeEvent};

pub type NotifierBox = Box<dyn Notifier>;

/// Registry of notification transports, keyed by plugin type.
#[derive(Clone)]
pub struct PluginManager {
    notifiers: Arc<RwLock<HashMap<String, NotifierBox>>>,
}

impl PluginManager {
    pub fn new() -> Self {
        Self {
            notifiers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a notifier plugin, replacing any previous one of the same type
    pub async fn register_notifier(&self, plugin: NotifierBox) {
        let plugin_type = plugin.plugin_type().to_string();
        tracing::debug!("Registering notifier '{}'", plugin_type);

        let mut notifiers = self.notifiers.write().await;
        notifiers.insert(plugin_type, plugin);
    }

    /// Check if a notifier plugin exists
    pub async fn has_notifier(&self, plugin_type: &str) -> bool {
        let notifiers = self.notifiers.read().await;
        notifiers.contains_key(plugin_type)
    }

    /// List all available notifier types
    pub async fn list_notifier_types(&self) -> Vec<String> {
        let notifiers = self.notifiers.read().await;
        notifiers.keys().cloned().collect()
    }

    /// Deliver `event` through every registered notifier.
    ///
    /// Delivery failures are logged and otherwise ignored; the return value is
    /// the number of notifiers that reported success.
    pub async fn announce(&self, event: &PriceChangeEvent) -> usize {
        let notifiers = self.notifiers.read().await;
        let mut delivered = 0;

        for (plugin_type, notifier) in notifiers.iter() {
            match notifier.announce(event).await {
                Ok(result) if result.success => {
                    tracing::debug!("Notifier {} delivered alert for {}", plugin_type, event.product_name);
                    delivered += 1;
                }
                Ok(result) => {
                    tracing::warn!(
                        "Notifier {} did not deliver alert for {}: {}",
                        plugin_type,
                        event.product_name,
                        result.error.unwrap_or_default()
                    );
                }
                Err(e) => {
                    tracing::warn!("Notifier {} failed for {}: {}", plugin_type, event.product_name, e);
                }
            }
        }

        delivered
    }

    /// Shutdown all plugins
    pub async fn shutdown(&self) {
        let mut notifiers = self.notifiers.write().await;
        for (_, plugin) in notifiers.drain() {
            if let Err(e) = plugin.shutdown().await {
                tracing::warn!("Error shutting down notifier plugin: {}", e);
            }
        }
    }
}

impl Default for PluginManager {
    fn default() -> Self {
        Self::new()
    }
}
