// Integration tests for Price Watcher
// These tests drive the real fetcher, store and Slack notifier against local mock servers

pub mod price_tracking_tests;
pub mod watcher_tests;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use price_watcher::{
    config::{AppConfig, LoggingConfig, NotificationsConfig, SchedulerConfig, ScraperConfig, SlackConfig, StorageConfig},
    plugins::{notifiers::SlackNotifier, PluginManager},
    PriceFetcher, PriceStore, ProductManager,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Test configuration for integration tests
pub fn get_test_config(state_dir: &Path, webhook_url: Option<String>) -> AppConfig {
    AppConfig {
        storage: StorageConfig {
            products_file: state_dir.join("products.json"),
        },
        scraper: ScraperConfig {
            user_agent: "PriceWatcher-Test/1.0".to_string(),
            request_timeout: 5,
            render_fallback: false,
            render_settle_ms: 0,
            chrome_path: None,
        },
        scheduler: SchedulerConfig {
            default_interval_secs: 1,
            inter_request_delay_ms: 0,
        },
        notifications: NotificationsConfig {
            slack: SlackConfig {
                webhook_url,
                recipient: Some("#pricing".to_string()),
                username: "Price Watcher Test".to_string(),
            },
        },
        logging: LoggingConfig::default(),
    }
}

/// Wire up a manager the same way the binary does, minus the rendering fallback
pub async fn create_test_manager(config: &AppConfig) -> anyhow::Result<ProductManager> {
    let store = PriceStore::load(&config.storage.products_file)?;
    let fetcher = PriceFetcher::new(&config.scraper, None)?;

    let notifiers = PluginManager::new();
    if let Some(slack) = SlackNotifier::from_config(&config.notifications.slack)? {
        notifiers.register_notifier(Box::new(slack)).await;
    }

    Ok(ProductManager::new(
        store,
        Arc::new(fetcher),
        notifiers,
        Duration::from_millis(config.scheduler.inter_request_delay_ms),
    ))
}

/// Product page with the price inside `.price`
pub fn product_page(price_text: &str) -> String {
    format!(
        r#"<html><body><h1>Widget</h1><div class="product"><span class="price">{}</span></div></body></html>"#,
        price_text
    )
}

/// Serve `body` at `route`, replacing whatever the shop served before
pub async fn set_page(shop: &MockServer, route: &str, status: u16, body: String) {
    shop.reset().await;
    add_page(shop, route, status, body).await;
}

/// Serve `body` at `route` alongside the pages already mounted
pub async fn add_page(shop: &MockServer, route: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(shop)
        .await;
}

/// Slack endpoint that accepts every alert
pub async fn start_webhook() -> MockServer {
    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/services/T000/B000/XXXX"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&webhook)
        .await;
    webhook
}

pub fn webhook_url(webhook: &MockServer) -> String {
    format!("{}/services/T000/B000/XXXX", webhook.uri())
}

/// Alert payloads received by the webhook so far
pub async fn received_alerts(webhook: &MockServer) -> Vec<serde_json::Value> {
    webhook
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter_map(|request| serde_json::from_slice(&request.body).ok())
        .collect()
}

/// Helper to wait for async operations
pub async fn wait_for_condition<F, Fut>(mut condition: F, timeout_seconds: u64) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = std::time::Instant::now();
    let timeout = std::time::Duration::from_secs(timeout_seconds);

    while start.elapsed() < timeout {
        if condition().await {
            return true;
        }
        tokio::time::sleep(std::time::Duration::from_millis(100)).await;
    }

    false
}
