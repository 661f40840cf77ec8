use super::*;
use price_watcher::PriceWatcher;
use rust_decimal::Decimal;
use tempfile::TempDir;
use tokio::sync::Mutex;

#[tokio::test]
async fn test_watcher_picks_up_price_change() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let shop = MockServer::start().await;
    let webhook = start_webhook().await;
    let config = get_test_config(dir.path(), Some(webhook_url(&webhook)));

    set_page(&shop, "/widget", 200, product_page("$25.00")).await;
    let mut manager = create_test_manager(&config).await?;
    manager
        .add_product("Widget", &format!("{}/widget", shop.uri()), ".price")
        .await?;

    let manager = Arc::new(Mutex::new(manager));
    let mut watcher = PriceWatcher::new(Arc::clone(&manager)).await?;
    watcher
        .start(Duration::from_secs(config.scheduler.default_interval_secs))
        .await?;

    // The initial sweep runs before start returns
    assert_eq!(watcher.stats().await.runs, 1);

    set_page(&shop, "/widget", 200, product_page("$19.99")).await;

    let polled_manager = Arc::clone(&manager);
    let updated = wait_for_condition(
        || {
            let manager = Arc::clone(&polled_manager);
            async move {
                let manager = manager.lock().await;
                let current = manager.store().get("Widget").and_then(|r| r.current_price);
                current == Some(Decimal::new(1999, 2))
            }
        },
        5,
    )
    .await;
    assert!(updated, "watcher never observed the new price");

    watcher.shutdown().await?;

    let stats = watcher.stats().await;
    assert!(stats.runs >= 2);
    assert_eq!(stats.failures, 0);
    assert_eq!(received_alerts(&webhook).await.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_watcher_with_no_products() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let config = get_test_config(dir.path(), None);
    let manager = create_test_manager(&config).await?;

    let mut watcher = PriceWatcher::new(Arc::new(Mutex::new(manager))).await?;
    watcher.start(Duration::from_secs(60)).await?;

    let stats = watcher.stats().await;
    assert_eq!(stats.runs, 1);
    assert_eq!(stats.successes, 1);
    assert_eq!(stats.last_report.map(|report| report.checked), Some(0));

    watcher.shutdown().await?;
    Ok(())
}
