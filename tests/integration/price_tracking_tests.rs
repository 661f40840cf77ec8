use super::*;
use price_watcher::{AppError, CheckOutcome};
use rust_decimal::Decimal;
use std::str::FromStr;
use tempfile::TempDir;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

#[tokio::test]
async fn test_price_drop_triggers_single_slack_alert() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let shop = MockServer::start().await;
    let webhook = start_webhook().await;
    let config = get_test_config(dir.path(), Some(webhook_url(&webhook)));
    let mut manager = create_test_manager(&config).await?;

    set_page(&shop, "/widget", 200, product_page("$1,499.99")).await;
    let url = format!("{}/widget", shop.uri());
    manager.add_product("Gaming Laptop", &url, ".price").await?;

    set_page(&shop, "/widget", 200, product_page("$1,299.99")).await;
    let outcome = manager.check_product("Gaming Laptop").await?;
    assert_eq!(
        outcome,
        CheckOutcome::Changed {
            old: dec("1499.99"),
            new: dec("1299.99")
        }
    );

    // Same price again: no second alert
    let outcome = manager.check_product("Gaming Laptop").await?;
    assert!(!outcome.is_change());

    let alerts = received_alerts(&webhook).await;
    assert_eq!(alerts.len(), 1);

    let alert = &alerts[0];
    assert_eq!(alert["text"], "Price Change Alert: Gaming Laptop");
    assert_eq!(alert["channel"], "#pricing");
    assert_eq!(alert["attachments"][0]["color"], "#36A64F");
    assert_eq!(alert["attachments"][0]["title"], "📉 Decreased: Gaming Laptop");
    assert_eq!(alert["attachments"][0]["fields"][0]["value"], "$1499.99");
    assert_eq!(alert["attachments"][0]["fields"][1]["value"], "$1299.99");
    assert_eq!(alert["attachments"][0]["fields"][2]["value"], "$200.00 (13.3%)");
    assert_eq!(alert["attachments"][0]["actions"][0]["url"], url.as_str());

    Ok(())
}

#[tokio::test]
async fn test_state_survives_restart() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let shop = MockServer::start().await;
    let config = get_test_config(dir.path(), None);

    set_page(&shop, "/widget", 200, product_page("50.00")).await;
    {
        let mut manager = create_test_manager(&config).await?;
        manager
            .add_product("Widget", &format!("{}/widget", shop.uri()), ".price")
            .await?;

        set_page(&shop, "/widget", 200, product_page("45.00")).await;
        manager.check_product("Widget").await?;
    }

    let manager = create_test_manager(&config).await?;
    let record = manager.store().get("Widget").expect("Widget should be persisted");

    assert_eq!(record.current_price, Some(dec("45.00")));
    assert_eq!(record.previous_price, Some(dec("50.00")));
    let prices: Vec<Decimal> = manager.price_history("Widget")?.iter().map(|e| e.price).collect();
    assert_eq!(prices, vec![dec("50.00"), dec("45.00")]);

    Ok(())
}

#[tokio::test]
async fn test_batch_check_survives_failing_product() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let shop = MockServer::start().await;
    let config = get_test_config(dir.path(), None);
    let mut manager = create_test_manager(&config).await?;

    add_page(&shop, "/alpha", 200, product_page("10.00")).await;
    add_page(&shop, "/bravo", 200, product_page("20.00")).await;
    add_page(&shop, "/charlie", 200, product_page("30.00")).await;
    for name in ["alpha", "bravo", "charlie"] {
        manager
            .add_product(name, &format!("{}/{}", shop.uri(), name), ".price")
            .await?;
    }

    shop.reset().await;
    add_page(&shop, "/alpha", 200, product_page("11.00")).await;
    add_page(&shop, "/bravo", 503, "Service Unavailable".to_string()).await;
    add_page(&shop, "/charlie", 200, product_page("30.00")).await;

    let report = manager.check_all().await?;

    assert_eq!(report.checked, 3);
    assert_eq!(report.changed, 1);
    assert_eq!(report.failed, 1);
    assert!(report.outcomes[1].1.is_failure());

    assert_eq!(manager.store().get("alpha").unwrap().current_price, Some(dec("11.00")));
    assert_eq!(manager.store().get("bravo").unwrap().current_price, Some(dec("20.00")));
    assert_eq!(manager.store().get("charlie").unwrap().current_price, Some(dec("30.00")));

    Ok(())
}

#[tokio::test]
async fn test_page_without_price_keeps_unknown_price() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let shop = MockServer::start().await;
    let config = get_test_config(dir.path(), None);
    let mut manager = create_test_manager(&config).await?;

    set_page(&shop, "/spa", 200, r#"<div id="app">Loading...</div>"#.to_string()).await;
    let record = manager
        .add_product("SPA Widget", &format!("{}/spa", shop.uri()), ".price")
        .await?;
    assert!(record.current_price.is_none());

    let outcome = manager.check_product("SPA Widget").await?;
    match outcome {
        CheckOutcome::Failed { reason } => assert!(reason.contains("selector")),
        other => panic!("expected a failed check, got {:?}", other),
    }

    Ok(())
}

#[tokio::test]
async fn test_duplicate_add_makes_no_request() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let shop = MockServer::start().await;
    let config = get_test_config(dir.path(), None);
    let mut manager = create_test_manager(&config).await?;

    set_page(&shop, "/widget", 200, product_page("9.99")).await;
    let url = format!("{}/widget", shop.uri());
    manager.add_product("Widget", &url, ".price").await?;

    let err = manager.add_product("Widget", &url, ".price").await.unwrap_err();
    assert!(matches!(err, AppError::DuplicateProduct { .. }));

    let requests = shop.received_requests().await.unwrap_or_default();
    assert_eq!(requests.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_removal_is_persisted() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let shop = MockServer::start().await;
    let config = get_test_config(dir.path(), None);

    set_page(&shop, "/widget", 200, product_page("9.99")).await;
    let mut manager = create_test_manager(&config).await?;
    manager
        .add_product("Widget", &format!("{}/widget", shop.uri()), ".price")
        .await?;
    manager.remove_product("Widget")?;

    let manager = create_test_manager(&config).await?;
    assert!(manager.store().is_empty());
    assert!(matches!(
        manager.price_history("Widget"),
        Err(AppError::ProductNotFound { .. })
    ));

    Ok(())
}

#[tokio::test]
async fn test_rejected_webhook_does_not_block_update() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let shop = MockServer::start().await;
    let webhook = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&webhook)
        .await;

    let config = get_test_config(dir.path(), Some(format!("{}/hook", webhook.uri())));
    let mut manager = create_test_manager(&config).await?;

    set_page(&shop, "/widget", 200, product_page("100")).await;
    manager
        .add_product("Widget", &format!("{}/widget", shop.uri()), ".price")
        .await?;

    set_page(&shop, "/widget", 200, product_page("120")).await;
    let outcome = manager.check_product("Widget").await?;

    assert!(outcome.is_change());
    assert_eq!(manager.store().get("Widget").unwrap().current_price, Some(dec("120")));

    Ok(())
}
