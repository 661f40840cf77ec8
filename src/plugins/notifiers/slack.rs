use crate::config::SlackConfig;
use crate::models::format_price;
use crate::plugins::traits::{format_percent, ChangeType, NotificationResult, Notifier, PriceChangeEvent};
use crate::utils::error::AppError;
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use std::time::Duration;

/// Posts price alerts to a Slack incoming webhook.
pub struct SlackNotifier {
    client: Client,
    webhook_url: String,
    username: String,
    recipient: Option<String>,
}

impl SlackNotifier {
    pub fn new(
        webhook_url: impl Into<String>,
        username: impl Into<String>,
        recipient: Option<String>,
    ) -> Result<Self, AppError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(SlackNotifier {
            client,
            webhook_url: webhook_url.into(),
            username: username.into(),
            recipient,
        })
    }

    /// `None` when no webhook is configured; alerts are then simply not sent.
    pub fn from_config(config: &SlackConfig) -> Result<Option<Self>, AppError> {
        match config.webhook_url.as_deref() {
            Some(webhook_url) => {
                Self::new(webhook_url, config.username.clone(), config.recipient.clone()).map(Some)
            }
            None => Ok(None),
        }
    }

    fn get_attachment_color(&self, change_type: ChangeType) -> &'static str {
        match change_type {
            ChangeType::Increased => "#FF6B00",
            ChangeType::Decreased | ChangeType::Unchanged => "#36A64F",
        }
    }

    fn get_direction(&self, change_type: ChangeType) -> &'static str {
        match change_type {
            ChangeType::Increased => "📈 Increased",
            ChangeType::Decreased | ChangeType::Unchanged => "📉 Decreased",
        }
    }

    fn format_change(&self, event: &PriceChangeEvent) -> String {
        let amount = format_price(event.difference().abs());
        match event.percent_change() {
            Some(pct) => format!("{} ({})", amount, format_percent(pct.abs())),
            None => format!("{} (n/a)", amount),
        }
    }

    fn create_webhook_payload(&self, event: &PriceChangeEvent) -> serde_json::Value {
        let change_type = event.change_type();

        let mut payload = json!({
            "text": format!("Price Change Alert: {}", event.product_name),
            "username": self.username,
            "attachments": [
                {
                    "color": self.get_attachment_color(change_type),
                    "title": format!("{}: {}", self.get_direction(change_type), event.product_name),
                    "fields": [
                        {
                            "title": "Old Price",
                            "value": format_price(event.old_price),
                            "short": true
                        },
                        {
                            "title": "New Price",
                            "value": format_price(event.new_price),
                            "short": true
                        },
                        {
                            "title": "Change",
                            "value": self.format_change(event),
                            "short": true
                        }
                    ],
                    "actions": [
                        {
                            "type": "button",
                            "text": "View Product",
                            "url": event.url
                        }
                    ],
                    "ts": event.detected_at.timestamp()
                }
            ]
        });

        if let Some(recipient) = &self.recipient {
            payload["channel"] = json!(recipient);
        }

        payload
    }
}

#[async_trait]
impl Notifier for SlackNotifier {
    fn name(&self) -> &str {
        "Slack Notifier"
    }

    fn plugin_type(&self) -> &str {
        "slack"
    }

    fn description(&self) -> &str {
        "Sends price change alerts via Slack incoming webhooks"
    }

    async fn announce(
        &self,
        event: &PriceChangeEvent,
    ) -> Result<NotificationResult, Box<dyn std::error::Error + Send + Sync>> {
        let payload = self.create_webhook_payload(event);

        let response = self.client.post(&self.webhook_url).json(&payload).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Slack webhook returned {}: {}", status, body).into());
        }

        Ok(NotificationResult {
            success: true,
            message_id: Some(format!("slack-{}", event.detected_at.timestamp())),
            error: None,
        })
    }
}
