use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub scraper: ScraperConfig,
    pub scheduler: SchedulerConfig,
    pub notifications: NotificationsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub products_file: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub user_agent: String,
    /// Seconds before a page fetch is abandoned.
    pub request_timeout: u64,
    pub render_fallback: bool,
    /// How long the rendered page is given to run its scripts.
    pub render_settle_ms: u64,
    pub chrome_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    pub default_interval_secs: u64,
    pub inter_request_delay_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationsConfig {
    pub slack: SlackConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SlackConfig {
    pub webhook_url: Option<String>,
    pub recipient: Option<String>,
    pub username: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
    pub directory: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            products_file: PathBuf::from("products.json"),
        }
    }
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: 10,
            render_fallback: true,
            render_settle_ms: 3000,
            chrome_path: None,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_interval_secs: 3600,
            inter_request_delay_ms: 2000,
        }
    }
}

impl Default for SlackConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            recipient: None,
            username: "Price Watcher".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "price_watcher=info".to_string(),
            directory: None,
        }
    }
}

impl AppConfig {
    /// Layered load: defaults, `config/default` and `config/local` (or an
    /// explicit file), `PRICE_WATCHER_*` variables, then the legacy
    /// `SLACK_WEBHOOK_URL` / `EMAIL_TO` / `CHROME_PATH` variables.
    pub fn from_env(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        builder = match config_file {
            Some(path) => builder.add_source(File::from(path)),
            None => builder
                .add_source(File::with_name("config/default").required(false))
                // Add local config (ignored by git)
                .add_source(File::with_name("config/local").required(false)),
        };

        let s = builder
            .add_source(
                Environment::with_prefix("PRICE_WATCHER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut config: AppConfig = s.try_deserialize()?;
        config.apply_legacy_env();
        config.validate()?;
        Ok(config)
    }

    fn apply_legacy_env(&mut self) {
        let slack = &mut self.notifications.slack;
        if slack.webhook_url.is_none() {
            slack.webhook_url = non_empty_var("SLACK_WEBHOOK_URL");
        }
        if slack.recipient.is_none() {
            slack.recipient = non_empty_var("EMAIL_TO");
        }
        if self.scraper.chrome_path.is_none() {
            self.scraper.chrome_path = non_empty_var("CHROME_PATH");
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.products_file.as_os_str().is_empty() {
            return Err(ConfigError::Message("Storage products_file must not be empty".into()));
        }

        if self.scraper.request_timeout == 0 {
            return Err(ConfigError::Message("Scraper request_timeout must be greater than 0".into()));
        }

        if self.scraper.user_agent.trim().is_empty() {
            return Err(ConfigError::Message("Scraper user_agent must not be empty".into()));
        }

        if self.scheduler.default_interval_secs == 0 {
            return Err(ConfigError::Message("Scheduler default_interval_secs must be greater than 0".into()));
        }

        if let Some(webhook_url) = &self.notifications.slack.webhook_url {
            if Url::parse(webhook_url).is_err() {
                return Err(ConfigError::Message("Invalid Slack webhook URL format".into()));
            }
        }

        Ok(())
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}
