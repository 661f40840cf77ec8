use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions};
use reqwest::Client;
use rust_decimal::Decimal;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ScraperConfig;
use crate::extractor::{extract_price, parse_price_text};
use crate::utils::error::{AppError, FetchError};

/// Anything that can turn a product page into a price.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn fetch_price(&self, url: &str, selector: &str) -> Result<Decimal, FetchError>;
}

/// A fetch strategy that executes page scripts before reading the element.
#[async_trait]
pub trait RenderingFetcher: Send + Sync {
    /// Text of the first element matching `selector` once the page has rendered.
    async fn render_element_text(&self, url: &str, selector: &str) -> Result<String, FetchError>;
}

/// Static HTML first, rendered DOM only when that finds nothing.
pub struct PriceFetcher {
    client: Client,
    renderer: Option<Arc<dyn RenderingFetcher>>,
}

impl PriceFetcher {
    pub fn new(config: &ScraperConfig, renderer: Option<Arc<dyn RenderingFetcher>>) -> Result<Self, AppError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout))
            .build()?;

        Ok(Self { client, renderer })
    }

    pub fn has_renderer(&self) -> bool {
        self.renderer.is_some()
    }

    async fn fetch_page(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::network(url, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::network(url, format!("HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::network(url, format!("Failed to read body: {}", e)))
    }

    async fn fetch_rendered(
        &self,
        renderer: &dyn RenderingFetcher,
        url: &str,
        selector: &str,
    ) -> Result<Decimal, FetchError> {
        let text = renderer.render_element_text(url, selector).await?;
        parse_price_text(&text).ok_or_else(|| {
            FetchError::extraction(url, selector, format!("no price in rendered text '{}'", text))
        })
    }
}

#[async_trait]
impl PriceSource for PriceFetcher {
    async fn fetch_price(&self, url: &str, selector: &str) -> Result<Decimal, FetchError> {
        let body = self.fetch_page(url).await?;

        if let Some(price) = extract_price(&body, selector) {
            return Ok(price);
        }

        match &self.renderer {
            Some(renderer) => {
                tracing::debug!("No price in static HTML for {}, trying rendered page", url);
                self.fetch_rendered(renderer.as_ref(), url, selector).await
            }
            None => Err(FetchError::extraction(
                url,
                selector,
                "no price found in page and no rendering fallback available",
            )),
        }
    }
}

/// Headless Chrome rendering. A browser is launched per call and dropped
/// before the call returns.
#[derive(Debug, Clone)]
pub struct ChromeRenderer {
    chrome_path: PathBuf,
    user_agent: String,
    settle_delay: Duration,
}

impl ChromeRenderer {
    pub fn new(chrome_path: PathBuf, user_agent: impl Into<String>, settle_delay: Duration) -> Self {
        Self {
            chrome_path,
            user_agent: user_agent.into(),
            settle_delay,
        }
    }

    /// A renderer if rendering is enabled and a Chrome executable can be
    /// found, otherwise `None`.
    pub fn detect(config: &ScraperConfig) -> Option<Self> {
        if !config.render_fallback {
            tracing::debug!("Rendering fallback disabled by configuration");
            return None;
        }

        let chrome_path = match &config.chrome_path {
            Some(path) => PathBuf::from(path),
            None => match headless_chrome::browser::default_executable() {
                Ok(path) => path,
                Err(e) => {
                    tracing::info!("Rendering fallback unavailable: {}", e);
                    return None;
                }
            },
        };

        if !chrome_path.exists() {
            tracing::info!("Rendering fallback unavailable: {} does not exist", chrome_path.display());
            return None;
        }

        Some(Self::new(
            chrome_path,
            config.user_agent.clone(),
            Duration::from_millis(config.render_settle_ms),
        ))
    }

    fn render_blocking(&self, url: &str, selector: &str) -> Result<String, FetchError> {
        let extraction = |reason: String| FetchError::extraction(url, selector, reason);

        let mut launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false) // Often needed in containerized environments
            .args(vec![
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-extensions"),
            ])
            .build()
            .map_err(|e| extraction(format!("Failed to create launch options: {}", e)))?;
        launch_options.path = Some(self.chrome_path.clone());

        let browser = Browser::new(launch_options)
            .map_err(|e| extraction(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| extraction(format!("Failed to create tab: {}", e)))?;

        tab.set_user_agent(&self.user_agent, None, None)
            .map_err(|e| extraction(format!("Failed to set user agent: {}", e)))?;

        tab.navigate_to(url)
            .and_then(|tab| tab.wait_until_navigated())
            .map_err(|e| extraction(format!("Navigation failed: {}", e)))?;

        // Give client-side scripts time to render the price
        std::thread::sleep(self.settle_delay);

        let text = tab
            .find_element(selector)
            .and_then(|element| element.get_inner_text())
            .map_err(|e| extraction(format!("Element not found in rendered page: {}", e)));

        let _ = tab.close(true);
        drop(browser);

        text
    }
}

#[async_trait]
impl RenderingFetcher for ChromeRenderer {
    async fn render_element_text(&self, url: &str, selector: &str) -> Result<String, FetchError> {
        let renderer = self.clone();
        let (url_owned, selector_owned) = (url.to_string(), selector.to_string());

        tokio::task::spawn_blocking(move || renderer.render_blocking(&url_owned, &selector_owned))
            .await
            .map_err(|e| FetchError::extraction(url, selector, format!("Rendering task failed: {}", e)))?
    }
}
