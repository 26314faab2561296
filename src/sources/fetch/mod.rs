
use anyhow::{Context, Result, anyhow};
use scraper::{Html, Selector};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::net;

/// Configuration for fetching source pages
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string to use for requests
    pub user_agent: String,
    /// Timeout for HTTP requests in seconds
    pub timeout_seconds: u64,
    /// Maximum number of retry attempts for retryable errors
    pub max_retries: u32,
}

impl Default for FetchConfig {
    #[inline]
    fn default() -> Self {
        Self {
            user_agent: "contextly/0.1.0 (Knowledge Ingester)".to_string(),
            timeout_seconds: net::DEFAULT_TIMEOUT_SECONDS,
            max_retries: net::DEFAULT_RETRY_ATTEMPTS,
        }
    }
}

/// HTTP client that fetches a page and reduces it to its visible text
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl PageFetcher {
    #[inline]
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { client, config })
    }

    /// Fetch a page and return its visible text with whitespace collapsed
    #[inline]
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        let url = validate_url(url)?;

        debug!("Fetching page text from {}", url);

        let response = net::send_with_retry(
            self.client.get(url.clone()),
            self.config.max_retries,
            "Page fetch",
        )
        .await?;

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {}", url))?;

        let text = html_to_text(&body);
        debug!("Extracted {} bytes of text from {}", text.len(), url);
        Ok(text)
    }
}

/// Validate and normalize a URL
#[inline]
pub fn validate_url(url_str: &str) -> Result<Url> {
    let url = Url::parse(url_str).with_context(|| format!("Invalid URL format: {}", url_str))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(anyhow!("URL must use HTTP or HTTPS scheme: {}", url_str));
    }

    if url.host_str().is_none() {
        return Err(anyhow!("URL must have a valid host: {}", url_str));
    }

    Ok(url)
}

/// Reduce an HTML document to the text a visitor would see. Hidden elements
/// are dropped and runs of whitespace collapse to single spaces.
fn html_to_text(html: &str) -> String {
    let mut document = Html::parse_document(html);

    let hidden_selector =
        Selector::parse("script, style, noscript, template").expect("valid selector");

    let hidden_node_ids: Vec<_> = document
        .select(&hidden_selector)
        .map(|element| element.id())
        .collect();
    for node_id in hidden_node_ids {
        if let Some(mut node) = document.tree.get_mut(node_id) {
            node.detach();
        }
    }

    document
        .root_element()
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
