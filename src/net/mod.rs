// Shared HTTP plumbing for the service clients


use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use reqwest::{RequestBuilder, Response, StatusCode};
use tracing::{debug, warn};

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
const EXPONENTIAL_BACKOFF_BASE: u64 = 2;

/// Build the HTTP client shared by a service client, with the default
/// per-request timeout applied.
#[inline]
pub fn default_client() -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))
        .build()
        .context("Failed to build HTTP client")
}

/// Sends a request, retrying transient failures with exponential backoff.
///
/// Server errors (5xx), 429 responses, timeouts, and connection failures are
/// retried; other client errors fail immediately. The request builder must be
/// cloneable, which holds for every JSON-body request this crate issues.
pub async fn send_with_retry(
    request: RequestBuilder,
    retry_attempts: u32,
    label: &str,
) -> Result<Response> {
    let mut last_error = None;

    for attempt in 1..=retry_attempts {
        debug!(
            "Sending {} request (attempt {}/{})",
            label, attempt, retry_attempts
        );

        let attempt_request = request
            .try_clone()
            .ok_or_else(|| anyhow!("Request body for {} is not cloneable", label))?;

        match attempt_request.send().await {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    return Ok(response);
                }

                let body = response.text().await.unwrap_or_default();
                if is_retryable_status(status) {
                    warn!(
                        "{} request returned status {} (attempt {}/{})",
                        label, status, attempt, retry_attempts
                    );
                    last_error = Some(anyhow!("HTTP error {}: {}", status, body));
                } else {
                    warn!("Client error (status {}), not retrying", status);
                    return Err(anyhow!("HTTP error {}: {}", status, body));
                }
            }
            Err(e) if is_retryable_transport_error(&e) => {
                warn!(
                    "{} request failed: {} (attempt {}/{})",
                    label, e, attempt, retry_attempts
                );
                last_error = Some(anyhow::Error::new(e));
            }
            Err(e) => {
                return Err(
                    anyhow::Error::new(e).context(format!("{} request failed", label))
                );
            }
        }

        if attempt < retry_attempts {
            let delay_ms = EXPONENTIAL_BACKOFF_BASE.pow(attempt - 1) * 1000;
            debug!("Retrying {} request in {}ms", label, delay_ms);
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        }
    }

    let error = last_error.unwrap_or_else(|| anyhow!("no response received"));
    Err(error.context(format!(
        "{} request failed after {} attempts",
        label, retry_attempts
    )))
}

fn is_retryable_status(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

fn is_retryable_transport_error(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}
