use super::gate::ConnectionGate;
use super::retry::RetryPolicy;
use crate::errors::{AppError, AppResult};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Shared HTTP client for a fetch run.
///
/// Wraps one `reqwest::Client` (one connection pool) together with the
/// [`ConnectionGate`] that caps simultaneous requests and the [`RetryPolicy`]
/// applied to every request. All three are read-only after construction, so
/// clones are cheap handles onto the same pool and gate.
#[derive(Debug, Clone)]
pub struct RetryClient {
    client: reqwest::Client,
    gate: ConnectionGate,
    policy: RetryPolicy,
}

impl RetryClient {
    /// Builds a client allowing at most `concurrency` requests in flight.
    ///
    /// # Errors
    ///
    /// Returns `InvalidInput` for a zero concurrency and `NetworkError` if the
    /// underlying HTTP client cannot be built.
    pub fn new(
        concurrency: usize,
        policy: RetryPolicy,
        connect_timeout: Duration,
    ) -> AppResult<Self> {
        let gate = ConnectionGate::new(concurrency)?;
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(concurrency)
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| AppError::NetworkError(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            gate,
            policy,
        })
    }

    pub fn gate(&self) -> &ConnectionGate {
        &self.gate
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Sends the request produced by `build`, retrying per the policy, and
    /// returns the full response body.
    ///
    /// `build` is called once per attempt. A connection slot is held from
    /// sending until the body has been read, and released while backing off.
    ///
    /// # Errors
    ///
    /// - `NetworkError` on transport failures (never retried)
    /// - `RetriesExhausted` when a retryable status persists for every attempt
    /// - `HttpStatus` for any other non-success status
    pub async fn get_body<F>(&self, url: &str, build: F) -> AppResult<Vec<u8>>
    where
        F: Fn(&reqwest::Client) -> reqwest::RequestBuilder,
    {
        let display_url = redact_url(url);
        let mut attempt = 1;

        loop {
            let permit = self.gate.acquire().await?;

            let response = build(&self.client).send().await.map_err(|e| {
                AppError::NetworkError(format!(
                    "Request to {display_url} failed: {}",
                    e.without_url()
                ))
            })?;

            let status = response.status();
            if status.is_success() {
                let body = response.bytes().await.map_err(|e| {
                    AppError::NetworkError(format!(
                        "Failed to read body from {display_url}: {}",
                        e.without_url()
                    ))
                })?;
                drop(permit);
                debug!(url = %display_url, bytes = body.len(), attempt, "Request completed");
                return Ok(body.to_vec());
            }

            drop(response);
            drop(permit);

            let code = status.as_u16();
            if self.policy.should_retry(code, attempt) {
                let delay = self.policy.backoff_delay();
                warn!(
                    url = %display_url,
                    status = code,
                    attempt,
                    max_attempts = self.policy.max_attempts(),
                    delay_ms = delay.as_millis() as u64,
                    "Retrying request after error status"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
                continue;
            }

            if self.policy.is_retryable_status(code) {
                return Err(AppError::RetriesExhausted {
                    url: display_url,
                    attempts: attempt,
                    status: code,
                });
            }
            return Err(AppError::HttpStatus {
                url: display_url,
                status: code,
            });
        }
    }
}

/// Strips the query string and fragment from a URL before it is logged or
/// put in an error. Pre-signed URLs carry their credentials in the query.
pub fn redact_url(url: &str) -> String {
    match Url::parse(url) {
        Ok(mut parsed) => {
            parsed.set_query(None);
            parsed.set_fragment(None);
            parsed.to_string()
        }
        Err(_) => url.split(['?', '#']).next().unwrap_or_default().to_string(),
    }
}
