//! Content-store HTTP client.
//!
//! Executes query-language strings against the store's query endpoint:
//! `GET {base_url}/query/{dataset}?query=...`, which answers with
//! `{"result": <json>}`. The client makes no claim about the result's
//! shape — coercion to a document sequence happens in [`crate::resolve`].
//!
//! # Retry Strategy
//!
//! Transient errors use exponential backoff:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::StoreConfig;
use crate::resolve::QueryExecutor;

/// HTTP client for the content store's query API.
pub struct StoreClient {
    base_url: String,
    dataset: String,
    token: Option<String>,
    timeout_secs: u64,
    max_retries: u32,
}

impl StoreClient {
    /// Create a client from configuration.
    ///
    /// The capability token is read from the env var named by
    /// `store.token_env`; when unset, requests go out unauthenticated
    /// (public datasets).
    pub fn from_config(config: &StoreConfig) -> Self {
        Self {
            base_url: config.base_url.clone(),
            dataset: config.dataset.clone(),
            token: std::env::var(&config.token_env).ok(),
            timeout_secs: config.timeout_secs,
            max_retries: config.max_retries,
        }
    }

    /// Execute a query string and return the store's raw `result` value.
    pub async fn query(&self, query: &str) -> Result<serde_json::Value> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?;

        let url = format!("{}/query/{}", self.base_url, self.dataset);

        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s, 8s, ...
                let delay = Duration::from_secs(1 << (attempt - 1).min(5));
                tokio::time::sleep(delay).await;
            }

            let mut request = client.get(&url).query(&[("query", query)]);
            if let Some(ref token) = self.token {
                request = request.header("Authorization", format!("Bearer {}", token));
            }

            let resp = request.send().await;

            match resp {
                Ok(response) => {
                    let status = response.status();

                    if status.is_success() {
                        let json: serde_json::Value = response.json().await?;
                        // The envelope's `result` field holds the query result;
                        // a missing field counts as a malformed (null) result.
                        return Ok(json.get("result").cloned().unwrap_or(serde_json::Value::Null));
                    }

                    // Rate limited or server error — retry
                    if status.as_u16() == 429 || status.is_server_error() {
                        let body_text = response.text().await.unwrap_or_default();
                        last_err =
                            Some(anyhow::anyhow!("Store error {}: {}", status, body_text));
                        continue;
                    }

                    // Client error (not 429) — don't retry
                    let body_text = response.text().await.unwrap_or_default();
                    bail!("Store error {}: {}", status, body_text);
                }
                Err(e) => {
                    last_err = Some(e.into());
                    continue;
                }
            }
        }

        Err(last_err.unwrap_or_else(|| anyhow::anyhow!("Query failed after retries")))
    }
}

#[async_trait]
impl QueryExecutor for StoreClient {
    async fn execute(&self, query: &str) -> Result<serde_json::Value> {
        self.query(query).await
    }
}
