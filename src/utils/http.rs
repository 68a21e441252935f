// src/utils/http.rs

//! Rate-limited, retrying HTTP client.
//!
//! Every attempt waits `delay + jitter` first so request cadence stays
//! uniform whether or not the previous attempt failed. Blocking responses
//! (403/429) are retried like any other failure, with exponential backoff,
//! and are never treated as content.

use async_trait::async_trait;
use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue};
use tokio::time::sleep;

use crate::error::{AppError, Result};
use crate::models::FetchConfig;

/// Anything that can turn a URL into page text.
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch a page and return its body as text.
    async fn get_text(&self, url: &str) -> Result<String>;
}

/// HTTP fetcher with rate limiting and retry.
///
/// Holds one connection pool and the default headers for the whole run.
/// Calls are meant to be awaited one at a time.
pub struct Fetcher {
    config: FetchConfig,
    client: reqwest::Client,
}

impl Fetcher {
    /// Create a fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let language = HeaderValue::from_str(config.accept_language())
            .map_err(|e| AppError::config(format!("invalid Accept-Language header: {e}")))?;
        headers.insert(ACCEPT_LANGUAGE, language);

        let client = reqwest::Client::builder()
            .user_agent(config.user_agent())
            .default_headers(headers)
            .timeout(config.timeout())
            .build()
            .map_err(|e| AppError::config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// GET with `max_retries + 1` attempts; the last error is returned as-is.
    pub async fn get(&self, url: &str) -> Result<String> {
        let max_retries = self.config.max_retries();
        let mut attempt = 0u32;

        loop {
            let delay = self.config.rate_limit_delay(&mut rand::rng());
            sleep(delay).await;

            match self.attempt(url).await {
                Ok(text) => return Ok(text),
                Err(error) if attempt < max_retries => {
                    let backoff = self.config.backoff_delay(attempt, &mut rand::rng());
                    log::warn!(
                        "HTTP GET failed (retrying): attempt={} url={} sleep={:.2}s blocked={} err={}",
                        attempt + 1,
                        url,
                        backoff.as_secs_f64(),
                        error.is_blocking(),
                        error
                    );
                    sleep(backoff).await;
                    attempt += 1;
                }
                Err(error) => {
                    log::error!("HTTP GET failed after retries: url={} err={}", url, error);
                    return Err(error);
                }
            }
        }
    }

    /// One request, no retry.
    async fn attempt(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::network(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::http_status(url, status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::network(url, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[async_trait]
impl PageSource for Fetcher {
    async fn get_text(&self, url: &str) -> Result<String> {
        self.get(url).await
    }
}
