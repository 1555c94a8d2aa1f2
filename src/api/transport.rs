//! HTTP transport for the catalog
//!
//! Thin layer over `reqwest` with two call patterns: decoded text (`get_text`,
//! `post_json`) for pages and JSON envelopes, and raw responses (`get_raw`) for
//! binary downloads. Each transport owns its own cookie jar, so a fresh
//! transport is a fresh login session.

use std::time::Duration;

use reqwest::StatusCode;
use serde::Serialize;
use tracing::{debug, warn};

use super::error::{KtuvitError, Result};

/// Catalog root
pub const DEFAULT_BASE_URL: &str = "https://www.ktuvit.me";

/// Applied when no request timeout is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Decoded response: status plus UTF-8 body
#[derive(Debug, Clone)]
pub struct TextResponse {
    pub status: StatusCode,
    pub body: String,
}

impl TextResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Body of a 2xx response, `Status` error otherwise
    pub fn into_success_body(self) -> Result<String> {
        if self.status.is_success() {
            Ok(self.body)
        } else {
            Err(KtuvitError::Status(self.status.as_u16()))
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpTransport {
    base_url: String,
    timeout: Duration,
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            client: build_client(timeout),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Same endpoint and timeout, empty cookie jar
    pub fn fresh_session(&self) -> Self {
        Self::new(self.base_url.clone(), self.timeout)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET a page and decode it as text. `timeout` overrides the transport default.
    pub async fn get_text(&self, path: &str, timeout: Option<Duration>) -> Result<TextResponse> {
        let url = self.url(path);
        debug!(%url, "GET");

        let mut request = self.client.get(&url);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok(TextResponse { status, body })
    }

    /// POST a JSON body and decode the reply as text
    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<TextResponse> {
        let url = self.url(path);
        debug!(%url, "POST");

        let response = self
            .client
            .post(&url)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        Ok(TextResponse { status, body })
    }

    /// GET without decoding; the caller consumes the body
    pub async fn get_raw(&self, path: &str) -> Result<reqwest::Response> {
        let url = self.url(path);
        debug!(%url, "GET (raw)");

        let response = self.client.get(&url).send().await?;
        Ok(response)
    }
}

fn build_client(timeout: Duration) -> reqwest::Client {
    let built = reqwest::Client::builder()
        .cookie_store(true)
        .timeout(timeout)
        .user_agent(concat!("ktuvit-subs/", env!("CARGO_PKG_VERSION")))
        .build();
    client_or_fallback(built)
}

/// The fallback client keeps no cookies and has no timeout
fn client_or_fallback(built: reqwest::Result<reqwest::Client>) -> reqwest::Client {
    built.unwrap_or_else(|e| {
        warn!(
            error = %e,
            "HTTP client setup failed; continuing without cookie store or request timeout"
        );
        reqwest::Client::default()
    })
}
