pub mod http_fetcher;
#[cfg(test)]
pub mod testing;

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;

use crate::app::{Result, TributaryError};

/// A single outgoing request. Every request carries its own timeout, the
/// fetcher enforces it and never retries.
#[derive(Debug, Clone)]
pub struct Request {
    pub url: String,
    pub method: Method,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub timeout: Duration,
}

impl Request {
    pub fn get(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            url: url.into(),
            method: Method::GET,
            headers: Vec::new(),
            body: None,
            timeout,
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {token}"))
    }
}

#[derive(Debug, Clone)]
pub struct Response {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Turn a non-2xx response into an error.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(TributaryError::FeedGetAndParse(format!(
                "{} returned HTTP {}",
                self.url, self.status
            )))
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Size of the payload, preferring the announced length.
    pub fn size(&self) -> u64 {
        self.content_length.unwrap_or(self.body.len() as u64)
    }
}

#[async_trait]
pub trait Fetcher {
    async fn fetch(&self, request: &Request) -> Result<Response>;
}

/// Fetch and require a 2xx status.
pub async fn fetch_ok(fetcher: &(dyn Fetcher + Send + Sync), request: Request) -> Result<Response> {
    fetcher.fetch(&request).await?.error_for_status()
}

/// Fetch, require a 2xx status and decode the body as JSON.
pub async fn fetch_json<T: DeserializeOwned>(
    fetcher: &(dyn Fetcher + Send + Sync),
    request: Request,
) -> Result<T> {
    let response = fetch_ok(fetcher, request).await?;
    response.json().map_err(|e| {
        TributaryError::FeedGetAndParse(format!("{} did not return valid JSON: {}", response.url, e))
    })
}
