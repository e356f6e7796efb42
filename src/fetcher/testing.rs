//! In-memory `Fetcher` used by unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::app::{Result, TributaryError};
use crate::fetcher::{Fetcher, Request, Response};

#[derive(Default)]
pub struct StaticFetcher {
    routes: HashMap<String, Response>,
    requests: Mutex<Vec<Request>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(mut self, url: &str, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        self.routes.insert(
            url.to_string(),
            Response {
                url: url.to_string(),
                status: 200,
                content_type: Some(content_type.to_string()),
                content_length: None,
                body: body.into(),
            },
        );
        self
    }

    pub fn status(mut self, url: &str, status: u16) -> Self {
        self.routes.insert(
            url.to_string(),
            Response {
                url: url.to_string(),
                status,
                content_type: None,
                content_length: None,
                body: Vec::new(),
            },
        );
        self
    }

    pub fn requested(&self) -> Vec<String> {
        self.requests
            .lock()
            .map(|r| r.iter().map(|req| req.url.clone()).collect())
            .unwrap_or_default()
    }

    pub fn last_request(&self, url: &str) -> Option<Request> {
        self.requests
            .lock()
            .ok()
            .and_then(|r| r.iter().rev().find(|req| req.url == url).cloned())
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        self.routes
            .get(&request.url)
            .cloned()
            .ok_or_else(|| TributaryError::Other(format!("connection refused: {}", request.url)))
    }
}
