#![allow(dead_code)]

use alumni_agenda::app::ports::{HttpClientPort, HttpGetResult};
use alumni_agenda::error::{Result, ScraperError};
use async_trait::async_trait;
use reqwest::Url;
use serde_json::Value;
use std::sync::Mutex;

type Matcher = Box<dyn Fn(&str) -> bool + Send + Sync>;

struct Route {
    matches: Matcher,
    status: u16,
    body: Vec<u8>,
    content_type: &'static str,
}

/// Recorded request: URL plus the per-request headers
#[derive(Debug, Clone)]
pub struct Request {
    pub url: String,
    pub headers: Vec<(String, String)>,
}

/// In-memory `HttpClientPort`: answers from a list of scripted routes (first
/// match wins; unmatched URLs get a 404) and records every request.
#[derive(Default)]
pub struct ScriptedHttp {
    routes: Vec<Route>,
    requests: Mutex<Vec<Request>>,
    fail_transport: Vec<String>,
}

/// Value of a query parameter in `url`
pub fn query_param(url: &str, key: &str) -> Option<String> {
    Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.into_owned())
}

impl ScriptedHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(
        mut self,
        matches: impl Fn(&str) -> bool + Send + Sync + 'static,
        status: u16,
        body: impl Into<Vec<u8>>,
        content_type: &'static str,
    ) -> Self {
        self.routes.push(Route {
            matches: Box::new(matches),
            status,
            body: body.into(),
            content_type,
        });
        self
    }

    /// Exact-URL JSON route
    pub fn json(self, url: &str, status: u16, body: Value) -> Self {
        let url = url.to_string();
        self.route(move |u| u == url, status, body.to_string(), "application/json")
    }

    /// JSON route for `page=<n>` of a query-paginated listing under `prefix`
    pub fn json_page(self, prefix: &str, page: usize, status: u16, body: Value) -> Self {
        let prefix = prefix.to_string();
        self.route(
            move |u| u.starts_with(&prefix) && query_param(u, "page") == Some(page.to_string()),
            status,
            body.to_string(),
            "application/json",
        )
    }

    pub fn text(self, url: &str, status: u16, body: &str, content_type: &'static str) -> Self {
        let url = url.to_string();
        self.route(move |u| u == url, status, body.to_string(), content_type)
    }

    /// Requests to URLs starting with `prefix` fail before any response
    pub fn transport_error(mut self, prefix: &str) -> Self {
        self.fail_transport.push(prefix.to_string());
        self
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.url).collect()
    }
}

#[async_trait]
impl HttpClientPort for ScriptedHttp {
    async fn get(&self, url: &str, extra_headers: &[(&str, &str)]) -> Result<HttpGetResult> {
        self.requests.lock().unwrap().push(Request {
            url: url.to_string(),
            headers: extra_headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });

        if self.fail_transport.iter().any(|p| url.starts_with(p)) {
            return Err(ScraperError::Api {
                message: format!("connection refused: {}", url),
            });
        }

        let resp = match self.routes.iter().find(|r| (r.matches)(url)) {
            Some(route) => HttpGetResult {
                status: route.status,
                bytes: route.body.clone(),
                content_type: route.content_type.to_string(),
            },
            None => HttpGetResult {
                status: 404,
                bytes: b"not found".to_vec(),
                content_type: "text/plain".to_string(),
            },
        };
        Ok(resp)
    }
}
