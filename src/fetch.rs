//! HTTP fetch gateway, the single seam between the core and the network
//!
//! Source adapters and the AI layer depend on the [`FetchGateway`] trait.
//! [`HttpGateway`] is the real implementation on reqwest; [`FakeGateway`]
//! serves scripted responses for tests and offline development.
//!
//! No retries live at this layer. Callers own their recovery policy
//! (adapters substitute fallback data, the AI layer surfaces an inline
//! error message).

use crate::error::{FetchError, FetchResult};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;

/// One JSON HTTP exchange
///
/// Implementations perform exactly one request per call: no retries,
/// no caching. A non-2xx status, a transport failure, and an
/// undecodable body each map to a distinct [`FetchError`] variant.
#[async_trait]
pub trait FetchGateway: Send + Sync {
    /// GET a URL, expecting a JSON response body
    async fn get_json(&self, url: &str) -> FetchResult<Value>;

    /// POST a JSON body, expecting a JSON response body
    async fn post_json(&self, url: &str, body: &Value) -> FetchResult<Value>;

    /// Gateway name (e.g., "http", "fake")
    fn name(&self) -> &str;
}

/// Real gateway backed by a shared `reqwest::Client`
pub struct HttpGateway {
    client: reqwest::Client,
}

impl HttpGateway {
    /// Build a gateway with the given per-request timeout
    pub fn new(timeout: Duration) -> FetchResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| FetchError::Transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    /// Wrap an existing client (shared connection pool)
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn decode(response: reqwest::Response) -> FetchResult<Value> {
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }
        response
            .json::<Value>()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))
    }
}

#[async_trait]
impl FetchGateway for HttpGateway {
    async fn get_json(&self, url: &str) -> FetchResult<Value> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Self::decode(response).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> FetchResult<Value> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;
        Self::decode(response).await
    }

    fn name(&self) -> &str {
        "http"
    }
}

/// Scripted in-memory gateway for tests and offline development
///
/// Responses are routed by URL substring, first match wins; a URL that
/// matches no route gets a transport error. Every requested URL is
/// recorded so tests can assert how often an endpoint was hit.
#[derive(Default)]
pub struct FakeGateway {
    routes: Mutex<Vec<(String, FetchResult<Value>)>>,
    calls: Mutex<Vec<String>>,
    posts: Mutex<Vec<(String, Value)>>,
}

impl FakeGateway {
    /// Create a gateway with no routes (every request fails)
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a route, builder style
    pub fn route(self, url_part: impl Into<String>, result: FetchResult<Value>) -> Self {
        self.set_route(url_part, result);
        self
    }

    /// Add a route to an existing gateway
    ///
    /// New routes are matched before older ones, so re-scripting an
    /// endpoint mid-test overrides its previous behavior.
    pub fn set_route(&self, url_part: impl Into<String>, result: FetchResult<Value>) {
        if let Ok(mut routes) = self.routes.lock() {
            routes.insert(0, (url_part.into(), result));
        }
    }

    /// Every URL requested so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// How many requested URLs contain the given fragment
    pub fn calls_matching(&self, url_part: &str) -> usize {
        self.calls()
            .iter()
            .filter(|url| url.contains(url_part))
            .count()
    }

    /// Every POSTed body so far, paired with its URL, in order
    pub fn posts(&self) -> Vec<(String, Value)> {
        self.posts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    /// Most recent body POSTed to a URL containing the given fragment
    pub fn last_post(&self, url_part: &str) -> Option<Value> {
        self.posts()
            .into_iter()
            .rev()
            .find(|(url, _)| url.contains(url_part))
            .map(|(_, body)| body)
    }

    fn dispatch(&self, url: &str) -> FetchResult<Value> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(url.to_string());
        }
        let routes = self
            .routes
            .lock()
            .map_err(|e| FetchError::Transport(format!("Route table lock poisoned: {}", e)))?;
        for (part, result) in routes.iter() {
            if url.contains(part.as_str()) {
                return result.clone();
            }
        }
        Err(FetchError::Transport(format!(
            "No scripted response for {}",
            url
        )))
    }
}

#[async_trait]
impl FetchGateway for FakeGateway {
    async fn get_json(&self, url: &str) -> FetchResult<Value> {
        self.dispatch(url)
    }

    async fn post_json(&self, url: &str, body: &Value) -> FetchResult<Value> {
        if let Ok(mut posts) = self.posts.lock() {
            posts.push((url.to_string(), body.clone()));
        }
        self.dispatch(url)
    }

    fn name(&self) -> &str {
        "fake"
    }
}
