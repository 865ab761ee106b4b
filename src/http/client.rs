//! HTTP transport with bounded retries
//!
//! The fetcher talks to the network only through the [`Transport`] trait so
//! tests can swap in a scripted fake. [`HttpClient`] is the real
//! implementation:
//! - Statuses below 500 are final: 2xx/3xx succeed, 4xx fail at once
//! - 5xx responses and network failures are retried per [`RetryPolicy`]
//! - An optional token bucket throttles every attempt

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::error::{Error, Result};
use crate::types::{BackoffType, JsonValue, Method, StringMap};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Longest slice of an error response body kept in error messages
const MAX_ERROR_BODY: usize = 512;

// ============================================================================
// Retry Policy
// ============================================================================

/// How failed requests are retried
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay unit; the n-th retry waits `base_delay × n` under linear backoff
    pub base_delay: Duration,
    /// Ceiling for any single delay
    pub max_delay: Duration,
    /// Delay growth
    pub backoff_type: BackoffType,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_type: BackoffType::Linear,
        }
    }
}

impl RetryPolicy {
    /// Linear policy with the given retry count and delay unit
    pub fn linear(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            ..Self::default()
        }
    }

    /// Policy that never retries
    pub fn none() -> Self {
        Self::linear(0, Duration::ZERO)
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let attempt = attempt.max(1);
        let delay = match self.backoff_type {
            BackoffType::Constant => self.base_delay,
            BackoffType::Linear => self.base_delay.saturating_mul(attempt),
            BackoffType::Exponential => self
                .base_delay
                .saturating_mul(2u32.saturating_pow(attempt - 1)),
        };

        std::cmp::min(delay, self.max_delay)
    }
}

// ============================================================================
// Client Config
// ============================================================================

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Retry behaviour for 5xx and network failures
    pub retry: RetryPolicy,
    /// Optional throttle applied before every attempt
    pub rate_limit: Option<RateLimiterConfig>,
    /// Headers sent with every request
    pub default_headers: StringMap,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            rate_limit: None,
            default_headers: StringMap::new(),
            user_agent: format!("api-ingest/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the retry policy
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    /// Set max retries
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.retry.max_retries = retries;
        self
    }

    /// Set backoff configuration
    pub fn backoff(mut self, backoff_type: BackoffType, base: Duration, max: Duration) -> Self {
        self.config.retry.backoff_type = backoff_type;
        self.config.retry.base_delay = base;
        self.config.retry.max_delay = max;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

// ============================================================================
// Transport
// ============================================================================

/// One fully built page request
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    /// HTTP method
    pub method: Method,
    /// Absolute URL including the query string
    pub url: Url,
    /// Request headers
    pub headers: StringMap,
    /// JSON body, only sent for methods that carry one
    pub body: Option<JsonValue>,
}

impl PageRequest {
    /// Create a GET request
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: StringMap::new(),
            body: None,
        }
    }

    /// Look up a query parameter of the built URL
    pub fn query_value(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }
}

/// A successful response with its body parsed as JSON
#[derive(Debug, Clone, PartialEq)]
pub struct TransportResponse {
    /// HTTP status code
    pub status: u16,
    /// Parsed body; `Null` when the body was empty
    pub body: JsonValue,
}

/// Sends page requests
///
/// Implementations own their retry behaviour: an `Err` means the request is
/// not worth retrying any further.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request and return the parsed response
    async fn send(&self, request: &PageRequest) -> Result<TransportResponse>;
}

// ============================================================================
// HTTP Client
// ============================================================================

/// HTTP client with retry and rate limiting
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    /// Client configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Check if rate limiting is enabled
    pub fn has_rate_limiter(&self) -> bool {
        self.rate_limiter.is_some()
    }

    /// Single attempt, no retries
    async fn send_once(&self, request: &PageRequest) -> Result<TransportResponse> {
        if let Some(ref limiter) = self.rate_limiter {
            limiter.wait().await;
        }

        let headers = merge_headers(&self.config.default_headers, &request.headers)?;
        let mut req = self
            .client
            .request(request.method.into(), request.url.clone())
            .timeout(self.config.timeout)
            .headers(headers);

        if request.method.has_body() {
            if let Some(ref body) = request.body {
                req = req.json(body);
            }
        }

        let response = req.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout {
                    timeout_ms: self.config.timeout.as_millis() as u64,
                }
            } else {
                Error::Http(e)
            }
        })?;

        let status = response.status();
        let text = response.text().await?;

        if status.is_client_error() || status.is_server_error() {
            return Err(Error::http_status(status.as_u16(), truncate(&text)));
        }

        let body = if text.trim().is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_str(&text)
                .map_err(|e| Error::decode(format!("Response body is not JSON: {e}")))?
        };

        Ok(TransportResponse {
            status: status.as_u16(),
            body,
        })
    }
}

/// Default headers overlaid with per-request headers.
///
/// Names compare case-insensitively; a request header replaces a default
/// with the same name instead of being sent alongside it.
pub(crate) fn merge_headers(defaults: &StringMap, overrides: &StringMap) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for (key, value) in defaults.iter().chain(overrides) {
        let name = HeaderName::from_bytes(key.as_bytes())
            .map_err(|e| Error::invalid_value("headers", format!("'{key}': {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| Error::invalid_value("headers", format!("'{key}': {e}")))?;
        headers.insert(name, value);
    }
    Ok(headers)
}

#[async_trait]
impl Transport for HttpClient {
    async fn send(&self, request: &PageRequest) -> Result<TransportResponse> {
        let policy = &self.config.retry;
        let mut attempt = 0;

        loop {
            match self.send_once(request).await {
                Ok(response) => {
                    debug!(
                        "Request succeeded: {} {} ({})",
                        request.method, request.url, response.status
                    );
                    return Ok(response);
                }
                Err(e) if e.is_retryable() && attempt < policy.max_retries => {
                    attempt += 1;
                    let delay = policy.delay_for(attempt);
                    warn!(
                        "Request failed ({e}), attempt {}/{}, retrying in {:?}",
                        attempt,
                        policy.max_retries + 1,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    if e.is_retryable() {
                        warn!(
                            "Giving up on {} {} after {} attempts: {e}",
                            request.method,
                            request.url,
                            attempt + 1
                        );
                    }
                    return Err(e);
                }
            }
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

fn truncate(body: &str) -> String {
    match body.char_indices().nth(MAX_ERROR_BODY) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
