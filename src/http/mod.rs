//! HTTP module
//!
//! Provides the transport the fetcher sends page requests through.
//!
//! # Features
//!
//! - **Transport Trait**: Injected seam so tests can script responses
//! - **Bounded Retries**: 5xx and network failures retried with linear backoff
//! - **Status Validation**: Anything below 500 is final, 4xx fails immediately
//! - **Rate Limiting**: Optional token bucket limiter using governor
//! - **Request Targets**: Endpoint URLs keep their embedded query strings

mod client;
mod rate_limit;
mod target;

pub use client::{
    HttpClient, HttpClientConfig, HttpClientConfigBuilder, PageRequest, RetryPolicy, Transport,
    TransportResponse,
};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use target::RequestTarget;

#[cfg(test)]
mod tests;
