//! Error types for the dashboard API client.
//!
//! # Design
//! These errors stay inside the crate's plumbing. `ApiClient` turns a
//! `TransportError` into `RequestOutcome::TransportError` using its
//! `Display` text, so callers only ever branch on the outcome tag.
//! `ConfigError` is returned by environment loading, which happens before a
//! client exists.

use std::time::Duration;

use thiserror::Error;

/// A request that produced no HTTP response to inspect.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out after {}s", .0.as_secs_f64())]
    Timeout(Duration),

    /// DNS failure, refused or unreachable host.
    #[error("connection failed: {0}")]
    Connect(String),

    /// The request was rejected before it left the client.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("transport error: {0}")]
    Io(String),
}

/// Errors from loading `ClientConfig` out of the environment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("API_TIMEOUT_SECS must be a positive integer, got {value:?}")]
    InvalidTimeout { value: String },

    #[error("API_URL must not be empty")]
    EmptyBaseUrl,
}
