//! Blocking API client core for the clinic dashboard backend.
//!
//! # Overview
//! Talks to the backend REST API, normalizes its loosely-shaped JSON into
//! typed display records, and formats numbers and dates the pt-BR way. It
//! draws nothing; the dashboard that embeds it owns presentation.
//!
//! # Design
//! - `ApiClient` builds `HttpRequest` values and classifies `HttpResponse`
//!   values as plain data; the injected `Transport` does the I/O.
//! - Every call yields a `RequestOutcome`: `Success`, `HttpError` or
//!   `TransportError`. Nothing panics or returns `Err` across the request API.
//! - `normalize` and `format` are total: any input produces a populated
//!   value.

pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod http;
pub mod normalize;
pub mod outcome;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::{ConfigError, TransportError};
pub use format::{format_currency, format_date, format_number, format_percent, parse_currency, safe_divide};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
pub use normalize::{CategoryAmount, FinancialSummary, HealthCode, HealthStatus, SeriesPoint};
pub use outcome::{RequestOutcome, ResponseBody};
