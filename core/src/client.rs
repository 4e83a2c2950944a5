//! Blocking client for the clinic backend REST API.
//!
//! # Design
//! `ApiClient` owns a `ClientConfig` and an injected `Transport`. Every call
//! goes through three steps: `build_request` produces an `HttpRequest` as
//! plain data, the transport executes it, and `classify_response` turns the
//! `HttpResponse` into a `RequestOutcome`. Both pure halves are public so
//! they can be exercised without a network.
//!
//! The client holds no cache and never retries. The only mutable state is
//! the bearer token, replaced by `set_token` between calls.

use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::config::{ClientConfig, HEALTH_CHECK_TIMEOUT};
use crate::error::TransportError;
use crate::http::{HttpMethod, HttpRequest, HttpResponse, Transport, UreqTransport};
use crate::normalize::{self, FinancialSummary, HealthStatus};
use crate::outcome::{RequestOutcome, ResponseBody};

const LOGIN_PATH: &str = "auth/login";
const FINANCIAL_STATS_PATH: &str = "financeiro/stats";
const DB_DIAGNOSTIC_PATH: &str = "diagnostic/db-check";
const HEALTH_PATH: &str = "health";

#[derive(Debug, Clone)]
pub struct ApiClient<T = UreqTransport> {
    config: ClientConfig,
    transport: T,
}

impl ApiClient<UreqTransport> {
    /// Client over the default blocking transport.
    pub fn new(base_url: &str) -> Self {
        Self::from_config(ClientConfig::new(base_url))
    }

    pub fn from_config(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }
}

impl<T: Transport> ApiClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self { config, transport }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        self.config.base_url()
    }

    /// The server root: the base URL with one trailing `/api` removed.
    pub fn root_url(&self) -> &str {
        let base = self.config.base_url();
        base.strip_suffix("/api").unwrap_or(base)
    }

    pub fn token(&self) -> Option<&str> {
        self.config.auth_token.as_deref()
    }

    /// Replace the bearer token used by subsequent calls.
    pub fn set_token(&mut self, token: impl Into<String>) {
        self.config.auth_token = Some(token.into());
    }

    pub fn clear_token(&mut self) {
        self.config.auth_token = None;
    }

    pub fn get(&self, path: &str, query: &[(&str, &str)]) -> RequestOutcome<ResponseBody> {
        self.send(HttpMethod::Get, path, query, None)
    }

    pub fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> RequestOutcome<ResponseBody> {
        match serialize_body(body) {
            Ok(body) => self.send(HttpMethod::Post, path, &[], Some(body)),
            Err(e) => transport_failure(&e),
        }
    }

    pub fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> RequestOutcome<ResponseBody> {
        match serialize_body(body) {
            Ok(body) => self.send(HttpMethod::Put, path, &[], Some(body)),
            Err(e) => transport_failure(&e),
        }
    }

    pub fn delete(&self, path: &str) -> RequestOutcome<ResponseBody> {
        self.send(HttpMethod::Delete, path, &[], None)
    }

    /// Build the request for `path` under the base URL, with exactly one
    /// `/` between the two.
    pub fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(&str, &str)],
        body: Option<String>,
    ) -> Result<HttpRequest, TransportError> {
        let url = join_url(self.config.base_url(), path)?;
        Ok(self.request_for(method, with_query(url, query), body))
    }

    /// Classify a response. 2xx is `Success`, anything else `HttpError`.
    pub fn classify_response(&self, response: HttpResponse) -> RequestOutcome<ResponseBody> {
        let body = ResponseBody::from_response(&response);
        if response.is_success() {
            debug!(status = response.status, "request succeeded");
            RequestOutcome::Success {
                status: response.status,
                body,
            }
        } else {
            warn!(status = response.status, "request returned error status");
            RequestOutcome::HttpError {
                status: response.status,
                body,
            }
        }
    }

    /// True iff the root `/health` endpoint answers 200. Never fails.
    pub fn health_check(&self) -> bool {
        self.probe_root_health().is_ok()
    }

    pub fn probe_root_health(&self) -> HealthStatus {
        let url = match join_url(self.root_url(), HEALTH_PATH) {
            Ok(url) => url,
            Err(e) => return normalize::health_failure(&e),
        };
        // The root probe is unauthenticated; the token stays inside the API.
        let mut request = self.bare_request(HttpMethod::Get, url, None);
        request.timeout = request.timeout.min(HEALTH_CHECK_TIMEOUT);
        self.probe(&request)
    }

    pub fn probe_api_health(&self) -> HealthStatus {
        match self.build_request(HttpMethod::Get, HEALTH_PATH, &[], None) {
            Ok(request) => self.probe(&request),
            Err(e) => normalize::health_failure(&e),
        }
    }

    /// Authenticate and store the returned token.
    ///
    /// A 2xx answer without a usable token is reported as `HttpError` and
    /// leaves the current token untouched.
    pub fn login(&mut self, email: &str, senha: &str) -> RequestOutcome<String> {
        let outcome = self.post(LOGIN_PATH, &json!({ "email": email, "senha": senha }));
        let (status, body) = match outcome {
            RequestOutcome::Success { status, body } => (status, body),
            RequestOutcome::HttpError { status, body } => {
                return RequestOutcome::HttpError { status, body }
            }
            RequestOutcome::TransportError { message } => {
                return RequestOutcome::TransportError { message }
            }
        };

        let token = body.as_json().and_then(normalize::extract_token);
        match token {
            Some(token) => {
                self.set_token(token.clone());
                RequestOutcome::Success {
                    status,
                    body: token,
                }
            }
            None => {
                warn!(status, "login response carried no token");
                RequestOutcome::HttpError { status, body }
            }
        }
    }

    /// Fetch and normalize the financial summary. The normalizer only sees
    /// successful responses.
    pub fn financial_stats(&self) -> RequestOutcome<FinancialSummary> {
        self.get(FINANCIAL_STATS_PATH, &[]).map(|body| match body {
            ResponseBody::Json(value) => normalize::financial_summary(&value),
            ResponseBody::Text(_) => FinancialSummary::default(),
        })
    }

    pub fn db_diagnostic(&self) -> RequestOutcome<ResponseBody> {
        self.get(DB_DIAGNOSTIC_PATH, &[])
    }

    fn send(
        &self,
        method: HttpMethod,
        path: &str,
        query: &[(&str, &str)],
        body: Option<String>,
    ) -> RequestOutcome<ResponseBody> {
        let request = match self.build_request(method, path, query, body) {
            Ok(request) => request,
            Err(e) => return transport_failure(&e),
        };
        debug!(
            method = method.as_str(),
            url = %request.url,
            authenticated = self.config.auth_token.is_some(),
            "sending request"
        );
        match self.transport.execute(&request) {
            Ok(response) => self.classify_response(response),
            Err(e) => transport_failure(&e),
        }
    }

    fn probe(&self, request: &HttpRequest) -> HealthStatus {
        match self.transport.execute(request) {
            Ok(response) => normalize::health_status(&response),
            Err(e) => {
                warn!(url = %request.url, error = %e, "health probe failed");
                normalize::health_failure(&e)
            }
        }
    }

    fn request_for(&self, method: HttpMethod, url: String, body: Option<String>) -> HttpRequest {
        let mut request = self.bare_request(method, url, body);
        if let Some(token) = &self.config.auth_token {
            request
                .headers
                .push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        request
    }

    fn bare_request(&self, method: HttpMethod, url: String, body: Option<String>) -> HttpRequest {
        HttpRequest {
            method,
            url,
            headers: vec![("Content-Type".to_string(), "application/json".to_string())],
            body,
            timeout: self.config.timeout,
        }
    }
}

fn transport_failure<U>(error: &TransportError) -> RequestOutcome<U> {
    warn!(error = %error, "request failed without a response");
    RequestOutcome::TransportError {
        message: error.to_string(),
    }
}

fn serialize_body<B: Serialize + ?Sized>(body: &B) -> Result<String, TransportError> {
    serde_json::to_string(body)
        .map_err(|e| TransportError::InvalidRequest(format!("body is not serializable: {e}")))
}

/// Join with exactly one `/`, whatever slashes either side carries.
fn join_url(base: &str, path: &str) -> Result<String, TransportError> {
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        return Err(TransportError::InvalidRequest(
            "path must not be empty".to_string(),
        ));
    }
    Ok(format!("{}/{}", base.trim_end_matches('/'), path))
}

/// Append encoded pairs, continuing any query string already in `url`.
fn with_query(mut url: String, query: &[(&str, &str)]) -> String {
    let mut separator = if url.contains('?') { '&' } else { '?' };
    for (key, value) in query {
        url.push(separator);
        separator = '&';
        url.push_str(&urlencoding::encode(key));
        url.push('=');
        url.push_str(&urlencoding::encode(value));
    }
    url
}
