//! HTTP transport types for the host-does-IO pattern.
//!
//! # Design
//! Requests and responses are plain data. `ApiClient` builds `HttpRequest`
//! values and classifies `HttpResponse` values; the only code that touches
//! the network is a `Transport` implementation. Tests inject their own
//! transport, production code uses `UreqTransport`.

use std::time::Duration;

use tracing::debug;

use crate::error::TransportError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An HTTP request described as plain data.
///
/// Built by `ApiClient::build_request`. `url` is absolute, including any
/// query string. `timeout` is the deadline for the whole round-trip.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub timeout: Duration,
}

impl HttpRequest {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// True when the declared content type is `application/json`,
    /// with or without parameters such as `charset`.
    pub fn is_json(&self) -> bool {
        self.content_type()
            .map(|ct| ct.trim().to_ascii_lowercase().starts_with("application/json"))
            .unwrap_or(false)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Executes one `HttpRequest` and returns whatever the server answered.
///
/// Non-2xx statuses are data, not errors: implementations return them as
/// `Ok(HttpResponse)`. Only failures that leave no response to inspect
/// (timeout, DNS, refused connection, broken body) are `Err`.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        (**self).execute(request)
    }
}

/// Blocking transport backed by `ureq`.
///
/// A fresh agent is configured per request so each call carries its own
/// deadline; there is no connection reuse or retry.
#[derive(Debug, Clone, Copy, Default)]
pub struct UreqTransport;

impl UreqTransport {
    pub fn new() -> Self {
        Self
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, TransportError> {
        let agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(request.timeout))
            .build()
            .new_agent();

        debug!(method = request.method.as_str(), url = %request.url, "executing request");

        let result = match request.method {
            HttpMethod::Get => {
                let mut builder = agent.get(&request.url);
                for (k, v) in &request.headers {
                    builder = builder.header(k.as_str(), v.as_str());
                }
                builder.call()
            }
            HttpMethod::Delete => {
                let mut builder = agent.delete(&request.url);
                for (k, v) in &request.headers {
                    builder = builder.header(k.as_str(), v.as_str());
                }
                builder.call()
            }
            HttpMethod::Post | HttpMethod::Put => {
                let mut builder = if request.method == HttpMethod::Post {
                    agent.post(&request.url)
                } else {
                    agent.put(&request.url)
                };
                for (k, v) in &request.headers {
                    builder = builder.header(k.as_str(), v.as_str());
                }
                match &request.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };

        let mut response = result.map_err(|e| map_ureq_error(e, request.timeout))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| map_ureq_error(e, request.timeout))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

fn map_ureq_error(err: ureq::Error, timeout: Duration) -> TransportError {
    match err {
        ureq::Error::Timeout(_) => TransportError::Timeout(timeout),
        ureq::Error::Io(ref io) if io.kind() == std::io::ErrorKind::TimedOut => {
            TransportError::Timeout(timeout)
        }
        ureq::Error::HostNotFound | ureq::Error::ConnectionFailed => {
            TransportError::Connect(err.to_string())
        }
        ureq::Error::Io(ref io)
            if matches!(
                io.kind(),
                std::io::ErrorKind::ConnectionRefused
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::AddrNotAvailable
            ) =>
        {
            TransportError::Connect(err.to_string())
        }
        other => TransportError::Io(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(headers: Vec<(&str, &str)>) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: headers
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: String::new(),
        }
    }

    #[test]
    fn content_type_lookup_ignores_case() {
        let r = response(vec![("Content-Type", "application/json; charset=utf-8")]);
        assert_eq!(r.content_type(), Some("application/json; charset=utf-8"));
        assert!(r.is_json());
    }

    #[test]
    fn missing_content_type_is_not_json() {
        assert!(!response(Vec::new()).is_json());
        assert!(!response(vec![("content-type", "text/html")]).is_json());
    }

    #[test]
    fn success_range_is_2xx() {
        let mut r = response(Vec::new());
        assert!(r.is_success());
        r.status = 204;
        assert!(r.is_success());
        r.status = 301;
        assert!(!r.is_success());
        r.status = 401;
        assert!(!r.is_success());
    }

    #[test]
    fn method_names() {
        assert_eq!(HttpMethod::Get.as_str(), "GET");
        assert_eq!(HttpMethod::Delete.as_str(), "DELETE");
    }
}
