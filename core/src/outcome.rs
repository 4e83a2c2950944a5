//! The tagged result of every `ApiClient` call.

use serde_json::Value;

use crate::http::HttpResponse;

/// A response body: parsed JSON when the server declared a JSON content
/// type and the text parsed, raw text otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    Text(String),
}

impl ResponseBody {
    /// Parse `response.body` according to its declared content type.
    /// A JSON-declared body that does not parse is kept as text.
    pub fn from_response(response: &HttpResponse) -> Self {
        if response.is_json() {
            if let Ok(value) = serde_json::from_str(&response.body) {
                return ResponseBody::Json(value);
            }
        }
        ResponseBody::Text(response.body.clone())
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(v) => Some(v),
            ResponseBody::Text(_) => None,
        }
    }

    pub fn is_json(&self) -> bool {
        matches!(self, ResponseBody::Json(_))
    }

    /// The parsed JSON, or `null` for text bodies.
    pub fn json_or_null(&self) -> Value {
        self.as_json().cloned().unwrap_or(Value::Null)
    }

    /// The body as display text. JSON is re-serialized compactly.
    pub fn to_text(&self) -> String {
        match self {
            ResponseBody::Json(v) => v.to_string(),
            ResponseBody::Text(t) => t.clone(),
        }
    }
}

/// Closed set of results for one request. Callers branch on the tag.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestOutcome<T> {
    /// 2xx status.
    Success { status: u16, body: T },
    /// Any other status. The body is kept verbatim for inspection.
    HttpError { status: u16, body: ResponseBody },
    /// No response: timeout, DNS, refused connection, or a request that
    /// never left the client.
    TransportError { message: String },
}

impl<T> RequestOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, RequestOutcome::Success { .. })
    }

    /// HTTP status, if a response arrived.
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestOutcome::Success { status, .. } | RequestOutcome::HttpError { status, .. } => {
                Some(*status)
            }
            RequestOutcome::TransportError { .. } => None,
        }
    }

    /// Transform the success body. Error variants pass through untouched,
    /// so `f` never sees an error payload.
    pub fn map<U, F>(self, f: F) -> RequestOutcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            RequestOutcome::Success { status, body } => RequestOutcome::Success {
                status,
                body: f(body),
            },
            RequestOutcome::HttpError { status, body } => RequestOutcome::HttpError { status, body },
            RequestOutcome::TransportError { message } => {
                RequestOutcome::TransportError { message }
            }
        }
    }

    pub fn success(self) -> Option<T> {
        match self {
            RequestOutcome::Success { body, .. } => Some(body),
            _ => None,
        }
    }

    pub fn as_success(&self) -> Option<&T> {
        match self {
            RequestOutcome::Success { body, .. } => Some(body),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn response(content_type: &str, body: &str) -> HttpResponse {
        HttpResponse {
            status: 200,
            headers: vec![("content-type".to_string(), content_type.to_string())],
            body: body.to_string(),
        }
    }

    #[test]
    fn json_content_type_is_parsed() {
        let body = ResponseBody::from_response(&response("application/json", r#"{"ok":true}"#));
        assert_eq!(body, ResponseBody::Json(json!({"ok": true})));
    }

    #[test]
    fn other_content_type_stays_text() {
        let body = ResponseBody::from_response(&response("text/plain", r#"{"ok":true}"#));
        assert_eq!(body, ResponseBody::Text(r#"{"ok":true}"#.to_string()));
    }

    #[test]
    fn malformed_json_falls_back_to_text() {
        let body = ResponseBody::from_response(&response("application/json", "<html>"));
        assert_eq!(body, ResponseBody::Text("<html>".to_string()));
    }

    #[test]
    fn map_skips_error_variants() {
        let outcome: RequestOutcome<i32> = RequestOutcome::HttpError {
            status: 401,
            body: ResponseBody::Text("unauthorized".to_string()),
        };
        let mapped = outcome.map(|_| -> i32 { panic!("must not run on errors") });
        assert_eq!(mapped.status(), Some(401));
        assert!(!mapped.is_success());
    }

    #[test]
    fn map_transforms_success() {
        let outcome = RequestOutcome::Success { status: 200, body: 2 };
        assert_eq!(outcome.map(|n| n * 10).success(), Some(20));
    }

    #[test]
    fn transport_error_has_no_status() {
        let outcome: RequestOutcome<()> = RequestOutcome::TransportError {
            message: "refused".to_string(),
        };
        assert_eq!(outcome.status(), None);
    }
}
