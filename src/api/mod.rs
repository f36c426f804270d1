//! Client for the hospital REST API.
//!
//! [`ApiClient`] is the single entry point the screens use. It attaches the
//! bearer token, logs every call and hands the request to a [`Transport`].
//! The transport owns the base URL and the wire format, which keeps the
//! rest of the application testable without a server.

pub mod http;
#[cfg(test)]
pub mod mock;

use crate::error::ApiError;
use serde_json::Value;
use std::cell::Cell;
use std::fmt;
use std::path::PathBuf;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        })
    }
}

/// A file attached to a multipart body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Empty,
    Json(Value),
    /// Text fields plus an optional file. Used by any form carrying an image.
    Multipart {
        fields: Vec<(String, String)>,
        file: Option<FilePart>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL, e.g. `/users/role/admin`.
    pub path: String,
    pub token: Option<String>,
    pub body: Body,
}

/// Sends one request and returns the decoded JSON body.
///
/// Implementations must map every non-2xx response to [`ApiError::Status`]
/// using [`error_message`], and an empty success body to `Value::Null`.
pub trait Transport {
    fn send(&self, request: &ApiRequest) -> Result<Value, ApiError>;
}

pub struct ApiClient {
    transport: Box<dyn Transport>,
    token: Option<String>,
    /// Set when the server answers 401 to a request that carried a token.
    session_rejected: Cell<bool>,
}

impl ApiClient {
    pub fn new(transport: Box<dyn Transport>) -> Self {
        Self {
            transport,
            token: None,
            session_rejected: Cell::new(false),
        }
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Whether a request was refused because the token is no longer valid.
    /// Reading the flag clears it.
    pub fn take_session_rejected(&self) -> bool {
        self.session_rejected.replace(false)
    }

    pub fn request(&self, method: Method, path: &str, body: Body) -> Result<Value, ApiError> {
        let request = ApiRequest {
            method,
            path: path.to_string(),
            token: self.token.clone(),
            body,
        };
        debug!(%method, path, "api request");
        match self.transport.send(&request) {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!(%method, path, status = ?e.status(), error = %e, "api request failed");
                if e.is_unauthorized() && self.token().is_some() {
                    self.session_rejected.set(true);
                }
                Err(e)
            }
        }
    }

    pub fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::Get, path, Body::Empty)
    }

    pub fn post(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.request(Method::Post, path, Body::Json(body))
    }

    pub fn post_body(&self, path: &str, body: Body) -> Result<Value, ApiError> {
        self.request(Method::Post, path, body)
    }

    pub fn put_body(&self, path: &str, body: Body) -> Result<Value, ApiError> {
        self.request(Method::Put, path, body)
    }

    pub fn patch(&self, path: &str, body: Value) -> Result<Value, ApiError> {
        self.request(Method::Patch, path, Body::Json(body))
    }

    pub fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::Delete, path, Body::Empty)
    }
}

/// Message shown for a failed response: the body's `message` (or `error`)
/// field when present, a generic line otherwise.
pub fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|value| {
            ["message", "error"].iter().find_map(|key| {
                value
                    .get(*key)
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
        })
        .unwrap_or_else(|| format!("Request failed with status {status}"))
}

/// Finds the list inside a collection response.
///
/// Accepts a bare array, `{"data": [...]}`, or an object whose first
/// array-valued field holds the items.
pub fn unwrap_list(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => {
            if let Some(Value::Array(items)) = map.remove("data") {
                return Some(items);
            }
            map.into_iter().find_map(|(_, v)| match v {
                Value::Array(items) => Some(items),
                _ => None,
            })
        }
        _ => None,
    }
}

/// Candidate objects that may hold the record in a mutation response, most
/// specific first: the `data` field, any other object-valued field, then the
/// response itself.
pub fn record_candidates(value: &Value) -> Vec<&Value> {
    let mut candidates = Vec::new();
    if let Value::Object(map) = value {
        if let Some(data) = map.get("data").filter(|v| v.is_object()) {
            candidates.push(data);
        }
        candidates.extend(
            map.iter()
                .filter(|(k, v)| k.as_str() != "data" && v.is_object())
                .map(|(_, v)| v),
        );
        candidates.push(value);
    }
    candidates
}

/// Percent-encodes a value for use in a path segment or query string.
pub fn encode_component(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for b in value.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(char::from(b))
            }
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::mock::MockTransport;
    use super::*;
    use serde_json::json;

    #[test]
    fn error_message_prefers_server_field() {
        assert_eq!(
            error_message(400, r#"{"message":"Phone already used"}"#),
            "Phone already used"
        );
        assert_eq!(error_message(500, r#"{"error":"boom"}"#), "boom");
        assert_eq!(
            error_message(502, "<html>bad gateway</html>"),
            "Request failed with status 502"
        );
        assert_eq!(
            error_message(404, r#"{"message":""}"#),
            "Request failed with status 404"
        );
    }

    #[test]
    fn unwrap_list_accepts_common_envelopes() {
        assert_eq!(unwrap_list(json!([1, 2])).unwrap().len(), 2);
        assert_eq!(unwrap_list(json!({"data": [1]})).unwrap().len(), 1);
        assert_eq!(
            unwrap_list(json!({"count": 3, "doctors": [1, 2, 3]}))
                .unwrap()
                .len(),
            3
        );
        assert!(unwrap_list(json!({"message": "none"})).is_none());
    }

    #[test]
    fn client_attaches_token_to_every_request() {
        let mock = MockTransport::new();
        mock.respond(json!([]));
        mock.respond(Value::Null);
        let mut client = mock.client();
        client.set_token(Some("secret".into()));

        client.get("/doctors").unwrap();
        client.delete("/doctors/7").unwrap();

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, Method::Get);
        assert_eq!(requests[1].path, "/doctors/7");
        assert!(requests
            .iter()
            .all(|r| r.token.as_deref() == Some("secret")));
    }

    #[test]
    fn rejected_token_is_flagged_once() {
        let mock = MockTransport::new();
        mock.fail(401, "Invalid credentials");
        mock.fail(401, "jwt expired");
        let mut client = mock.client();

        // A failed sign-in carries no token, so there is no session to drop.
        assert!(client.post("/auth/login", json!({})).is_err());
        assert!(!client.take_session_rejected());

        client.set_token(Some("old".into()));
        assert!(client.get("/doctors").is_err());
        assert!(client.take_session_rejected());
        assert!(!client.take_session_rejected());
    }

    #[test]
    fn encode_component_escapes_reserved_characters() {
        assert_eq!(encode_component("a b@c.et"), "a%20b%40c.et");
        assert_eq!(encode_component("ET-2024-000001"), "ET-2024-000001");
    }
}
