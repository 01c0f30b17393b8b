//! Request descriptors and raw responses exchanged with an `HttpTransport`.

use std::fmt;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use uuid::Uuid;

use tripmate_types::api::ErrorBody;
use tripmate_types::error::HttpError;

/// Paths that authenticate rather than require authentication. A 401 from
/// any of these never triggers a refresh.
const AUTH_ENDPOINTS: &[&str] = &["/auth/login", "/auth/register", "/auth/refresh"];

pub const REFRESH_PATH: &str = "/auth/refresh";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
            Method::Put => write!(f, "PUT"),
            Method::Delete => write!(f, "DELETE"),
        }
    }
}

/// Immutable description of one logical API call.
///
/// The path is relative to the configured base URL and may carry a query
/// string. Retry bookkeeping lives in [`Attempt`], never on the request.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
    /// Correlation id for logs.
    pub id: Uuid,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            id: Uuid::now_v7(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Attach a JSON body.
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, HttpError> {
        let value = serde_json::to_value(body).map_err(|e| HttpError::Encode(e.to_string()))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn is_auth_endpoint(&self) -> bool {
        let path = self.path.split('?').next().unwrap_or_default();
        AUTH_ENDPOINTS
            .iter()
            .any(|endpoint| path.trim_end_matches('/') == *endpoint)
    }
}

/// Which send of a logical request this is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    Initial,
    Retried,
}

impl Attempt {
    pub fn may_refresh(self) -> bool {
        self == Attempt::Initial
    }
}

/// Status and body of a completed HTTP exchange.
#[derive(Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn from_json(status: u16, value: &Value) -> Self {
        Self::new(status, value.to_string())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_slice(self.body_or_null()).map_err(|e| HttpError::Decode(e.to_string()))
    }

    /// Decode the payload, unwrapping a `{ "data": ... }` envelope when present.
    pub fn data<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        let value: Value = self.json()?;
        let inner = match value {
            Value::Object(mut map) if map.contains_key("data") => {
                map.remove("data").unwrap_or(Value::Null)
            }
            other => other,
        };
        serde_json::from_value(inner).map_err(|e| HttpError::Decode(e.to_string()))
    }

    /// Turn a non-2xx response into the matching `HttpError`.
    pub fn into_error(self) -> HttpError {
        let message = serde_json::from_slice::<ErrorBody>(&self.body)
            .ok()
            .and_then(ErrorBody::into_message);
        match self.status {
            404 => HttpError::NotFound,
            status => HttpError::Status { status, message },
        }
    }

    fn body_or_null(&self) -> &[u8] {
        if self.body.iter().all(u8::is_ascii_whitespace) {
            b"null"
        } else {
            &self.body
        }
    }
}

impl fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawResponse")
            .field("status", &self.status)
            .field("body_len", &self.body.len())
            .finish()
    }
}
