use thiserror::Error;

use crate::chat::RoomId;

/// Errors from REST calls made through the session client.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HttpError {
    /// No response was received at all (connection refused, DNS, timeout).
    #[error("no response from server: {0}")]
    Network(String),

    /// The server answered with a non-success status.
    #[error("server returned {status}: {}", message.as_deref().unwrap_or("no details"))]
    Status { status: u16, message: Option<String> },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("failed to encode request body: {0}")]
    Encode(String),

    #[error("resource not found")]
    NotFound,

    #[error("plan download window has expired")]
    PlanExpired,
}

impl HttpError {
    /// HTTP status code, if the server answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            HttpError::Status { status, .. } => Some(*status),
            HttpError::NotFound => Some(404),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Whether the request never reached the server.
    pub fn is_network(&self) -> bool {
        matches!(self, HttpError::Network(_))
    }

    /// User-facing hint. Infrastructure failures get a clearer pointer at
    /// the backend than server-reported business errors.
    pub fn hint(&self) -> String {
        match self {
            HttpError::Network(_) => {
                "Could not reach the server. Is the backend running?".to_string()
            }
            HttpError::Status { message: Some(msg), .. } => msg.clone(),
            HttpError::Status { status, message: None } => {
                format!("The server rejected the request (HTTP {status}).")
            }
            HttpError::Decode(_) => "The server sent an unexpected response.".to_string(),
            HttpError::Encode(msg) => format!("Could not build the request: {msg}"),
            HttpError::NotFound => "The requested resource does not exist.".to_string(),
            HttpError::PlanExpired => {
                "This plan's download window has expired.".to_string()
            }
        }
    }
}

/// Errors from the realtime channel.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RealtimeError {
    #[error("realtime connection failed: {0}")]
    Connect(String),

    #[error("realtime handshake rejected: {0}")]
    Handshake(String),

    #[error("realtime handshake timed out")]
    HandshakeTimeout,

    #[error("realtime channel is not connected")]
    NotConnected,

    #[error("realtime connection closed")]
    Closed,

    #[error("failed to encode realtime payload: {0}")]
    Encode(String),
}

/// Errors from authentication flows.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("authentication failed: no access token in callback")]
    MissingAccessToken,

    #[error("invalid callback url: {0}")]
    InvalidCallbackUrl(String),

    #[error("server did not return an access token")]
    EmptyToken,

    #[error(transparent)]
    Http(#[from] HttpError),
}

/// Errors from room-level operations.
#[derive(Debug, Error)]
pub enum RoomError {
    #[error("room {0} not found")]
    NotFound(RoomId),

    #[error("only the room owner can rename this room")]
    PermissionDenied,

    #[error(transparent)]
    Http(#[from] HttpError),
}

/// Errors from loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    Read { path: String, message: String },

    #[error("invalid config file {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid url '{0}'")]
    InvalidUrl(String),

    #[error("failed to build http client: {0}")]
    HttpClient(String),
}

/// Errors from persisting the session to disk.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session file error: {0}")]
    Io(String),

    #[error("session file is corrupt: {0}")]
    Corrupt(String),
}
