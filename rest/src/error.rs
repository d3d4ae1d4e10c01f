//! Error types for cogsdk service calls.

use thiserror::Error;

/// Result type alias for cogsdk operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for cogsdk operations.
///
/// Every failure is local to the call that produced it. Argument errors are
/// raised before any network activity; transport, service and
/// deserialization errors are kept apart so callers can tell a dead
/// connection from a payload that did not match the expected shape.
#[derive(Error, Debug)]
pub enum Error {
    /// A required call argument is missing or invalid.
    #[error("invalid argument `{name}`: {reason}")]
    InvalidArgument { name: String, reason: String },

    /// Token credentials have no usable bearer token yet.
    #[error("bearer token is not available or has expired")]
    TokenNotReady,

    /// Connection, timeout or TLS failure reported by the HTTP client.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Transport failure reported without an underlying HTTP client error.
    #[error("transport error: {0}")]
    TransportMessage(String),

    /// The service answered with a non-success status.
    #[error("service error: {message} (status={status}, transaction={transaction_id})")]
    Service {
        status: u16,
        message: String,
        description: String,
        transaction_id: String,
    },

    /// The response payload did not match the expected shape.
    #[error("cannot decode response (status={status}): {source}")]
    Deserialize {
        status: u16,
        body: String,
        source: serde_json::Error,
    },

    /// JSON serialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed URL.
    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    /// Invalid client configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// WebSocket failure on a streaming session.
    #[error("websocket error: {0}")]
    WebSocket(String),

    /// The streaming session is no longer open.
    #[error("session closed")]
    SessionClosed,

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates an argument error.
    pub fn invalid_argument(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::InvalidArgument {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Creates a service error without a transaction ID.
    pub fn service(status: u16, message: impl Into<String>) -> Self {
        Error::Service {
            status,
            message: message.into(),
            description: String::new(),
            transaction_id: String::new(),
        }
    }

    /// Returns the HTTP status attached to this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Service { status, .. } | Error::Deserialize { status, .. } => Some(*status),
            Error::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true if the request never produced an HTTP response.
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport(_) | Error::TransportMessage(_))
    }

    /// Returns true if the payload could not be decoded.
    pub fn is_deserialize(&self) -> bool {
        matches!(self, Error::Deserialize { .. })
    }

    /// Returns true if this is an argument error.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument { .. })
    }

    /// Returns true if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        match self {
            Error::TokenNotReady => true,
            Error::Service { status, .. } => *status == 401 || *status == 403,
            _ => false,
        }
    }

    /// Returns true if the addressed resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Service { status: 404, .. })
    }

    /// Returns true if this is a rate limit error.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Error::Service { status: 429, .. })
    }

    /// Returns true if this is a server-side error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::Service { status, .. } if *status >= 500)
    }

    /// Returns true if the request can be retried.
    pub fn is_retryable(&self) -> bool {
        self.is_rate_limit() || self.is_server_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification() {
        assert!(Error::service(429, "slow down").is_retryable());
        assert!(Error::service(503, "unavailable").is_server_error());
        assert!(Error::service(404, "missing").is_not_found());
        assert!(!Error::service(404, "missing").is_retryable());
        assert!(Error::service(401, "denied").is_auth_error());
        assert!(Error::TokenNotReady.is_auth_error());
        assert!(Error::TransportMessage("refused".into()).is_transport());
        assert!(!Error::TransportMessage("refused".into()).is_deserialize());
    }

    #[test]
    fn test_deserialize_is_distinct_from_transport() {
        let source = serde_json::from_str::<u32>("\"x\"").unwrap_err();
        let err = Error::Deserialize {
            status: 200,
            body: "\"x\"".into(),
            source,
        };
        assert!(err.is_deserialize());
        assert!(!err.is_transport());
        assert_eq!(err.status(), Some(200));
    }
}
