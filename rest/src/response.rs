//! Response mapping.

use std::borrow::Cow;

use bytes::Bytes;
use http::HeaderMap;
use serde::de::DeserializeOwned;

use crate::{
    error::{Error, Result},
    transport::RawResponse,
};

/// Header carrying the service-side transaction ID.
pub const TRANSACTION_ID_HEADER: &str = "x-global-transaction-id";

const MAX_ERROR_BODY: usize = 1024;

/// A successful response with its typed payload.
///
/// The raw body and headers are kept so callers can log the original JSON
/// or read service headers next to the typed result.
#[derive(Debug, Clone)]
pub struct Response<T> {
    pub status: u16,
    pub headers: HeaderMap,
    pub raw: Bytes,
    pub payload: T,
}

impl<T> Response<T> {
    /// Returns the raw body as text.
    pub fn raw_json(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.raw)
    }

    /// Returns the transaction ID header, if present.
    pub fn transaction_id(&self) -> Option<&str> {
        self.headers
            .get(TRANSACTION_ID_HEADER)
            .and_then(|v| v.to_str().ok())
    }

    pub fn into_payload(self) -> T {
        self.payload
    }

    /// Maps the payload, keeping status, headers and raw body.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Response<U> {
        Response {
            status: self.status,
            headers: self.headers,
            raw: self.raw,
            payload: f(self.payload),
        }
    }
}

/// Maps a raw response to a typed JSON payload.
///
/// Non-success statuses become [`Error::Service`]; a body that does not fit
/// `T` becomes [`Error::Deserialize`]. An empty body is treated as `null`.
pub fn map_json<T: DeserializeOwned>(raw: RawResponse) -> Result<Response<T>> {
    if !raw.is_success() {
        return Err(service_error(&raw));
    }

    let body: &[u8] = if raw.body.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &raw.body
    };

    let payload = serde_json::from_slice(body).map_err(|source| Error::Deserialize {
        status: raw.status,
        body: truncate(&String::from_utf8_lossy(&raw.body), MAX_ERROR_BODY),
        source,
    })?;

    Ok(Response {
        status: raw.status,
        headers: raw.headers,
        raw: raw.body,
        payload,
    })
}

/// Maps a raw response to its binary body.
pub fn map_bytes(raw: RawResponse) -> Result<Response<Bytes>> {
    if !raw.is_success() {
        return Err(service_error(&raw));
    }
    let payload = raw.body.clone();
    Ok(Response {
        status: raw.status,
        headers: raw.headers,
        raw: raw.body,
        payload,
    })
}

/// Maps a raw response whose body is irrelevant.
pub fn map_empty(raw: RawResponse) -> Result<Response<()>> {
    if !raw.is_success() {
        return Err(service_error(&raw));
    }
    Ok(Response {
        status: raw.status,
        headers: raw.headers,
        raw: raw.body,
        payload: (),
    })
}

/// Builds a structured error from a non-success response.
pub fn service_error(raw: &RawResponse) -> Error {
    let transaction_id = raw
        .headers
        .get(TRANSACTION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let parsed = serde_json::from_slice::<serde_json::Value>(&raw.body).ok();
    let message = parsed
        .as_ref()
        .and_then(|v| find_text(v, &["error", "message", "errorMessage", "description"]))
        .unwrap_or_else(|| {
            let text = String::from_utf8_lossy(&raw.body);
            if text.trim().is_empty() {
                format!("http status {}", raw.status)
            } else {
                truncate(text.trim(), MAX_ERROR_BODY)
            }
        });
    let description = parsed
        .as_ref()
        .and_then(|v| find_text(v, &["code_description", "description"]))
        .filter(|d| *d != message)
        .unwrap_or_default();

    Error::Service {
        status: raw.status,
        message,
        description,
        transaction_id,
    }
}

// Services nest their error text differently: `{"error": "..."}`,
// `{"error": {"description": "..."}}` or `{"errors": [{"message": "..."}]}`.
fn find_text(value: &serde_json::Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match value.get(*key) {
            Some(serde_json::Value::String(s)) if !s.is_empty() => return Some(s.clone()),
            Some(nested @ serde_json::Value::Object(_)) => {
                if let Some(s) = find_text(nested, keys) {
                    return Some(s);
                }
            }
            _ => {}
        }
    }
    value
        .get("errors")
        .and_then(|e| e.as_array())
        .and_then(|items| items.iter().find_map(|item| find_text(item, keys)))
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        return s.to_string();
    }
    let mut end = max_len;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
