//! HTTP transport.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, header::CONTENT_TYPE};
use reqwest::{Client as ReqwestClient, multipart};
use url::Url;

use crate::{
    error::{Error, Result},
    request::{Body, Part, RequestDescriptor},
};

/// Raw status, headers and body of an HTTP response.
#[derive(Debug, Clone, Default)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl RawResponse {
    /// Creates a response with no headers.
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Creates a JSON response.
    pub fn json(status: u16, value: &serde_json::Value) -> Self {
        let mut resp = Self::new(status, value.to_string());
        resp.headers.insert(
            CONTENT_TYPE,
            http::HeaderValue::from_static("application/json"),
        );
        resp
    }

    /// Returns true for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends a request descriptor over the network.
///
/// Implementations return non-success statuses as data; only failures that
/// prevent an HTTP response from arriving are errors.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, url: Url, request: RequestDescriptor) -> Result<RawResponse>;
}

/// [`Transport`] backed by reqwest.
pub struct HttpTransport {
    client: ReqwestClient,
}

impl HttpTransport {
    /// Creates a new transport.
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = ReqwestClient::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| Error::Config(format!("failed to build http client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, url: Url, request: RequestDescriptor) -> Result<RawResponse> {
        let mut builder = self
            .client
            .request(request.method.into(), url)
            .headers(request.headers);

        builder = match request.body {
            None => builder,
            Some(Body::Json(value)) => builder.json(&value),
            Some(Body::Bytes { content_type, data }) => {
                builder.header(CONTENT_TYPE, content_type).body(data)
            }
            Some(Body::Multipart(parts)) => builder.multipart(build_form(parts)?),
        };

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response.bytes().await?;

        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

fn build_form(parts: Vec<Part>) -> Result<multipart::Form> {
    let mut form = multipart::Form::new();
    for part in parts {
        let Part {
            name,
            filename,
            content_type,
            data,
        } = part;

        let mut p = multipart::Part::bytes(data.to_vec());
        if let Some(filename) = filename {
            p = p.file_name(filename);
        }
        if let Some(content_type) = content_type {
            p = p
                .mime_str(&content_type)
                .map_err(|e| Error::invalid_argument(name.clone(), e.to_string()))?;
        }
        form = form.part(name, p);
    }
    Ok(form)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_user_agent_is_config_error() {
        let err = HttpTransport::new(Duration::from_secs(5), "agent\r\nX-Extra: 1")
            .err()
            .unwrap();
        assert!(matches!(err, Error::Config(_)), "unexpected error: {err:?}");
        assert!(!err.is_transport());
    }

    #[test]
    fn test_form_rejects_bad_part_type() {
        let part = Part {
            name: "images_file".into(),
            filename: Some("cat.jpg".into()),
            content_type: Some("not a mime".into()),
            data: Bytes::from_static(b"x"),
        };
        assert!(build_form(vec![part]).unwrap_err().is_invalid_argument());
    }
}
