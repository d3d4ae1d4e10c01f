//! Request descriptors and the builder that validates call arguments.

use std::fmt;

use bytes::Bytes;
use http::{
    HeaderMap, HeaderName, HeaderValue,
    header::{ACCEPT, CONTENT_TYPE},
};
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Returns the method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }

    /// Returns true if requests with this method may carry a body.
    pub fn allows_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for http::Method {
    fn from(m: Method) -> Self {
        match m {
            Method::Get => http::Method::GET,
            Method::Post => http::Method::POST,
            Method::Put => http::Method::PUT,
            Method::Delete => http::Method::DELETE,
        }
    }
}

/// Ordered query parameters with unique keys.
///
/// Inserting an existing key replaces its value in place, so the original
/// position is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A single multipart form part.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub name: String,
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl Part {
    /// Creates a plain text field.
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filename: None,
            content_type: None,
            data: Bytes::from(value.into()),
        }
    }

    /// Creates a file part.
    pub fn file(
        name: impl Into<String>,
        filename: impl Into<String>,
        content_type: impl Into<String>,
        data: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            filename: Some(filename.into()),
            content_type: Some(content_type.into()),
            data: data.into(),
        }
    }

    /// Returns true if this part carries a file.
    pub fn is_file(&self) -> bool {
        self.filename.is_some()
    }
}

/// Request body.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Structured JSON.
    Json(serde_json::Value),
    /// Opaque bytes with an explicit content type.
    Bytes { content_type: String, data: Bytes },
    /// Multipart form data.
    Multipart(Vec<Part>),
}

/// A fully described HTTP request, built per call and consumed by a
/// [`Transport`](crate::Transport).
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    /// Unencoded path segments relative to the service base URL.
    pub segments: Vec<String>,
    pub query: QueryParams,
    pub headers: HeaderMap,
    /// Present only for methods that accept a body.
    pub body: Option<Body>,
}

impl RequestDescriptor {
    /// Returns the unencoded path, e.g. `/v1/classifiers/abc/classify`.
    pub fn path(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }

    /// Resolves this request against `base_url`, percent-encoding path
    /// segments and query parameters.
    pub fn url(&self, base_url: &str) -> Result<Url> {
        let mut url = Url::parse(base_url)?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| Error::Config(format!("base url cannot be a base: {}", base_url)))?;
            segments.pop_if_empty();
            segments.extend(&self.segments);
        }
        if !self.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in self.query.iter() {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    /// Returns a header value as a string.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the JSON body, if the body is JSON.
    pub fn json_body(&self) -> Option<&serde_json::Value> {
        match &self.body {
            Some(Body::Json(v)) => Some(v),
            _ => None,
        }
    }
}

/// Builds a [`RequestDescriptor`] from typed call arguments.
///
/// Validation failures are recorded rather than raised immediately; the
/// first one is returned by [`RequestBuilder::build`] as
/// [`Error::InvalidArgument`].
///
/// # Example
///
/// ```rust
/// use cogsdk_rest::RequestBuilder;
///
/// let req = RequestBuilder::post("/v1/classifiers/{classifier_id}/classify")
///     .param("classifier_id", "10D41B-nlc-1")
///     .json(&serde_json::json!({ "text": "hello" }))
///     .build()
///     .unwrap();
///
/// assert_eq!(req.path(), "/v1/classifiers/10D41B-nlc-1/classify");
/// ```
#[derive(Debug)]
pub struct RequestBuilder {
    method: Method,
    template: String,
    params: Vec<(String, String)>,
    query: QueryParams,
    headers: HeaderMap,
    body: Option<Body>,
    error: Option<(String, String)>,
}

impl RequestBuilder {
    /// Creates a builder for `method` and a path template such as
    /// `/v1/voices/{voice}`.
    pub fn new(method: Method, template: impl Into<String>) -> Self {
        Self {
            method,
            template: template.into(),
            params: Vec::new(),
            query: QueryParams::new(),
            headers: HeaderMap::new(),
            body: None,
            error: None,
        }
    }

    pub fn get(template: impl Into<String>) -> Self {
        Self::new(Method::Get, template)
    }

    pub fn post(template: impl Into<String>) -> Self {
        Self::new(Method::Post, template)
    }

    pub fn put(template: impl Into<String>) -> Self {
        Self::new(Method::Put, template)
    }

    pub fn delete(template: impl Into<String>) -> Self {
        Self::new(Method::Delete, template)
    }

    /// Fills the `{name}` path segment. Blank values are rejected.
    pub fn param(mut self, name: &str, value: impl AsRef<str>) -> Self {
        let value = value.as_ref();
        if value.trim().is_empty() {
            self.fail(name, "must not be empty");
        } else {
            self.params.push((name.to_string(), value.to_string()));
        }
        self
    }

    /// Requires a non-blank string argument.
    pub fn require(mut self, name: &str, value: impl AsRef<str>) -> Self {
        if value.as_ref().trim().is_empty() {
            self.fail(name, "must not be empty");
        }
        self
    }

    /// Requires a non-empty byte argument.
    pub fn require_bytes(mut self, name: &str, value: &[u8]) -> Self {
        if value.is_empty() {
            self.fail(name, "must not be empty");
        }
        self
    }

    /// Requires an optional argument to be present.
    pub fn require_some<T>(mut self, name: &str, value: Option<&T>) -> Self {
        if value.is_none() {
            self.fail(name, "is required");
        }
        self
    }

    /// Adds a query parameter.
    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.insert(key, value.to_string());
        self
    }

    /// Adds a query parameter when `value` is present.
    pub fn query_opt<V: ToString>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.query(key, v),
            None => self,
        }
    }

    /// Adds a comma-separated list parameter when `values` is non-empty.
    pub fn query_list<S: AsRef<str>>(self, key: &str, values: &[S]) -> Self {
        if values.is_empty() {
            return self;
        }
        let joined = values
            .iter()
            .map(|v| v.as_ref())
            .collect::<Vec<_>>()
            .join(",");
        self.query(key, joined)
    }

    /// Sets a request header.
    pub fn header(mut self, name: &str, value: impl AsRef<str>) -> Self {
        let parsed = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| e.to_string())
            .and_then(|n| {
                HeaderValue::from_str(value.as_ref())
                    .map(|v| (n, v))
                    .map_err(|e| e.to_string())
            });
        match parsed {
            Ok((n, v)) => {
                self.headers.insert(n, v);
            }
            Err(reason) => self.fail(name, &reason),
        }
        self
    }

    /// Sets the `Accept` header.
    pub fn accept(self, value: impl AsRef<str>) -> Self {
        self.header(ACCEPT.as_str(), value)
    }

    /// Sets a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(v) => self.set_body(Body::Json(v)),
            Err(e) => self.fail("body", &e.to_string()),
        }
        self
    }

    /// Sets an opaque body with the given content type.
    pub fn bytes(mut self, content_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let content_type = content_type.into();
        if let Err(reason) = check_content_type(&content_type) {
            self.fail("content_type", &reason);
        }
        self.set_body(Body::Bytes {
            content_type,
            data: data.into(),
        });
        self
    }

    /// Appends a multipart form part.
    pub fn part(mut self, part: Part) -> Self {
        if let Some(content_type) = &part.content_type {
            if let Err(reason) = check_content_type(content_type) {
                self.fail("content_type", &reason);
            }
        }
        if let Some(Body::Multipart(parts)) = &mut self.body {
            parts.push(part);
        } else if self.body.is_none() {
            self.body = Some(Body::Multipart(vec![part]));
        } else {
            self.fail("body", "cannot mix multipart parts with another body");
        }
        self
    }

    /// Validates the arguments and produces the request descriptor.
    pub fn build(self) -> Result<RequestDescriptor> {
        if let Some((name, reason)) = self.error {
            debug!(method = %self.method, path = %self.template, %name, %reason, "rejecting request");
            return Err(Error::InvalidArgument { name, reason });
        }

        if self.body.is_some() && !self.method.allows_body() {
            debug!(method = %self.method, path = %self.template, "rejecting body on bodyless method");
            return Err(Error::invalid_argument(
                "body",
                format!("{} requests cannot carry a body", self.method),
            ));
        }

        let mut segments = Vec::new();
        for seg in self.template.split('/').filter(|s| !s.is_empty()) {
            match seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                Some(name) => {
                    let value = self
                        .params
                        .iter()
                        .find(|(n, _)| n == name)
                        .map(|(_, v)| v.clone())
                        .ok_or_else(|| {
                            debug!(path = %self.template, %name, "missing path parameter");
                            Error::invalid_argument(name, "path parameter not provided")
                        })?;
                    segments.push(value);
                }
                None => segments.push(seg.to_string()),
            }
        }

        let mut headers = self.headers;
        if let Some(Body::Bytes { content_type, .. }) = &self.body {
            if let Ok(v) = HeaderValue::from_str(content_type) {
                headers.insert(CONTENT_TYPE, v);
            }
        }

        Ok(RequestDescriptor {
            method: self.method,
            segments,
            query: self.query,
            headers,
            body: self.body,
        })
    }

    fn set_body(&mut self, body: Body) {
        if self.body.is_some() {
            self.fail("body", "body already set");
        } else {
            self.body = Some(body);
        }
    }

    fn fail(&mut self, name: &str, reason: &str) {
        if self.error.is_none() {
            self.error = Some((name.to_string(), reason.to_string()));
        }
    }
}

/// Checks that `value` is a usable `type/subtype[; params]` header value.
fn check_content_type(value: &str) -> std::result::Result<(), String> {
    if value.trim().is_empty() {
        return Err("must not be empty".to_string());
    }
    HeaderValue::from_str(value).map_err(|_| format!("invalid header value {:?}", value))?;
    let essence = value.split(';').next().unwrap_or_default().trim();
    let is_token = |s: &str| {
        !s.is_empty()
            && s.bytes()
                .all(|b| b.is_ascii_alphanumeric() || b"!#$&-^_.+".contains(&b))
    };
    match essence.split_once('/') {
        Some((ty, sub)) if is_token(ty) && is_token(sub) => Ok(()),
        _ => Err(format!("expected type/subtype, got {:?}", value)),
    }
}
