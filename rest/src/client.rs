//! Service client core.

use std::{sync::Arc, time::Duration};

use bytes::Bytes;
use http::{HeaderMap, HeaderName, HeaderValue, header::AUTHORIZATION};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::{
    credentials::Credentials,
    error::{Error, Result},
    request::RequestDescriptor,
    response::{Response, map_bytes, map_empty, map_json},
    transport::{HttpTransport, RawResponse, Transport},
};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Default maximum number of retries. Calls are not retried unless asked.
pub const DEFAULT_MAX_RETRIES: u32 = 0;

/// Default user agent.
pub const DEFAULT_USER_AGENT: &str = concat!("cogsdk-rust/", env!("CARGO_PKG_VERSION"));

/// Header asking the service not to use request data for training.
pub const LEARNING_OPT_OUT_HEADER: &str = "x-watson-learning-opt-out";

/// Sends authorized requests for one service instance.
///
/// # Example
///
/// ```rust,ignore
/// use cogsdk_rest::{Credentials, RestClient};
///
/// let creds = Credentials::api_key("https://api.example.com/text-to-speech/api", "your-api-key")?;
/// let client = RestClient::builder(creds).max_retries(2).build()?;
/// ```
pub struct RestClient {
    credentials: Arc<Credentials>,
    transport: Arc<dyn Transport>,
    default_headers: HeaderMap,
    max_retries: u32,
}

impl RestClient {
    /// Creates a client with default settings.
    pub fn new(credentials: Credentials) -> Result<Self> {
        ClientBuilder::new(credentials).build()
    }

    /// Creates a new client builder.
    pub fn builder(credentials: Credentials) -> ClientBuilder {
        ClientBuilder::new(credentials)
    }

    /// Returns the shared credentials.
    pub fn credentials(&self) -> &Arc<Credentials> {
        &self.credentials
    }

    /// Returns the service base URL.
    pub fn base_url(&self) -> &str {
        self.credentials.base_url()
    }

    /// Returns the headers sent with every request.
    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    /// Adds default headers and the `Authorization` header to `request`.
    ///
    /// Headers already set on the request win over defaults.
    pub fn authorize(&self, mut request: RequestDescriptor) -> Result<RequestDescriptor> {
        for (name, value) in &self.default_headers {
            if !request.headers.contains_key(name) {
                request.headers.insert(name.clone(), value.clone());
            }
        }
        request
            .headers
            .insert(AUTHORIZATION, self.credentials.authorization()?);
        Ok(request)
    }

    /// Sends `request` and decodes a JSON payload.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestDescriptor,
    ) -> Result<Response<T>> {
        map_json(self.execute(request).await?)
    }

    /// Sends `request` and returns the binary payload.
    pub async fn send_bytes(&self, request: RequestDescriptor) -> Result<Response<Bytes>> {
        map_bytes(self.execute(request).await?)
    }

    /// Sends `request` and ignores the payload.
    pub async fn send_empty(&self, request: RequestDescriptor) -> Result<Response<()>> {
        map_empty(self.execute(request).await?)
    }

    /// Sends `request` and returns the raw response, retrying rate-limit and
    /// server errors up to `max_retries` times.
    pub async fn execute(&self, request: RequestDescriptor) -> Result<RawResponse> {
        if !self.credentials.is_ready() {
            return Err(Error::TokenNotReady);
        }

        let request = self.authorize(request)?;
        let url = request.url(self.credentials.base_url())?;

        let mut attempt = 0;
        loop {
            debug!(method = %request.method, %url, attempt, "sending request");
            let raw = self.transport.execute(url.clone(), request.clone()).await?;
            debug!(method = %request.method, %url, status = raw.status, "received response");

            let retryable = raw.status == 429 || raw.status >= 500;
            if !retryable || attempt >= self.max_retries {
                return Ok(raw);
            }

            // Exponential backoff: 1s, 2s, 4s, ...
            let backoff = Duration::from_secs(1 << attempt.min(6));
            warn!(status = raw.status, attempt, ?backoff, "retrying request");
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }
}

/// Builder for creating a [`RestClient`].
pub struct ClientBuilder {
    credentials: Credentials,
    transport: Option<Arc<dyn Transport>>,
    timeout: Duration,
    user_agent: String,
    max_retries: u32,
    default_headers: Vec<(String, String)>,
}

impl ClientBuilder {
    /// Creates a new client builder.
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials,
            transport: None,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            max_retries: DEFAULT_MAX_RETRIES,
            default_headers: Vec::new(),
        }
    }

    /// Uses a custom transport instead of the reqwest-backed one.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Sets the maximum number of retries for rate-limit and server errors.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Adds a header sent with every request.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Asks the service not to log request data for service improvement.
    pub fn learning_opt_out(self, opt_out: bool) -> Self {
        if opt_out {
            self.default_header(LEARNING_OPT_OUT_HEADER, "true")
        } else {
            self
        }
    }

    /// Builds the client.
    pub fn build(self) -> Result<RestClient> {
        let mut default_headers = HeaderMap::new();
        for (name, value) in &self.default_headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::Config(format!("invalid header name {:?}: {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::Config(format!("invalid header value for {}: {}", name, e)))?;
            default_headers.insert(name, value);
        }

        let transport = match self.transport {
            Some(t) => t,
            None => Arc::new(HttpTransport::new(self.timeout, &self.user_agent)?),
        };

        Ok(RestClient {
            credentials: Arc::new(self.credentials),
            transport,
            default_headers,
            max_retries: self.max_retries,
        })
    }
}
