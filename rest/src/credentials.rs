//! Service credentials.

use std::{fmt, time::Duration};

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use chrono::{DateTime, Utc};
use http::HeaderValue;
use tokio::sync::watch;
use url::Url;

use crate::error::{Error, Result};

/// Username used when an API key is sent through basic authentication.
pub const API_KEY_USERNAME: &str = "apikey";

/// Which authentication mode a [`Credentials`] value uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Basic,
    ApiKey,
    Token,
}

/// A bearer token with an optional expiry.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct BearerToken {
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

impl BearerToken {
    /// Creates a new bearer token.
    pub fn new(token: impl Into<String>, expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            token: token.into(),
            expires_at,
        }
    }

    /// Returns true if the token is non-empty and not expired at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        !self.token.is_empty() && self.expires_at.is_none_or(|exp| exp > now)
    }
}

impl fmt::Debug for BearerToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerToken")
            .field("token", &mask_secret(&self.token))
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

enum Auth {
    Basic { username: String, password: String },
    ApiKey(String),
    Token(watch::Sender<BearerToken>),
}

/// Base URL plus exactly one authentication mode.
///
/// Credentials are owned by the client that uses them and are read-only
/// during calls. The only mutation is [`Credentials::refresh_token`], which
/// replaces the bearer token of token credentials.
pub struct Credentials {
    base_url: String,
    auth: Auth,
}

impl Credentials {
    /// Creates credentials that use HTTP basic authentication.
    pub fn basic(
        base_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self> {
        let username = username.into();
        let password = password.into();
        if username.is_empty() || password.is_empty() {
            return Err(Error::Config(
                "username and password must be non-empty".to_string(),
            ));
        }
        Self::with_auth(base_url, Auth::Basic { username, password })
    }

    /// Creates credentials that authenticate with an API key.
    pub fn api_key(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(Error::Config("api_key must be non-empty".to_string()));
        }
        Self::with_auth(base_url, Auth::ApiKey(api_key))
    }

    /// Creates credentials from a pre-obtained bearer token.
    pub fn token(
        base_url: impl Into<String>,
        token: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Self> {
        let token = BearerToken::new(token, expires_at);
        if token.token.is_empty() {
            return Err(Error::Config("token must be non-empty".to_string()));
        }
        let (tx, _) = watch::channel(token);
        Self::with_auth(base_url, Auth::Token(tx))
    }

    /// Creates token credentials whose token will be supplied later through
    /// [`Credentials::refresh_token`]. Calls fail with
    /// [`Error::TokenNotReady`] until then.
    pub fn pending_token(base_url: impl Into<String>) -> Result<Self> {
        let (tx, _) = watch::channel(BearerToken::default());
        Self::with_auth(base_url, Auth::Token(tx))
    }

    fn with_auth(base_url: impl Into<String>, auth: Auth) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let parsed = Url::parse(&base_url)?;
        if parsed.cannot_be_a_base() {
            return Err(Error::Config(format!("base url cannot be a base: {}", base_url)));
        }
        Ok(Self { base_url, auth })
    }

    /// Returns the service base URL (without a trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the active authentication mode.
    pub fn mode(&self) -> AuthMode {
        match self.auth {
            Auth::Basic { .. } => AuthMode::Basic,
            Auth::ApiKey(_) => AuthMode::ApiKey,
            Auth::Token(_) => AuthMode::Token,
        }
    }

    /// Returns true if calls can be authorized right now.
    ///
    /// Basic and API key credentials are always ready. Token credentials are
    /// ready while they hold a non-empty, unexpired token.
    pub fn is_ready(&self) -> bool {
        match &self.auth {
            Auth::Token(tx) => tx.borrow().is_valid_at(Utc::now()),
            _ => true,
        }
    }

    /// Waits until the credentials are ready, or fails with
    /// [`Error::TokenNotReady`] after `timeout`.
    pub async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let Auth::Token(tx) = &self.auth else {
            return Ok(());
        };

        let mut rx = tx.subscribe();
        let wait = rx.wait_for(|token| token.is_valid_at(Utc::now()));
        match tokio::time::timeout(timeout, wait).await {
            Ok(Ok(_)) => Ok(()),
            _ => Err(Error::TokenNotReady),
        }
    }

    /// Replaces the bearer token and its expiry.
    pub fn refresh_token(
        &self,
        token: impl Into<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        let Auth::Token(tx) = &self.auth else {
            return Err(Error::Config(
                "refresh_token requires token credentials".to_string(),
            ));
        };
        let token = BearerToken::new(token, expires_at);
        if token.token.is_empty() {
            return Err(Error::Config("token must be non-empty".to_string()));
        }
        tx.send_replace(token);
        Ok(())
    }

    /// Returns the current bearer token, if these are token credentials.
    pub fn bearer_token(&self) -> Option<BearerToken> {
        match &self.auth {
            Auth::Token(tx) => Some(tx.borrow().clone()),
            _ => None,
        }
    }

    /// Returns the `Authorization` header value for the next call.
    pub fn authorization(&self) -> Result<HeaderValue> {
        let value = match &self.auth {
            Auth::Basic { username, password } => basic_header(username, password),
            Auth::ApiKey(key) => basic_header(API_KEY_USERNAME, key),
            Auth::Token(tx) => {
                let token = tx.borrow();
                if !token.is_valid_at(Utc::now()) {
                    return Err(Error::TokenNotReady);
                }
                format!("Bearer {}", token.token)
            }
        };

        let mut header = HeaderValue::from_str(&value)
            .map_err(|e| Error::Config(format!("invalid credential characters: {}", e)))?;
        header.set_sensitive(true);
        Ok(header)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Credentials");
        s.field("base_url", &self.base_url);
        match &self.auth {
            Auth::Basic { username, .. } => {
                s.field("username", username).field("password", &"****")
            }
            Auth::ApiKey(key) => s.field("api_key", &mask_secret(key)),
            Auth::Token(tx) => s.field("token", &*tx.borrow()),
        };
        s.finish()
    }
}

fn basic_header(username: &str, password: &str) -> String {
    format!("Basic {}", BASE64.encode(format!("{}:{}", username, password)))
}

/// Masks a secret for display, keeping at most four characters at each end.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 8 {
        "*".repeat(chars.len())
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
    }
}
