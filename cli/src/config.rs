//! Configuration management for CLI tools.
//!
//! Configuration is stored in ~/.cogsdk/{app_name}/config.yaml and holds
//! named contexts, similar to kubectl. Each context points at one service
//! instance: its URL, credentials and request settings.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use cogsdk_rest::{AuthMode, Credentials, RestClient, mask_secret};
use serde::{Deserialize, Serialize};

/// Default base configuration directory name.
pub const DEFAULT_BASE_DIR: &str = ".cogsdk";
/// Default configuration filename.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";

/// CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Application name (not serialized).
    #[serde(skip)]
    pub app_name: String,

    /// Name of the currently active context.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub current_context: String,

    /// Map of context name to context configuration.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub contexts: HashMap<String, Context>,

    /// Path to the config file (not serialized).
    #[serde(skip)]
    config_path: PathBuf,
}

/// A single service context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Context {
    /// Context name.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Service base URL (optional, the service default is used if empty).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,

    /// API key. Takes precedence over the other credentials.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub api_key: String,

    /// Basic auth username.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,

    /// Basic auth password.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub password: String,

    /// Pre-obtained bearer token.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,

    /// API version date for versioned services (optional).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub version: String,

    /// Request timeout in seconds (optional).
    #[serde(default, skip_serializing_if = "is_zero")]
    pub timeout: i32,

    /// Maximum number of retries (optional).
    #[serde(default, skip_serializing_if = "is_zero")]
    pub max_retries: i32,

    /// Opt out of request logging by the service.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub learning_opt_out: bool,

    /// Application-specific settings.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub extra: HashMap<String, String>,
}

fn is_zero(n: &i32) -> bool {
    *n == 0
}

impl Config {
    /// Gets the default config directory.
    pub fn default_config_dir(app_name: &str) -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(DEFAULT_BASE_DIR).join(app_name))
    }

    /// Gets the default config file path.
    pub fn default_config_path(app_name: &str) -> Option<PathBuf> {
        Self::default_config_dir(app_name).map(|dir| dir.join(DEFAULT_CONFIG_FILE))
    }

    /// Returns the config file path.
    pub fn path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Saves the configuration to disk.
    pub fn save(&self) -> anyhow::Result<()> {
        let content = serde_yaml::to_string(self)?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Adds or replaces a context. The first context added becomes current.
    pub fn add_context(&mut self, name: &str, mut ctx: Context) -> anyhow::Result<()> {
        if name.is_empty() {
            anyhow::bail!("context name must not be empty");
        }
        ctx.name = name.to_string();
        self.contexts.insert(name.to_string(), ctx);
        if self.current_context.is_empty() {
            self.current_context = name.to_string();
        }
        self.save()
    }

    /// Deletes a context.
    pub fn delete_context(&mut self, name: &str) -> anyhow::Result<()> {
        if self.contexts.remove(name).is_none() {
            anyhow::bail!("context '{}' not found", name);
        }
        if self.current_context == name {
            self.current_context.clear();
        }
        self.save()
    }

    /// Sets the current context.
    pub fn use_context(&mut self, name: &str) -> anyhow::Result<()> {
        if !self.contexts.contains_key(name) {
            anyhow::bail!("context '{}' not found", name);
        }
        self.current_context = name.to_string();
        self.save()
    }

    pub fn get_context(&self, name: &str) -> Option<&Context> {
        self.contexts.get(name)
    }

    /// Gets the current context.
    pub fn get_current_context(&self) -> Option<&Context> {
        if self.current_context.is_empty() {
            return None;
        }
        self.contexts.get(&self.current_context)
    }

    /// Resolves the context by name, or current context if name is empty.
    pub fn resolve_context(&self, name: Option<&str>) -> Option<&Context> {
        match name {
            Some(n) if !n.is_empty() => self.get_context(n),
            _ => self.get_current_context(),
        }
    }

    /// Lists all context names, sorted.
    pub fn list_contexts(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.contexts.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

impl Context {
    /// Gets an extra value.
    pub fn get_extra(&self, key: &str) -> Option<&str> {
        self.extra.get(key).map(|s| s.as_str())
    }

    /// Sets an extra value.
    pub fn set_extra(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.extra.insert(key.into(), value.into());
    }

    /// Returns which credentials this context carries, or `None` if it
    /// has none. An API key wins over basic auth, which wins over a token.
    pub fn auth_mode(&self) -> Option<AuthMode> {
        if !self.api_key.is_empty() {
            Some(AuthMode::ApiKey)
        } else if !self.username.is_empty() {
            Some(AuthMode::Basic)
        } else if !self.token.is_empty() {
            Some(AuthMode::Token)
        } else {
            None
        }
    }

    /// Short label of the auth mode for listings.
    pub fn auth_label(&self) -> &'static str {
        match self.auth_mode() {
            Some(AuthMode::ApiKey) => "api_key",
            Some(AuthMode::Basic) => "basic",
            Some(AuthMode::Token) => "token",
            None => "none",
        }
    }

    /// Returns the context URL, or `default_url` if none is set.
    pub fn url_or<'a>(&'a self, default_url: &'a str) -> &'a str {
        if self.url.is_empty() { default_url } else { &self.url }
    }

    /// Returns the context API version, or `default_version` if none is set.
    pub fn version_or<'a>(&'a self, default_version: &'a str) -> &'a str {
        if self.version.is_empty() {
            default_version
        } else {
            &self.version
        }
    }

    /// Builds credentials for the service at `default_url`.
    pub fn credentials(&self, default_url: &str) -> anyhow::Result<Credentials> {
        let url = self.url_or(default_url);
        let creds = match self.auth_mode() {
            Some(AuthMode::ApiKey) => Credentials::api_key(url, &self.api_key)?,
            Some(AuthMode::Basic) => Credentials::basic(url, &self.username, &self.password)?,
            Some(AuthMode::Token) => Credentials::token(url, &self.token, None)?,
            None => anyhow::bail!(
                "context '{}' has no credentials; set api_key, username/password or token",
                self.name
            ),
        };
        Ok(creds)
    }

    /// Builds a client for the service at `default_url` with this
    /// context's timeout, retry and opt-out settings.
    pub fn client(&self, default_url: &str) -> anyhow::Result<RestClient> {
        let mut builder = RestClient::builder(self.credentials(default_url)?)
            .max_retries(self.max_retries.max(0) as u32)
            .learning_opt_out(self.learning_opt_out);
        if self.timeout > 0 {
            builder = builder.timeout(Duration::from_secs(self.timeout as u64));
        }
        Ok(builder.build()?)
    }

    /// Returns a copy safe for display, with secrets masked.
    pub fn masked(&self) -> Context {
        let mut ctx = self.clone();
        ctx.api_key = mask_api_key(&self.api_key);
        ctx.password = mask_api_key(&self.password);
        ctx.token = mask_api_key(&self.token);
        ctx
    }
}

/// Loads configuration for the specified app.
pub fn load_config(app_name: &str, custom_path: Option<&str>) -> anyhow::Result<Config> {
    let config_path = match custom_path {
        Some(p) => PathBuf::from(p),
        None => Config::default_config_path(app_name)
            .ok_or_else(|| anyhow::anyhow!("cannot determine config path"))?,
    };

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let mut cfg = if config_path.exists() {
        let content = std::fs::read_to_string(&config_path)?;
        if content.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&content)?
        }
    } else {
        let cfg = Config::default();
        std::fs::write(&config_path, serde_yaml::to_string(&cfg)?)?;
        cfg
    };

    cfg.app_name = app_name.to_string();
    cfg.config_path = config_path;
    for (name, ctx) in cfg.contexts.iter_mut() {
        if ctx.name.is_empty() {
            ctx.name = name.clone();
        }
    }

    Ok(cfg)
}

/// Masks an API key for display.
pub fn mask_api_key(key: &str) -> String {
    mask_secret(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn load(dir: &TempDir) -> Config {
        let path = dir.path().join("cogsdk").join("config.yaml");
        load_config("cogsdk", path.to_str()).unwrap()
    }

    #[test]
    fn test_load_creates_file() {
        let dir = TempDir::new().unwrap();
        let cfg = load(&dir);
        assert!(cfg.path().exists());
        assert!(cfg.contexts.is_empty());
        assert_eq!(cfg.app_name, "cogsdk");
    }

    #[test]
    fn test_context_lifecycle() {
        let dir = TempDir::new().unwrap();
        let mut cfg = load(&dir);

        let ctx = Context {
            api_key: "abc123".into(),
            url: "https://stt.example.com/api".into(),
            timeout: 30,
            ..Default::default()
        };
        cfg.add_context("stt", ctx).unwrap();
        cfg.add_context("nlc", Context::default()).unwrap();
        assert_eq!(cfg.current_context, "stt");

        let reloaded = load(&dir);
        assert_eq!(reloaded.list_contexts(), vec!["nlc", "stt"]);
        let stt = reloaded.resolve_context(None).unwrap();
        assert_eq!(stt.name, "stt");
        assert_eq!(stt.timeout, 30);

        cfg.use_context("nlc").unwrap();
        assert_eq!(cfg.resolve_context(None).unwrap().name, "nlc");
        assert_eq!(cfg.resolve_context(Some("stt")).unwrap().name, "stt");

        cfg.delete_context("nlc").unwrap();
        assert!(cfg.current_context.is_empty());
        assert!(cfg.resolve_context(None).is_none());
        assert!(cfg.delete_context("nlc").is_err());
        assert!(cfg.use_context("missing").is_err());
    }

    #[test]
    fn test_auth_mode() {
        let mut ctx = Context::default();
        assert_eq!(ctx.auth_mode(), None);
        assert_eq!(ctx.auth_label(), "none");
        ctx.token = "tok".into();
        assert_eq!(ctx.auth_mode(), Some(AuthMode::Token));
        ctx.username = "user".into();
        assert_eq!(ctx.auth_mode(), Some(AuthMode::Basic));
        ctx.api_key = "key".into();
        assert_eq!(ctx.auth_mode(), Some(AuthMode::ApiKey));
        assert_eq!(ctx.auth_label(), "api_key");
    }

    #[test]
    fn test_credentials_from_context() {
        let ctx = Context {
            name: "nlc".into(),
            api_key: "abc123".into(),
            ..Default::default()
        };
        let creds = ctx.credentials("https://nlc.example.com/api").unwrap();
        assert_eq!(creds.base_url(), "https://nlc.example.com/api");
        assert_eq!(creds.authorization().unwrap(), "Basic YXBpa2V5OmFiYzEyMw==");

        let ctx = Context {
            name: "empty".into(),
            ..Default::default()
        };
        let err = ctx.credentials("https://nlc.example.com/api").unwrap_err();
        assert!(err.to_string().contains("no credentials"));
    }

    #[test]
    fn test_url_and_version_fallback() {
        let mut ctx = Context::default();
        assert_eq!(ctx.url_or("https://default"), "https://default");
        assert_eq!(ctx.version_or("2017-05-26"), "2017-05-26");
        ctx.url = "https://custom".into();
        ctx.version = "2018-01-01".into();
        assert_eq!(ctx.url_or("https://default"), "https://custom");
        assert_eq!(ctx.version_or("2017-05-26"), "2018-01-01");
    }

    #[test]
    fn test_extra() {
        let mut ctx = Context::default();
        ctx.set_extra("voice", "en-US_AllisonVoice");
        assert_eq!(ctx.get_extra("voice"), Some("en-US_AllisonVoice"));
        assert_eq!(ctx.get_extra("model"), None);
    }

    #[test]
    fn test_mask_api_key() {
        assert_eq!(mask_api_key(""), "");
        assert_eq!(mask_api_key("abc123"), "******");
        assert_eq!(mask_api_key("abcd1234efgh"), "abcd****efgh");

        let ctx = Context {
            api_key: "abcd1234efgh".into(),
            password: "secret".into(),
            ..Default::default()
        };
        let masked = ctx.masked();
        assert_eq!(masked.api_key, "abcd****efgh");
        assert_eq!(masked.password, "******");
        assert_eq!(ctx.api_key, "abcd1234efgh");
    }
}
