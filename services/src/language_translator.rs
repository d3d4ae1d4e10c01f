//! Language translator service.

use std::sync::Arc;

use cogsdk_rest::{Credentials, RequestBuilder, RequestDescriptor, Response, RestClient, Result};
use serde::{Deserialize, Serialize};

/// Default service URL.
pub const DEFAULT_URL: &str = "https://gateway.watsonplatform.net/language-translator/api";

/// Default API version date.
pub const DEFAULT_VERSION: &str = "2018-05-01";

/// Language translator service.
pub struct LanguageTranslator {
    client: Arc<RestClient>,
    version: String,
}

impl LanguageTranslator {
    /// Creates the service with a default client.
    pub fn new(credentials: Credentials) -> Result<Self> {
        Ok(Self::with_client(Arc::new(RestClient::new(credentials)?)))
    }

    /// Creates the service on a shared client.
    pub fn with_client(client: Arc<RestClient>) -> Self {
        Self {
            client,
            version: DEFAULT_VERSION.to_string(),
        }
    }

    /// Sets the API version date sent with every request.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn client(&self) -> &Arc<RestClient> {
        &self.client
    }

    /// Builds a translate request. Either a model ID or a target language
    /// must be given.
    pub fn build_translate(&self, request: &TranslateRequest) -> Result<RequestDescriptor> {
        let mut builder = RequestBuilder::post("/v3/translate").query("version", &self.version);
        if request.text.is_empty() {
            builder = builder.require("text", "");
        }
        for text in &request.text {
            builder = builder.require("text", text);
        }
        if request.model_id.is_none() {
            builder = builder.require_some("target", request.target.as_ref());
        }
        self.client.authorize(builder.json(request).build()?)
    }

    /// Translates one or more texts.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let req = TranslateRequest::new(["Hello"]).source("en").target("es");
    /// let resp = lt.translate(&req).await?;
    /// println!("{}", resp.payload.translations[0].translation);
    /// ```
    pub async fn translate(&self, request: &TranslateRequest) -> Result<Response<TranslationResult>> {
        let req = self.build_translate(request)?;
        self.client.send_json(req).await
    }

    /// Builds an identify request. The text is sent as a plain text body.
    pub fn build_identify(&self, text: &str) -> Result<RequestDescriptor> {
        let req = RequestBuilder::post("/v3/identify")
            .require("text", text)
            .query("version", &self.version)
            .accept("application/json")
            .bytes("text/plain", text.to_string())
            .build()?;
        self.client.authorize(req)
    }

    /// Identifies the language of `text`.
    pub async fn identify(&self, text: &str) -> Result<Response<IdentifiedLanguages>> {
        let req = self.build_identify(text)?;
        self.client.send_json(req).await
    }

    pub fn build_list_identifiable_languages(&self) -> Result<RequestDescriptor> {
        let req = RequestBuilder::get("/v3/identifiable_languages")
            .query("version", &self.version)
            .build()?;
        self.client.authorize(req)
    }

    /// Lists the languages [`identify`](Self::identify) can detect.
    pub async fn list_identifiable_languages(&self) -> Result<Response<IdentifiableLanguages>> {
        let req = self.build_list_identifiable_languages()?;
        self.client.send_json(req).await
    }
}

// ==================== Request/Response Types ====================

/// Translate request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: Vec<String>,
    /// Model such as `en-es`. Overrides `source` and `target`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

impl TranslateRequest {
    pub fn new<I, S>(text: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            text: text.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = Some(model_id.into());
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }
}

/// A single translation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Translation {
    pub translation: String,
}

/// Translate response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranslationResult {
    #[serde(default)]
    pub translations: Vec<Translation>,
    #[serde(default)]
    pub word_count: u64,
    #[serde(default)]
    pub character_count: u64,
}

/// A detected language and its confidence.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentifiedLanguage {
    pub language: String,
    #[serde(default)]
    pub confidence: f64,
}

/// Identify response, most likely language first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentifiedLanguages {
    #[serde(default)]
    pub languages: Vec<IdentifiedLanguage>,
}

impl IdentifiedLanguages {
    /// Returns the most likely language.
    pub fn best(&self) -> Option<&IdentifiedLanguage> {
        self.languages
            .iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
    }
}

/// A language the service can identify.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentifiableLanguage {
    pub language: String,
    #[serde(default)]
    pub name: String,
}

/// List of identifiable languages.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentifiableLanguages {
    #[serde(default)]
    pub languages: Vec<IdentifiableLanguage>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::mock_client;
    use cogsdk_rest::Body;
    use serde_json::json;

    const URL: &str = "https://api.example.com/language-translator/api";

    #[tokio::test]
    async fn test_translate() {
        let (mock, client) = mock_client(URL);
        let lt = LanguageTranslator::with_client(client);
        mock.push_json(
            200,
            json!({
                "translations": [{ "translation": "Hola" }],
                "word_count": 1,
                "character_count": 5
            }),
        );

        let req = TranslateRequest::new(["Hello"]).source("en").target("es");
        let resp = lt.translate(&req).await.unwrap().payload;
        assert_eq!(resp.translations[0].translation, "Hola");
        assert_eq!(resp.word_count, 1);

        let sent = &mock.requests()[0];
        assert_eq!(
            sent.request.json_body(),
            Some(&json!({ "text": ["Hello"], "source": "en", "target": "es" }))
        );
    }

    #[test]
    fn test_translate_validation() {
        let (_, client) = mock_client(URL);
        let lt = LanguageTranslator::with_client(client);

        let no_text = TranslateRequest::new(Vec::<String>::new()).target("es");
        assert!(lt.build_translate(&no_text).unwrap_err().is_invalid_argument());

        let no_target = TranslateRequest::new(["Hello"]);
        assert!(lt.build_translate(&no_target).unwrap_err().is_invalid_argument());

        let by_model = TranslateRequest::new(["Hello"]).model("en-es");
        assert!(lt.build_translate(&by_model).is_ok());
    }

    #[tokio::test]
    async fn test_identify() {
        let (mock, client) = mock_client(URL);
        let lt = LanguageTranslator::with_client(client);
        mock.push_json(
            200,
            json!({
                "languages": [
                    { "language": "fr", "confidence": 0.03 },
                    { "language": "en", "confidence": 0.94 }
                ]
            }),
        );

        let resp = lt.identify("The language of this text").await.unwrap();
        assert_eq!(resp.payload.best().map(|l| l.language.as_str()), Some("en"));

        let sent = &mock.requests()[0];
        assert_eq!(sent.request.header("content-type"), Some("text/plain"));
        assert_eq!(sent.request.header("accept"), Some("application/json"));
        match &sent.request.body {
            Some(Body::Bytes { data, .. }) => assert_eq!(data.as_ref(), b"The language of this text"),
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_list_identifiable_languages() {
        let (mock, client) = mock_client(URL);
        let lt = LanguageTranslator::with_client(client);
        mock.push_json(200, json!({ "languages": [{ "language": "af", "name": "Afrikaans" }] }));

        let resp = lt.list_identifiable_languages().await.unwrap();
        assert_eq!(resp.payload.languages[0].name, "Afrikaans");
    }
}
