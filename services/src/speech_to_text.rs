//! Speech to text service.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use cogsdk_rest::{Credentials, RequestBuilder, RequestDescriptor, Response, RestClient, Result};
use serde::{Deserialize, Serialize};

use crate::{
    capability::CustomizationOperations,
    streaming::{RecognizeSession, StreamOptions},
};

/// Default service URL.
pub const DEFAULT_URL: &str = "https://stream.watsonplatform.net/speech-to-text/api";

/// Default recognition model.
pub const DEFAULT_MODEL: &str = "en-US_BroadbandModel";

/// Speech to text service.
pub struct SpeechToText {
    client: Arc<RestClient>,
}

impl SpeechToText {
    /// Creates the service with a default client.
    pub fn new(credentials: Credentials) -> Result<Self> {
        Ok(Self::with_client(Arc::new(RestClient::new(credentials)?)))
    }

    /// Creates the service on a shared client.
    pub fn with_client(client: Arc<RestClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<RestClient> {
        &self.client
    }

    pub fn build_list_models(&self) -> Result<RequestDescriptor> {
        self.client.authorize(RequestBuilder::get("/v1/models").build()?)
    }

    /// Lists the available recognition models.
    pub async fn list_models(&self) -> Result<Response<SpeechModels>> {
        let req = self.build_list_models()?;
        self.client.send_json(req).await
    }

    pub fn build_get_model(&self, model_id: &str) -> Result<RequestDescriptor> {
        let req = RequestBuilder::get("/v1/models/{model_id}")
            .param("model_id", model_id)
            .build()?;
        self.client.authorize(req)
    }

    /// Returns a single recognition model.
    pub async fn get_model(&self, model_id: &str) -> Result<Response<SpeechModel>> {
        let req = self.build_get_model(model_id)?;
        self.client.send_json(req).await
    }

    /// Builds a recognize request for a complete audio file.
    pub fn build_recognize(
        &self,
        audio: impl Into<Bytes>,
        content_type: &str,
        options: &RecognizeOptions,
    ) -> Result<RequestDescriptor> {
        let audio = audio.into();
        let req = RequestBuilder::post("/v1/recognize")
            .require_bytes("audio", &audio)
            .require("content_type", content_type)
            .query_opt("model", options.model.as_deref())
            .query_opt("customization_id", options.customization_id.as_deref())
            .query_opt("inactivity_timeout", options.inactivity_timeout)
            .query_list("keywords", &options.keywords)
            .query_opt("keywords_threshold", options.keywords_threshold)
            .query_opt("max_alternatives", options.max_alternatives)
            .query_opt("word_confidence", options.word_confidence.then_some(true))
            .query_opt("timestamps", options.timestamps.then_some(true))
            .query_opt("profanity_filter", options.profanity_filter)
            .query_opt("smart_formatting", options.smart_formatting.then_some(true))
            .query_opt("speaker_labels", options.speaker_labels.then_some(true))
            .bytes(content_type, audio)
            .build()?;
        self.client.authorize(req)
    }

    /// Transcribes a complete audio file.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let audio = std::fs::read("hello.wav")?;
    /// let resp = stt.recognize(audio, "audio/wav", &RecognizeOptions::default()).await?;
    /// println!("{}", resp.payload.transcript());
    /// ```
    pub async fn recognize(
        &self,
        audio: impl Into<Bytes>,
        content_type: &str,
        options: &RecognizeOptions,
    ) -> Result<Response<RecognitionResults>> {
        let req = self.build_recognize(audio, content_type, options)?;
        self.client.send_json(req).await
    }

    /// Opens a streaming recognition session on this service instance.
    pub async fn recognize_stream(&self, options: &StreamOptions) -> Result<RecognizeSession> {
        RecognizeSession::connect(&self.client, options).await
    }

    pub fn build_list_customizations(&self, language: Option<&str>) -> Result<RequestDescriptor> {
        let req = RequestBuilder::get("/v1/customizations")
            .query_opt("language", language)
            .build()?;
        self.client.authorize(req)
    }

    pub fn build_create_customization(&self, request: &CreateLanguageModel) -> Result<RequestDescriptor> {
        let req = RequestBuilder::post("/v1/customizations")
            .require("name", &request.name)
            .require("base_model_name", &request.base_model_name)
            .json(request)
            .build()?;
        self.client.authorize(req)
    }

    pub fn build_get_customization(&self, customization_id: &str) -> Result<RequestDescriptor> {
        let req = RequestBuilder::get("/v1/customizations/{customization_id}")
            .param("customization_id", customization_id)
            .build()?;
        self.client.authorize(req)
    }

    pub fn build_train_customization(&self, customization_id: &str) -> Result<RequestDescriptor> {
        let req = RequestBuilder::post("/v1/customizations/{customization_id}/train")
            .param("customization_id", customization_id)
            .build()?;
        self.client.authorize(req)
    }

    pub fn build_delete_customization(&self, customization_id: &str) -> Result<RequestDescriptor> {
        let req = RequestBuilder::delete("/v1/customizations/{customization_id}")
            .param("customization_id", customization_id)
            .build()?;
        self.client.authorize(req)
    }
}

#[async_trait]
impl CustomizationOperations for SpeechToText {
    async fn list_customizations(&self, language: Option<&str>) -> Result<Response<LanguageModels>> {
        let req = self.build_list_customizations(language)?;
        self.client.send_json(req).await
    }

    async fn create_customization(
        &self,
        request: &CreateLanguageModel,
    ) -> Result<Response<CustomizationId>> {
        let req = self.build_create_customization(request)?;
        self.client.send_json(req).await
    }

    async fn get_customization(&self, customization_id: &str) -> Result<Response<LanguageModel>> {
        let req = self.build_get_customization(customization_id)?;
        self.client.send_json(req).await
    }

    async fn train_customization(&self, customization_id: &str) -> Result<Response<()>> {
        let req = self.build_train_customization(customization_id)?;
        self.client.send_empty(req).await
    }

    async fn delete_customization(&self, customization_id: &str) -> Result<Response<()>> {
        let req = self.build_delete_customization(customization_id)?;
        self.client.send_empty(req).await
    }
}

// ==================== Request/Response Types ====================

/// Options for [`SpeechToText::recognize`].
#[derive(Debug, Clone, Default)]
pub struct RecognizeOptions {
    /// Model ID. The service default is [`DEFAULT_MODEL`].
    pub model: Option<String>,
    pub customization_id: Option<String>,
    /// Seconds of silence after which the service stops; -1 disables it.
    pub inactivity_timeout: Option<i32>,
    pub keywords: Vec<String>,
    pub keywords_threshold: Option<f32>,
    pub max_alternatives: Option<u32>,
    pub word_confidence: bool,
    pub timestamps: bool,
    pub profanity_filter: Option<bool>,
    pub smart_formatting: bool,
    pub speaker_labels: bool,
}

/// Features a model supports.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupportedFeatures {
    #[serde(default)]
    pub custom_language_model: bool,
    #[serde(default)]
    pub speaker_labels: bool,
}

/// A recognition model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeechModel {
    pub name: String,
    #[serde(default)]
    pub language: String,
    /// Sampling rate in Hz.
    #[serde(default)]
    pub rate: u32,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub supported_features: SupportedFeatures,
}

/// List of recognition models.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeechModels {
    #[serde(default)]
    pub models: Vec<SpeechModel>,
}

/// Recognition results for one request or one streaming update.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecognitionResults {
    #[serde(default)]
    pub results: Vec<SpeechRecognitionResult>,
    /// Index of the first result in this update.
    #[serde(default)]
    pub result_index: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl RecognitionResults {
    /// Joins the best alternative of every final result.
    pub fn transcript(&self) -> String {
        self.results
            .iter()
            .filter(|r| r.is_final)
            .filter_map(|r| r.alternatives.first())
            .map(|a| a.transcript.trim())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Returns true if every result is final.
    pub fn is_final(&self) -> bool {
        !self.results.is_empty() && self.results.iter().all(|r| r.is_final)
    }
}

/// A single recognized utterance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeechRecognitionResult {
    #[serde(rename = "final", default)]
    pub is_final: bool,
    #[serde(default)]
    pub alternatives: Vec<SpeechRecognitionAlternative>,
}

/// One transcription hypothesis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeechRecognitionAlternative {
    pub transcript: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    /// `[word, start, end]` triples in seconds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub timestamps: Vec<(String, f64, f64)>,
    /// `[word, confidence]` pairs.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub word_confidence: Vec<(String, f64)>,
}

/// Lifecycle state of a custom language model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CustomizationStatus {
    Pending,
    Ready,
    Training,
    Available,
    Failed,
    Upgrading,
    #[default]
    #[serde(other)]
    Unknown,
}

impl CustomizationStatus {
    /// Returns true if the model can be used for recognition.
    pub fn is_available(&self) -> bool {
        matches!(self, CustomizationStatus::Available)
    }

    /// Returns true if the model is being trained or upgraded.
    pub fn is_busy(&self) -> bool {
        matches!(self, CustomizationStatus::Training | CustomizationStatus::Upgrading)
    }
}

/// A custom language model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguageModel {
    pub customization_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub base_model_name: String,
    #[serde(default)]
    pub status: CustomizationStatus,
    /// Training progress in percent.
    #[serde(default)]
    pub progress: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

/// List of custom language models.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LanguageModels {
    #[serde(default)]
    pub customizations: Vec<LanguageModel>,
}

/// Request to create a custom language model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateLanguageModel {
    pub name: String,
    pub base_model_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dialect: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// ID of a newly created custom model.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomizationId {
    pub customization_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::mock_client;
    use cogsdk_rest::{Body, Method};
    use serde_json::json;

    const URL: &str = "https://api.example.com/speech-to-text/api";

    #[tokio::test]
    async fn test_recognize() {
        let (mock, client) = mock_client(URL);
        let stt = SpeechToText::with_client(client);
        mock.push_json(
            200,
            json!({
                "result_index": 0,
                "results": [
                    {
                        "final": true,
                        "alternatives": [
                            {
                                "transcript": "hello world ",
                                "confidence": 0.96,
                                "timestamps": [["hello", 0.1, 0.4], ["world", 0.45, 0.9]]
                            }
                        ]
                    },
                    { "final": false, "alternatives": [{ "transcript": "and" }] }
                ]
            }),
        );

        let options = RecognizeOptions {
            model: Some(DEFAULT_MODEL.to_string()),
            timestamps: true,
            keywords: vec!["hello".into(), "world".into()],
            keywords_threshold: Some(0.5),
            ..Default::default()
        };
        let resp = stt
            .recognize(vec![0u8; 64], "audio/l16;rate=16000", &options)
            .await
            .unwrap();

        assert_eq!(resp.payload.transcript(), "hello world");
        assert!(!resp.payload.is_final());
        let alt = &resp.payload.results[0].alternatives[0];
        assert_eq!(alt.timestamps[1].0, "world");
        assert!((alt.timestamps[1].2 - 0.9).abs() < 1e-9);

        let sent = &mock.requests()[0];
        assert_eq!(sent.request.method, Method::Post);
        assert_eq!(sent.request.query.get("model"), Some(DEFAULT_MODEL));
        assert_eq!(sent.request.query.get("timestamps"), Some("true"));
        assert_eq!(sent.request.query.get("keywords"), Some("hello,world"));
        assert_eq!(sent.request.query.get("word_confidence"), None);
        assert_eq!(sent.request.header("content-type"), Some("audio/l16;rate=16000"));
        match &sent.request.body {
            Some(Body::Bytes { data, .. }) => assert_eq!(data.len(), 64),
            other => panic!("unexpected body: {other:?}"),
        }
    }

    #[test]
    fn test_recognize_requires_audio() {
        let (_, client) = mock_client(URL);
        let stt = SpeechToText::with_client(client);

        let err = stt
            .build_recognize(Vec::new(), "audio/wav", &RecognizeOptions::default())
            .unwrap_err();
        assert!(err.is_invalid_argument());

        let err = stt
            .build_recognize(vec![1u8], "", &RecognizeOptions::default())
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[tokio::test]
    async fn test_recognize_rejects_header_injection() {
        let (mock, client) = mock_client(URL);
        let stt = SpeechToText::with_client(client);

        let err = stt
            .build_recognize(vec![1u8, 2], "audio/wav\r\nX-Extra: 1", &RecognizeOptions::default())
            .unwrap_err();
        assert!(err.is_invalid_argument());

        let err = stt
            .recognize(vec![1u8, 2], "audio/wav\r\nX-Extra: 1", &RecognizeOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(!err.is_transport());
        assert!(mock.requests().is_empty());
    }

    #[tokio::test]
    async fn test_list_models() {
        let (mock, client) = mock_client(URL);
        let stt = SpeechToText::with_client(client);
        mock.push_json(
            200,
            json!({
                "models": [{
                    "name": "en-US_NarrowbandModel",
                    "language": "en-US",
                    "rate": 8000,
                    "supported_features": { "custom_language_model": true, "speaker_labels": true }
                }]
            }),
        );

        let resp = stt.list_models().await.unwrap();
        let model = &resp.payload.models[0];
        assert_eq!(model.rate, 8000);
        assert!(model.supported_features.custom_language_model);
    }

    #[tokio::test]
    async fn test_customization_operations() {
        let (mock, client) = mock_client(URL);
        let stt = SpeechToText::with_client(client);
        mock.push_json(201, json!({ "customization_id": "74f4807e" }));
        mock.push_json(
            200,
            json!({
                "customization_id": "74f4807e",
                "name": "Example model",
                "base_model_name": "en-US_BroadbandModel",
                "status": "training",
                "progress": 40
            }),
        );
        mock.push_json(200, json!({ "customizations": [{ "customization_id": "a", "status": "migrating" }] }));

        let create = CreateLanguageModel {
            name: "Example model".into(),
            base_model_name: "en-US_BroadbandModel".into(),
            ..Default::default()
        };
        let id = stt.create_customization(&create).await.unwrap().into_payload();
        assert_eq!(id.customization_id, "74f4807e");

        let model = stt.get_customization(&id.customization_id).await.unwrap().payload;
        assert_eq!(model.status, CustomizationStatus::Training);
        assert!(model.status.is_busy());
        assert_eq!(model.progress, 40);

        let list = stt.list_customizations(Some("en-US")).await.unwrap().payload;
        assert_eq!(list.customizations[0].status, CustomizationStatus::Unknown);

        let sent = mock.requests();
        assert_eq!(
            sent[0].request.json_body(),
            Some(&json!({ "name": "Example model", "base_model_name": "en-US_BroadbandModel" }))
        );
        assert_eq!(sent[1].request.path(), "/v1/customizations/74f4807e");
        assert_eq!(sent[2].request.query.get("language"), Some("en-US"));
    }

    #[tokio::test]
    async fn test_customization_through_trait_object() {
        let (mock, client) = mock_client(URL);
        let ops: Box<dyn CustomizationOperations> = Box::new(SpeechToText::with_client(client));
        mock.push_json(200, json!({}));

        ops.train_customization("74f4807e").await.unwrap();
        assert!(ops.delete_customization("").await.unwrap_err().is_invalid_argument());
        assert_eq!(mock.requests()[0].request.path(), "/v1/customizations/74f4807e/train");
        assert_eq!(mock.request_count(), 1);
    }
}
