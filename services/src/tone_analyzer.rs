//! Tone analyzer service.

use std::sync::Arc;

use cogsdk_rest::{Credentials, RequestBuilder, RequestDescriptor, Response, RestClient, Result};
use serde::{Deserialize, Serialize};

/// Default service URL.
pub const DEFAULT_URL: &str = "https://gateway.watsonplatform.net/tone-analyzer/api";

/// Default API version date.
pub const DEFAULT_VERSION: &str = "2017-09-21";

/// Tone category to analyze.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToneCategory {
    Emotion,
    Language,
    Social,
}

impl ToneCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToneCategory::Emotion => "emotion",
            ToneCategory::Language => "language",
            ToneCategory::Social => "social",
        }
    }
}

/// Tone analyzer service.
pub struct ToneAnalyzer {
    client: Arc<RestClient>,
    version: String,
}

impl ToneAnalyzer {
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

    pub fn build_tone(&self, text: &str, sentences: bool, tones: &[ToneCategory]) -> Result<RequestDescriptor> {
        #[derive(Serialize)]
        struct Request<'a> {
            text: &'a str,
        }

        let tones: Vec<_> = tones.iter().map(ToneCategory::as_str).collect();
        let req = RequestBuilder::post("/v3/tone")
            .require("text", text)
            .query("version", &self.version)
            .query("sentences", sentences)
            .query_list("tones", &tones)
            .json(&Request { text })
            .build()?;
        self.client.authorize(req)
    }

    /// Analyzes the tone of `text`. An empty `tones` slice requests all
    /// categories.
    pub async fn tone(&self, text: &str, sentences: bool, tones: &[ToneCategory]) -> Result<Response<ToneAnalysis>> {
        let req = self.build_tone(text, sentences, tones)?;
        self.client.send_json(req).await
    }
}

// ==================== Request/Response Types ====================

/// Score of a single tone.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToneScore {
    pub tone_id: String,
    #[serde(default)]
    pub tone_name: String,
    #[serde(default)]
    pub score: f64,
}

/// Scores grouped by category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToneCategoryScores {
    pub category_id: String,
    #[serde(default)]
    pub category_name: String,
    #[serde(default)]
    pub tones: Vec<ToneScore>,
}

/// Document-level analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentAnalysis {
    #[serde(default)]
    pub tones: Vec<ToneScore>,
    #[serde(default)]
    pub tone_categories: Vec<ToneCategoryScores>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

/// Sentence-level analysis.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SentenceAnalysis {
    pub sentence_id: u32,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub tones: Vec<ToneScore>,
    #[serde(default)]
    pub tone_categories: Vec<ToneCategoryScores>,
}

/// Tone analysis response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToneAnalysis {
    #[serde(default)]
    pub document_tone: DocumentAnalysis,
    #[serde(default)]
    pub sentences_tone: Vec<SentenceAnalysis>,
}

impl ToneAnalysis {
    /// Returns the strongest document-level tone.
    pub fn dominant_tone(&self) -> Option<&ToneScore> {
        self.document_tone
            .tones
            .iter()
            .chain(self.document_tone.tone_categories.iter().flat_map(|c| &c.tones))
            .max_by(|a, b| a.score.total_cmp(&b.score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::mock_client;
    use serde_json::json;

    const URL: &str = "https://api.example.com/tone-analyzer/api";

    #[tokio::test]
    async fn test_tone() {
        let (mock, client) = mock_client(URL);
        let ta = ToneAnalyzer::with_client(client);
        mock.push_json(
            200,
            json!({
                "document_tone": {
                    "tones": [
                        { "score": 0.6165, "tone_id": "sadness", "tone_name": "Sadness" },
                        { "score": 0.8294, "tone_id": "analytical", "tone_name": "Analytical" }
                    ]
                },
                "sentences_tone": [
                    { "sentence_id": 0, "text": "Team, I know that times are tough!", "tones": [] }
                ]
            }),
        );

        let resp = ta
            .tone("Team, I know that times are tough!", true, &[ToneCategory::Emotion, ToneCategory::Language])
            .await
            .unwrap()
            .into_payload();
        assert_eq!(resp.dominant_tone().map(|t| t.tone_id.as_str()), Some("analytical"));
        assert_eq!(resp.sentences_tone.len(), 1);

        let sent = &mock.requests()[0];
        assert_eq!(sent.request.query.get("sentences"), Some("true"));
        assert_eq!(sent.request.query.get("tones"), Some("emotion,language"));
        assert_eq!(
            sent.request.json_body(),
            Some(&json!({ "text": "Team, I know that times are tough!" }))
        );
    }

    #[test]
    fn test_tone_requires_text() {
        let (_, client) = mock_client(URL);
        let ta = ToneAnalyzer::with_client(client);
        assert!(ta.build_tone("", false, &[]).unwrap_err().is_invalid_argument());
    }
}
