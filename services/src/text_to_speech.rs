//! Text to speech service.

use std::{fmt, sync::Arc};

use bytes::Bytes;
use cogsdk_rest::{Credentials, RequestBuilder, RequestDescriptor, Response, RestClient, Result};
use serde::{Deserialize, Serialize};

/// Default service URL.
pub const DEFAULT_URL: &str = "https://stream.watsonplatform.net/text-to-speech/api";

/// Default voice.
pub const DEFAULT_VOICE: &str = "en-US_MichaelVoice";

/// Output audio format for synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioFormat {
    #[default]
    Wav,
    OggOpus,
    OggVorbis,
    Flac,
    Mp3,
    /// Raw 16-bit little-endian PCM at the given sample rate.
    L16 { rate: u32 },
    /// 8kHz mu-law.
    Basic,
}

impl AudioFormat {
    /// Returns the MIME type sent in the `Accept` header.
    pub fn mime_type(&self) -> String {
        match self {
            AudioFormat::Wav => "audio/wav".to_string(),
            AudioFormat::OggOpus => "audio/ogg;codecs=opus".to_string(),
            AudioFormat::OggVorbis => "audio/ogg;codecs=vorbis".to_string(),
            AudioFormat::Flac => "audio/flac".to_string(),
            AudioFormat::Mp3 => "audio/mp3".to_string(),
            AudioFormat::L16 { rate } => format!("audio/l16;rate={}", rate),
            AudioFormat::Basic => "audio/basic".to_string(),
        }
    }

    /// Returns the usual file extension for this format.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::OggOpus | AudioFormat::OggVorbis => "ogg",
            AudioFormat::Flac => "flac",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::L16 { .. } => "pcm",
            AudioFormat::Basic => "au",
        }
    }

    /// Parses a short format name such as `mp3` or `l16`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "wav" => Some(AudioFormat::Wav),
            "ogg" | "opus" => Some(AudioFormat::OggOpus),
            "vorbis" => Some(AudioFormat::OggVorbis),
            "flac" => Some(AudioFormat::Flac),
            "mp3" => Some(AudioFormat::Mp3),
            "l16" | "pcm" => Some(AudioFormat::L16 { rate: 22050 }),
            "basic" | "mulaw" => Some(AudioFormat::Basic),
            _ => None,
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.mime_type())
    }
}

/// Phonetic alphabet for pronunciations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PhonemeFormat {
    #[default]
    Ipa,
    Ibm,
}

impl PhonemeFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            PhonemeFormat::Ipa => "ipa",
            PhonemeFormat::Ibm => "ibm",
        }
    }
}

/// Text to speech service.
pub struct TextToSpeech {
    client: Arc<RestClient>,
}

impl TextToSpeech {
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

    pub fn build_list_voices(&self) -> Result<RequestDescriptor> {
        self.client.authorize(RequestBuilder::get("/v1/voices").build()?)
    }

    /// Lists the available voices.
    pub async fn list_voices(&self) -> Result<Response<Voices>> {
        let req = self.build_list_voices()?;
        self.client.send_json(req).await
    }

    pub fn build_get_voice(&self, voice: &str) -> Result<RequestDescriptor> {
        let req = RequestBuilder::get("/v1/voices/{voice}")
            .param("voice", voice)
            .build()?;
        self.client.authorize(req)
    }

    /// Returns a single voice.
    pub async fn get_voice(&self, voice: &str) -> Result<Response<Voice>> {
        let req = self.build_get_voice(voice)?;
        self.client.send_json(req).await
    }

    /// Builds a synthesize request. The format travels in the `Accept` header.
    pub fn build_synthesize(&self, text: &str, voice: &str, format: AudioFormat) -> Result<RequestDescriptor> {
        #[derive(Serialize)]
        struct Request<'a> {
            text: &'a str,
        }

        let req = RequestBuilder::post("/v1/synthesize")
            .require("text", text)
            .require("voice", voice)
            .query("voice", voice)
            .accept(format.mime_type())
            .json(&Request { text })
            .build()?;
        self.client.authorize(req)
    }

    /// Synthesizes `text` and returns the encoded audio.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let resp = tts.synthesize("Hello world", DEFAULT_VOICE, AudioFormat::Mp3).await?;
    /// std::fs::write("hello.mp3", &resp.payload)?;
    /// ```
    pub async fn synthesize(&self, text: &str, voice: &str, format: AudioFormat) -> Result<Response<Bytes>> {
        let req = self.build_synthesize(text, voice, format)?;
        self.client.send_bytes(req).await
    }

    pub fn build_pronunciation(&self, text: &str, voice: &str, format: PhonemeFormat) -> Result<RequestDescriptor> {
        let req = RequestBuilder::get("/v1/pronunciation")
            .require("text", text)
            .query("text", text)
            .query_opt("voice", (!voice.is_empty()).then_some(voice))
            .query("format", format.as_str())
            .build()?;
        self.client.authorize(req)
    }

    /// Returns the phonetic pronunciation of a word. An empty `voice` uses
    /// the service default.
    pub async fn pronunciation(&self, text: &str, voice: &str, format: PhonemeFormat) -> Result<Response<Pronunciation>> {
        let req = self.build_pronunciation(text, voice, format)?;
        self.client.send_json(req).await
    }
}

// ==================== Request/Response Types ====================

/// A synthesis voice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub customizable: bool,
}

/// List of voices.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Voices {
    #[serde(default)]
    pub voices: Vec<Voice>,
}

/// Pronunciation of a word.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Pronunciation {
    pub pronunciation: String,
}
