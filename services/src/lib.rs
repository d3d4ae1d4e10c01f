//! Cloud AI service clients for Rust.
//!
//! Each service wrapper holds a shared [`RestClient`] and exposes one
//! `async` method per endpoint. Every method has a `build_*` twin that
//! returns the authorized [`RequestDescriptor`](cogsdk_rest::RequestDescriptor)
//! without sending it.
//!
//! Resource endpoints that several services share a shape for are grouped
//! behind capability traits: [`CollectionOperations`] and
//! [`CustomizationOperations`].
//!
//! # Example
//!
//! ```rust,ignore
//! use cogsdk_services::{Credentials, NaturalLanguageClassifier};
//!
//! let creds = Credentials::api_key(cogsdk_services::classifier::DEFAULT_URL, "your-api-key")?;
//! let nlc = NaturalLanguageClassifier::new(creds)?;
//!
//! let resp = nlc.classify("10D41B-nlc-1", "How hot will it be today?").await?;
//! println!("top class: {}", resp.payload.top_class);
//! ```

pub mod audio;
mod capability;
pub mod classifier;
pub mod conversation;
pub mod discovery;
pub mod language_translator;
pub mod speech_to_text;
pub mod streaming;
pub mod text_to_speech;
pub mod tone_analyzer;
pub mod visual_recognition;

pub use audio::AudioChunker;
pub use capability::{CollectionOperations, CustomizationOperations};
pub use classifier::{
    ClassifiedClass, Classification, Classifier, ClassifierList, ClassifierStatus,
    NaturalLanguageClassifier,
};
pub use conversation::{Conversation, MessageRequest, MessageResponse};
pub use discovery::{
    Collection, CollectionStatus, Collections, CreateCollection, Discovery, DocumentAccepted,
    DocumentStatus, Environment, EnvironmentStatus, Environments, QueryOptions, QueryResponse,
    QueryResult,
};
pub use language_translator::{
    IdentifiableLanguages, IdentifiedLanguages, LanguageTranslator, TranslateRequest,
    TranslationResult,
};
pub use speech_to_text::{
    CreateLanguageModel, CustomizationId, CustomizationStatus, LanguageModel, LanguageModels,
    RecognitionResults, RecognizeOptions, SpeechModel, SpeechModels, SpeechToText,
};
pub use streaming::{RecognizeSession, SessionState, StreamEvent, StreamOptions};
pub use text_to_speech::{AudioFormat, PhonemeFormat, Pronunciation, TextToSpeech, Voice, Voices};
pub use tone_analyzer::{ToneAnalysis, ToneAnalyzer, ToneCategory};
pub use visual_recognition::{ClassResult, ClassifiedImages, ClassifyOptions, VisualRecognition};

pub use cogsdk_rest::{Credentials, Error, Response, RestClient, Result, dispatch};
