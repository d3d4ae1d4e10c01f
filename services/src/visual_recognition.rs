//! Visual recognition service.

use std::sync::Arc;

use bytes::Bytes;
use cogsdk_rest::{Credentials, Part, RequestBuilder, RequestDescriptor, Response, RestClient, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default service URL.
pub const DEFAULT_URL: &str = "https://gateway-a.watsonplatform.net/visual-recognition/api";

/// Default API version date.
pub const DEFAULT_VERSION: &str = "2018-03-19";

/// Visual recognition service.
pub struct VisualRecognition {
    client: Arc<RestClient>,
    version: String,
}

impl VisualRecognition {
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

    /// Builds a multipart classify request for one image or a zip of images.
    pub fn build_classify(
        &self,
        image: impl Into<Bytes>,
        filename: &str,
        options: &ClassifyOptions,
    ) -> Result<RequestDescriptor> {
        let image = image.into();
        let mut builder = RequestBuilder::post("/v3/classify")
            .require_bytes("images_file", &image)
            .require("filename", filename)
            .query("version", &self.version)
            .part(Part::file("images_file", filename, guess_content_type(filename), image));

        if !options.classifier_ids.is_empty() {
            builder = builder.part(Part::text("classifier_ids", options.classifier_ids.join(",")));
        }
        if !options.owners.is_empty() {
            builder = builder.part(Part::text("owners", options.owners.join(",")));
        }
        if let Some(threshold) = options.threshold {
            builder = builder.part(Part::text("threshold", threshold.to_string()));
        }
        if let Some(lang) = &options.accept_language {
            builder = builder.header("accept-language", lang);
        }
        self.client.authorize(builder.build()?)
    }

    /// Classifies an image.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let image = std::fs::read("fruitbowl.jpg")?;
    /// let resp = vr.classify(image, "fruitbowl.jpg", &ClassifyOptions::default()).await?;
    /// for class in resp.payload.classes() {
    ///     println!("{}: {:.2}", class.class_name, class.score);
    /// }
    /// ```
    pub async fn classify(
        &self,
        image: impl Into<Bytes>,
        filename: &str,
        options: &ClassifyOptions,
    ) -> Result<Response<ClassifiedImages>> {
        let req = self.build_classify(image, filename, options)?;
        self.client.send_json(req).await
    }
}

fn guess_content_type(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "tif" | "tiff" => "image/tiff",
        "zip" => "application/zip",
        _ => "application/octet-stream",
    }
}

// ==================== Request/Response Types ====================

/// Options for [`VisualRecognition::classify`].
#[derive(Debug, Clone, Default)]
pub struct ClassifyOptions {
    /// Classifiers to apply. Empty uses the `default` classifier.
    pub classifier_ids: Vec<String>,
    /// `IBM`, `me`, or both.
    pub owners: Vec<String>,
    /// Minimum score a class needs to be returned.
    pub threshold: Option<f32>,
    /// Language of the returned class names.
    pub accept_language: Option<String>,
}

/// A class assigned to an image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassResult {
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_hierarchy: Option<String>,
}

/// Results of one classifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierResult {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub classifier_id: String,
    #[serde(default)]
    pub classes: Vec<ClassResult>,
}

/// Classification of a single image.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifiedImage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    #[serde(default)]
    pub classifiers: Vec<ClassifierResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

/// Classify response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifiedImages {
    #[serde(default)]
    pub images_processed: u32,
    #[serde(default)]
    pub images: Vec<ClassifiedImage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<Value>,
}

impl ClassifiedImages {
    /// Returns every class of every image, highest score first.
    pub fn classes(&self) -> Vec<&ClassResult> {
        let mut classes: Vec<_> = self
            .images
            .iter()
            .flat_map(|i| &i.classifiers)
            .flat_map(|c| &c.classes)
            .collect();
        classes.sort_by(|a, b| b.score.total_cmp(&a.score));
        classes
    }
}
