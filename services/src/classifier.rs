//! Natural language classifier service.

use std::sync::Arc;

use cogsdk_rest::{Credentials, RequestBuilder, RequestDescriptor, Response, RestClient, Result};
use serde::{Deserialize, Serialize};

/// Default service URL.
pub const DEFAULT_URL: &str = "https://gateway.watsonplatform.net/natural-language-classifier/api";

/// Natural language classifier service.
pub struct NaturalLanguageClassifier {
    client: Arc<RestClient>,
}

impl NaturalLanguageClassifier {
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

    /// Builds the classify request.
    pub fn build_classify(&self, classifier_id: &str, text: &str) -> Result<RequestDescriptor> {
        #[derive(Serialize)]
        struct Request<'a> {
            text: &'a str,
        }

        let req = RequestBuilder::post("/v1/classifiers/{classifier_id}/classify")
            .param("classifier_id", classifier_id)
            .require("text", text)
            .json(&Request { text })
            .build()?;
        self.client.authorize(req)
    }

    /// Returns the class with the highest confidence for `text`.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let resp = nlc.classify("10D41B-nlc-1", "How hot will it be today?").await?;
    ///
    /// for class in &resp.payload.classes {
    ///     println!("{}: {:.3}", class.class_name, class.confidence);
    /// }
    /// ```
    pub async fn classify(&self, classifier_id: &str, text: &str) -> Result<Response<Classification>> {
        let req = self.build_classify(classifier_id, text)?;
        self.client.send_json(req).await
    }

    pub fn build_list_classifiers(&self) -> Result<RequestDescriptor> {
        self.client.authorize(RequestBuilder::get("/v1/classifiers").build()?)
    }

    /// Lists the classifiers of this service instance.
    pub async fn list_classifiers(&self) -> Result<Response<ClassifierList>> {
        let req = self.build_list_classifiers()?;
        self.client.send_json(req).await
    }

    pub fn build_get_classifier(&self, classifier_id: &str) -> Result<RequestDescriptor> {
        let req = RequestBuilder::get("/v1/classifiers/{classifier_id}")
            .param("classifier_id", classifier_id)
            .build()?;
        self.client.authorize(req)
    }

    /// Returns the status and details of a classifier.
    pub async fn get_classifier(&self, classifier_id: &str) -> Result<Response<Classifier>> {
        let req = self.build_get_classifier(classifier_id)?;
        self.client.send_json(req).await
    }

    pub fn build_delete_classifier(&self, classifier_id: &str) -> Result<RequestDescriptor> {
        let req = RequestBuilder::delete("/v1/classifiers/{classifier_id}")
            .param("classifier_id", classifier_id)
            .build()?;
        self.client.authorize(req)
    }

    /// Deletes a classifier.
    pub async fn delete_classifier(&self, classifier_id: &str) -> Result<Response<()>> {
        let req = self.build_delete_classifier(classifier_id)?;
        self.client.send_empty(req).await
    }
}

// ==================== Request/Response Types ====================

/// Training state of a classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ClassifierStatus {
    #[serde(rename = "Non Existent")]
    NonExistent,
    Training,
    Failed,
    Available,
    Unavailable,
    #[default]
    #[serde(other)]
    Unknown,
}

impl ClassifierStatus {
    /// Returns true if the classifier can serve classify calls.
    pub fn is_available(&self) -> bool {
        matches!(self, ClassifierStatus::Available)
    }
}

/// Classification result for a single text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Classification {
    #[serde(default)]
    pub classifier_id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub text: String,
    pub top_class: String,
    /// Classes ordered by descending confidence.
    #[serde(default)]
    pub classes: Vec<ClassifiedClass>,
}

/// A class and its confidence score.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifiedClass {
    pub class_name: String,
    #[serde(default)]
    pub confidence: f64,
}

/// Classifier details.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Classifier {
    pub classifier_id: String,
    #[serde(default)]
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default)]
    pub status: ClassifierStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_description: Option<String>,
}

/// List of classifiers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClassifierList {
    #[serde(default)]
    pub classifiers: Vec<Classifier>,
}
