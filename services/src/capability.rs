//! Per-resource capability traits.

use async_trait::async_trait;
use cogsdk_rest::{Response, Result};

use crate::{
    discovery::{Collection, Collections, CreateCollection},
    speech_to_text::{CreateLanguageModel, CustomizationId, LanguageModel, LanguageModels},
};

/// Document collection management inside an environment.
#[async_trait]
pub trait CollectionOperations: Send + Sync {
    /// Lists the collections of an environment.
    async fn list_collections(&self, environment_id: &str) -> Result<Response<Collections>>;

    /// Creates a collection.
    async fn create_collection(
        &self,
        environment_id: &str,
        request: &CreateCollection,
    ) -> Result<Response<Collection>>;

    /// Returns a collection.
    async fn get_collection(
        &self,
        environment_id: &str,
        collection_id: &str,
    ) -> Result<Response<Collection>>;

    /// Deletes a collection and its documents.
    async fn delete_collection(&self, environment_id: &str, collection_id: &str) -> Result<Response<()>>;
}

/// Custom language model management.
#[async_trait]
pub trait CustomizationOperations: Send + Sync {
    /// Lists custom models, optionally only those for `language`.
    async fn list_customizations(&self, language: Option<&str>) -> Result<Response<LanguageModels>>;

    /// Creates an empty custom model.
    async fn create_customization(
        &self,
        request: &CreateLanguageModel,
    ) -> Result<Response<CustomizationId>>;

    /// Returns a custom model.
    async fn get_customization(&self, customization_id: &str) -> Result<Response<LanguageModel>>;

    /// Starts training a custom model on its corpora and words.
    async fn train_customization(&self, customization_id: &str) -> Result<Response<()>>;

    /// Deletes a custom model.
    async fn delete_customization(&self, customization_id: &str) -> Result<Response<()>>;
}
