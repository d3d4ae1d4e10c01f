//! Discovery (document search) service.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use cogsdk_rest::{Credentials, Part, RequestBuilder, RequestDescriptor, Response, RestClient, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::capability::CollectionOperations;

/// Default service URL.
pub const DEFAULT_URL: &str = "https://gateway.watsonplatform.net/discovery/api";

/// Default API version date.
pub const DEFAULT_VERSION: &str = "2017-11-07";

/// Discovery service.
pub struct Discovery {
    client: Arc<RestClient>,
    version: String,
}

impl Discovery {
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

    pub fn build_list_environments(&self) -> Result<RequestDescriptor> {
        let req = RequestBuilder::get("/v1/environments")
            .query("version", &self.version)
            .build()?;
        self.client.authorize(req)
    }

    /// Lists the environments of this service instance.
    pub async fn list_environments(&self) -> Result<Response<Environments>> {
        let req = self.build_list_environments()?;
        self.client.send_json(req).await
    }

    pub fn build_list_collections(&self, environment_id: &str) -> Result<RequestDescriptor> {
        let req = RequestBuilder::get("/v1/environments/{environment_id}/collections")
            .param("environment_id", environment_id)
            .query("version", &self.version)
            .build()?;
        self.client.authorize(req)
    }

    pub fn build_create_collection(
        &self,
        environment_id: &str,
        request: &CreateCollection,
    ) -> Result<RequestDescriptor> {
        let req = RequestBuilder::post("/v1/environments/{environment_id}/collections")
            .param("environment_id", environment_id)
            .require("name", &request.name)
            .query("version", &self.version)
            .json(request)
            .build()?;
        self.client.authorize(req)
    }

    pub fn build_get_collection(&self, environment_id: &str, collection_id: &str) -> Result<RequestDescriptor> {
        let req = RequestBuilder::get("/v1/environments/{environment_id}/collections/{collection_id}")
            .param("environment_id", environment_id)
            .param("collection_id", collection_id)
            .query("version", &self.version)
            .build()?;
        self.client.authorize(req)
    }

    pub fn build_delete_collection(&self, environment_id: &str, collection_id: &str) -> Result<RequestDescriptor> {
        let req = RequestBuilder::delete("/v1/environments/{environment_id}/collections/{collection_id}")
            .param("environment_id", environment_id)
            .param("collection_id", collection_id)
            .query("version", &self.version)
            .build()?;
        self.client.authorize(req)
    }

    pub fn build_query(
        &self,
        environment_id: &str,
        collection_id: &str,
        options: &QueryOptions,
    ) -> Result<RequestDescriptor> {
        let req = RequestBuilder::get("/v1/environments/{environment_id}/collections/{collection_id}/query")
            .param("environment_id", environment_id)
            .param("collection_id", collection_id)
            .query("version", &self.version)
            .query_opt("filter", options.filter.as_deref())
            .query_opt("query", options.query.as_deref())
            .query_opt("natural_language_query", options.natural_language_query.as_deref())
            .query_opt("aggregation", options.aggregation.as_deref())
            .query_opt("count", options.count)
            .query_opt("offset", options.offset)
            .query_list("return", &options.return_fields)
            .query_list("sort", &options.sort)
            .query_opt("highlight", options.highlight.then_some(true))
            .build()?;
        self.client.authorize(req)
    }

    /// Searches a collection.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let options = QueryOptions {
    ///     natural_language_query: Some("who won the game".into()),
    ///     count: Some(5),
    ///     ..Default::default()
    /// };
    /// let resp = discovery.query(env, collection, &options).await?;
    /// println!("{} matching results", resp.payload.matching_results);
    /// ```
    pub async fn query(
        &self,
        environment_id: &str,
        collection_id: &str,
        options: &QueryOptions,
    ) -> Result<Response<QueryResponse>> {
        let req = self.build_query(environment_id, collection_id, options)?;
        self.client.send_json(req).await
    }

    /// Builds a multipart document upload.
    pub fn build_add_document(
        &self,
        environment_id: &str,
        collection_id: &str,
        data: impl Into<Bytes>,
        filename: &str,
        content_type: &str,
        metadata: Option<&Value>,
    ) -> Result<RequestDescriptor> {
        let data = data.into();
        let mut builder =
            RequestBuilder::post("/v1/environments/{environment_id}/collections/{collection_id}/documents")
                .param("environment_id", environment_id)
                .param("collection_id", collection_id)
                .require_bytes("file", &data)
                .require("filename", filename)
                .require("content_type", content_type)
                .query("version", &self.version)
                .part(Part::file("file", filename, content_type, data));
        if let Some(metadata) = metadata {
            builder = builder.part(Part::text("metadata", metadata.to_string()));
        }
        self.client.authorize(builder.build()?)
    }

    /// Uploads a document for ingestion into a collection.
    pub async fn add_document(
        &self,
        environment_id: &str,
        collection_id: &str,
        data: impl Into<Bytes>,
        filename: &str,
        content_type: &str,
        metadata: Option<&Value>,
    ) -> Result<Response<DocumentAccepted>> {
        let req = self.build_add_document(environment_id, collection_id, data, filename, content_type, metadata)?;
        self.client.send_json(req).await
    }
}

#[async_trait]
impl CollectionOperations for Discovery {
    async fn list_collections(&self, environment_id: &str) -> Result<Response<Collections>> {
        let req = self.build_list_collections(environment_id)?;
        self.client.send_json(req).await
    }

    async fn create_collection(
        &self,
        environment_id: &str,
        request: &CreateCollection,
    ) -> Result<Response<Collection>> {
        let req = self.build_create_collection(environment_id, request)?;
        self.client.send_json(req).await
    }

    async fn get_collection(
        &self,
        environment_id: &str,
        collection_id: &str,
    ) -> Result<Response<Collection>> {
        let req = self.build_get_collection(environment_id, collection_id)?;
        self.client.send_json(req).await
    }

    async fn delete_collection(&self, environment_id: &str, collection_id: &str) -> Result<Response<()>> {
        let req = self.build_delete_collection(environment_id, collection_id)?;
        self.client.send_empty(req).await
    }
}

// ==================== Request/Response Types ====================

/// Environment state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentStatus {
    Active,
    Pending,
    Maintenance,
    Resizing,
    #[default]
    #[serde(other)]
    Unknown,
}

/// A discovery environment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Environment {
    pub environment_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: EnvironmentStatus,
    /// True for the shared news environment.
    #[serde(default)]
    pub read_only: bool,
}

/// List of environments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Environments {
    #[serde(default)]
    pub environments: Vec<Environment>,
}

impl Environments {
    /// Returns the first environment that accepts writes.
    pub fn writable(&self) -> Option<&Environment> {
        self.environments.iter().find(|e| !e.read_only)
    }
}

/// Collection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionStatus {
    Active,
    Pending,
    Maintenance,
    #[default]
    #[serde(other)]
    Unknown,
}

impl CollectionStatus {
    /// Returns true if the collection accepts queries and documents.
    pub fn is_active(&self) -> bool {
        matches!(self, CollectionStatus::Active)
    }
}

/// Document counts of a collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentCounts {
    #[serde(default)]
    pub available: u64,
    #[serde(default)]
    pub processing: u64,
    #[serde(default)]
    pub failed: u64,
}

/// A document collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Collection {
    pub collection_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: CollectionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_id: Option<String>,
    #[serde(default)]
    pub language: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated: Option<String>,
    #[serde(default)]
    pub document_counts: DocumentCounts,
}

/// List of collections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Collections {
    #[serde(default)]
    pub collections: Vec<Collection>,
}

/// Request to create a collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateCollection {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub configuration_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Query parameters for [`Discovery::query`].
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub filter: Option<String>,
    pub query: Option<String>,
    pub natural_language_query: Option<String>,
    pub aggregation: Option<String>,
    pub count: Option<u32>,
    pub offset: Option<u32>,
    pub return_fields: Vec<String>,
    pub sort: Vec<String>,
    pub highlight: bool,
}

/// A single query hit. Document fields other than `id` are kept as JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
    #[serde(flatten)]
    pub fields: serde_json::Map<String, Value>,
}

/// Query response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub matching_results: u64,
    #[serde(default)]
    pub results: Vec<QueryResult>,
    #[serde(default)]
    pub aggregations: Vec<Value>,
}

/// Ingestion state of an uploaded document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Processing,
    Pending,
    Available,
    Failed,
    #[default]
    #[serde(other)]
    Unknown,
}

/// Response to a document upload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentAccepted {
    pub document_id: String,
    #[serde(default)]
    pub status: DocumentStatus,
    #[serde(default)]
    pub notices: Vec<Value>,
}
