//! Conversation (dialog) service.

use std::sync::Arc;

use cogsdk_rest::{Credentials, RequestBuilder, RequestDescriptor, Response, RestClient, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default service URL.
pub const DEFAULT_URL: &str = "https://gateway.watsonplatform.net/conversation/api";

/// Default API version date.
pub const DEFAULT_VERSION: &str = "2017-05-26";

/// Conversation service.
pub struct Conversation {
    client: Arc<RestClient>,
    version: String,
}

impl Conversation {
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

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn build_message(&self, workspace_id: &str, request: &MessageRequest) -> Result<RequestDescriptor> {
        let req = RequestBuilder::post("/v1/workspaces/{workspace_id}/message")
            .param("workspace_id", workspace_id)
            .query("version", &self.version)
            .json(request)
            .build()?;
        self.client.authorize(req)
    }

    /// Sends user input to a workspace and returns the dialog reply.
    ///
    /// Pass the returned `context` back in the next request to continue the
    /// same conversation.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let first = conv.message(workspace, &MessageRequest::text("hi")).await?.into_payload();
    /// let next = MessageRequest::text("what can you do?").with_context(first.context);
    /// let reply = conv.message(workspace, &next).await?;
    /// println!("{}", reply.payload.output.text.join(" "));
    /// ```
    pub async fn message(&self, workspace_id: &str, request: &MessageRequest) -> Result<Response<MessageResponse>> {
        let req = self.build_message(workspace_id, request)?;
        self.client.send_json(req).await
    }
}

// ==================== Request/Response Types ====================

/// User input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputData {
    pub text: String,
}

/// Message request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<InputData>,
    /// Dialog state returned by the previous response.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub alternate_intents: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intents: Option<Vec<RuntimeIntent>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<RuntimeEntity>>,
}

impl MessageRequest {
    /// Creates a request carrying only user text.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            input: Some(InputData { text: text.into() }),
            ..Default::default()
        }
    }

    /// Continues the conversation described by `context`.
    pub fn with_context(mut self, context: Value) -> Self {
        if !context.is_null() {
            self.context = Some(context);
        }
        self
    }
}

/// An intent recognized in the user input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeIntent {
    pub intent: String,
    #[serde(default)]
    pub confidence: f64,
}

/// An entity recognized in the user input.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeEntity {
    pub entity: String,
    /// Start and end character offsets in the input.
    #[serde(default)]
    pub location: Vec<u32>,
    #[serde(default)]
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Dialog output.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputData {
    #[serde(default)]
    pub text: Vec<String>,
    #[serde(default)]
    pub nodes_visited: Vec<String>,
    #[serde(default)]
    pub log_messages: Vec<Value>,
}

/// Message response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<InputData>,
    #[serde(default)]
    pub intents: Vec<RuntimeIntent>,
    #[serde(default)]
    pub entities: Vec<RuntimeEntity>,
    #[serde(default)]
    pub output: OutputData,
    #[serde(default)]
    pub context: Value,
}

impl MessageResponse {
    /// Returns the intent with the highest confidence.
    pub fn top_intent(&self) -> Option<&RuntimeIntent> {
        self.intents
            .iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::mock_client;
    use serde_json::json;

    const URL: &str = "https://api.example.com/conversation/api";

    #[tokio::test]
    async fn test_message_round() {
        let (mock, client) = mock_client(URL);
        let conv = Conversation::with_client(client).with_version("2018-02-16");
        mock.push_json(
            200,
            json!({
                "input": { "text": "turn on the lights" },
                "intents": [
                    { "intent": "greeting", "confidence": 0.12 },
                    { "intent": "turn_on", "confidence": 0.94 }
                ],
                "entities": [
                    { "entity": "appliance", "location": [12, 18], "value": "lights", "confidence": 1 }
                ],
                "output": { "text": ["OK, turning on the lights."], "nodes_visited": ["node_1"] },
                "context": { "conversation_id": "c-1", "system": { "dialog_turn_counter": 1 } }
            }),
        );

        let resp = conv
            .message("ws-1", &MessageRequest::text("turn on the lights"))
            .await
            .unwrap()
            .into_payload();
        assert_eq!(resp.top_intent().map(|i| i.intent.as_str()), Some("turn_on"));
        assert_eq!(resp.entities[0].location, vec![12, 18]);
        assert_eq!(resp.output.text, vec!["OK, turning on the lights."]);

        let sent = &mock.requests()[0];
        assert_eq!(sent.request.path(), "/v1/workspaces/ws-1/message");
        assert_eq!(sent.request.query.get("version"), Some("2018-02-16"));
        assert_eq!(
            sent.request.json_body(),
            Some(&json!({ "input": { "text": "turn on the lights" } }))
        );

        let next = MessageRequest::text("thanks").with_context(resp.context.clone());
        let body = serde_json::to_value(&next).unwrap();
        assert_eq!(body["context"]["conversation_id"], "c-1");
    }

    #[test]
    fn test_message_requires_workspace() {
        let (_, client) = mock_client(URL);
        let conv = Conversation::with_client(client);
        let err = conv.build_message("", &MessageRequest::text("hi")).unwrap_err();
        assert!(err.is_invalid_argument());
    }
}
