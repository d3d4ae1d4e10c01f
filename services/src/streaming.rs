//! Streaming speech recognition over WebSocket.
//!
//! The session protocol: after the upgrade the client sends a `start`
//! action describing the audio, the service answers `{"state":"listening"}`,
//! audio flows as binary frames, and a `stop` action makes the service emit
//! the final results followed by another `listening` state.

use std::sync::Arc;

use bytes::Bytes;
use cogsdk_rest::{Error, RestClient, Result};
use futures::{SinkExt, StreamExt, stream::SplitSink, stream::SplitStream};
use http::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tokio::{
    net::TcpStream,
    sync::{mpsc, watch},
    task::JoinHandle,
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{Message, client::IntoClientRequest},
};
use tracing::{debug, error};
use url::Url;

use crate::speech_to_text::{DEFAULT_MODEL, RecognitionResults};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Default content type of streamed audio.
pub const DEFAULT_CONTENT_TYPE: &str = "audio/l16;rate=16000";

/// Options for a streaming recognition session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customization_id: Option<String>,
    pub content_type: String,
    /// Emit non-final hypotheses while the speaker is talking.
    pub interim_results: bool,
    /// Seconds of silence after which the service closes; -1 disables it.
    pub inactivity_timeout: i32,
    pub word_confidence: bool,
    pub timestamps: bool,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            model: None,
            customization_id: None,
            content_type: DEFAULT_CONTENT_TYPE.to_string(),
            interim_results: true,
            inactivity_timeout: 30,
            word_confidence: false,
            timestamps: false,
        }
    }
}

impl StreamOptions {
    fn start_message(&self) -> serde_json::Value {
        serde_json::json!({
            "action": "start",
            "content-type": self.content_type,
            "interim_results": self.interim_results,
            "inactivity_timeout": self.inactivity_timeout,
            "word_confidence": self.word_confidence,
            "timestamps": self.timestamps,
        })
    }
}

/// Session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Start sent, waiting for the service to listen.
    Connecting,
    /// The service accepts audio.
    Listening,
    /// Stop sent, waiting for the final results.
    Stopping,
    Closed,
}

/// Event received from the service.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    /// The service is ready for audio, or done with the previous utterance.
    Listening,
    /// Interim or final results.
    Results(RecognitionResults),
    /// The service reported an error. The session closes afterwards.
    Error(String),
}

/// Open streaming recognition session.
///
/// # Example
///
/// ```rust,ignore
/// let mut session = stt.recognize_stream(&StreamOptions::default()).await?;
/// session.send_audio(AudioChunker::to_l16(&window)).await?;
/// session.stop().await?;
/// while let Some(event) = session.recv().await {
///     if let StreamEvent::Results(r) = event {
///         println!("{}", r.transcript());
///     }
/// }
/// ```
pub struct RecognizeSession {
    state: Arc<watch::Sender<SessionState>>,
    event_rx: mpsc::Receiver<StreamEvent>,
    write_tx: mpsc::Sender<Message>,
    read_handle: JoinHandle<()>,
    _write_handle: JoinHandle<()>,
}

impl RecognizeSession {
    /// Connects to `{base}/v1/recognize` and sends the start action.
    ///
    /// The upgrade request carries the client's default headers and its
    /// `Authorization` header.
    pub async fn connect(client: &RestClient, options: &StreamOptions) -> Result<Self> {
        let credentials = client.credentials();
        let url = recognize_url(credentials.base_url(), options)?;
        debug!(%url, "connecting recognize session");

        let mut request = url
            .as_str()
            .into_client_request()
            .map_err(|e| Error::WebSocket(format!("failed to build request: {}", e)))?;
        let headers = request.headers_mut();
        for (name, value) in client.default_headers() {
            headers.insert(name.clone(), value.clone());
        }
        headers.insert(AUTHORIZATION, credentials.authorization()?);

        let (ws, _) = connect_async(request)
            .await
            .map_err(|e| Error::WebSocket(format!("failed to connect: {}", e)))?;
        let (write, read) = ws.split();

        let (event_tx, event_rx) = mpsc::channel(100);
        let (write_tx, write_rx) = mpsc::channel(100);
        let state = Arc::new(watch::Sender::new(SessionState::Connecting));

        let write_handle = tokio::spawn(write_loop(write, write_rx));
        let read_handle = tokio::spawn(read_loop(read, event_tx, state.clone()));

        let session = Self {
            state,
            event_rx,
            write_tx,
            read_handle,
            _write_handle: write_handle,
        };
        session.send_text(options.start_message()).await?;
        Ok(session)
    }

    /// Returns the current state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Waits until the service reports it is listening.
    pub async fn wait_listening(&self) -> Result<()> {
        let mut rx = self.state.subscribe();
        let state = rx
            .wait_for(|s| matches!(s, SessionState::Listening | SessionState::Closed))
            .await
            .map_err(|_| Error::SessionClosed)?;
        match *state {
            SessionState::Listening => Ok(()),
            _ => Err(Error::SessionClosed),
        }
    }

    /// Sends one binary audio frame.
    pub async fn send_audio(&self, audio: impl Into<Bytes>) -> Result<()> {
        if self.state() == SessionState::Closed {
            return Err(Error::SessionClosed);
        }
        self.write_tx
            .send(Message::Binary(audio.into()))
            .await
            .map_err(|_| Error::SessionClosed)
    }

    /// Ends the current utterance. Final results follow as events.
    pub async fn stop(&self) -> Result<()> {
        if self.state() == SessionState::Closed {
            return Err(Error::SessionClosed);
        }
        self.state.send_replace(SessionState::Stopping);
        self.send_text(serde_json::json!({ "action": "stop" })).await
    }

    /// Receives the next event, or `None` once the connection is gone.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.event_rx.recv().await
    }

    /// Closes the connection.
    pub async fn close(&self) -> Result<()> {
        let _ = self.write_tx.send(Message::Close(None)).await;
        self.state.send_replace(SessionState::Closed);
        Ok(())
    }

    async fn send_text(&self, value: serde_json::Value) -> Result<()> {
        let text = value.to_string();
        debug!(message = %text, "sending control message");
        self.write_tx
            .send(Message::Text(text.into()))
            .await
            .map_err(|_| Error::SessionClosed)
    }
}

impl Drop for RecognizeSession {
    fn drop(&mut self) {
        // The write loop ends once `write_tx` is dropped.
        self.read_handle.abort();
    }
}

/// Derives the WebSocket recognize URL from a service base URL.
pub fn recognize_url(base_url: &str, options: &StreamOptions) -> Result<Url> {
    let mut url = Url::parse(base_url)?;
    let scheme = match url.scheme() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        other => return Err(Error::Config(format!("unsupported url scheme: {}", other))),
    };
    url.set_scheme(scheme)
        .map_err(|_| Error::Config(format!("cannot use {} scheme for {}", scheme, base_url)))?;

    url.path_segments_mut()
        .map_err(|_| Error::Config(format!("base url cannot be a base: {}", base_url)))?
        .pop_if_empty()
        .extend(["v1", "recognize"]);
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("model", options.model.as_deref().unwrap_or(DEFAULT_MODEL));
        if let Some(id) = &options.customization_id {
            pairs.append_pair("customization_id", id);
        }
    }
    Ok(url)
}

async fn write_loop(mut write: SplitSink<WsStream, Message>, mut rx: mpsc::Receiver<Message>) {
    while let Some(msg) = rx.recv().await {
        if let Message::Close(_) = msg {
            let _ = write.close().await;
            break;
        }
        if let Err(e) = write.send(msg).await {
            error!("write error: {}", e);
            break;
        }
    }
}

async fn read_loop(
    mut read: SplitStream<WsStream>,
    tx: mpsc::Sender<StreamEvent>,
    state: Arc<watch::Sender<SessionState>>,
) {
    while let Some(result) = read.next().await {
        match result {
            Ok(Message::Text(text)) => {
                debug!(message = %text.as_str(), "received");
                let Some(event) = parse_event(text.as_str()) else {
                    continue;
                };
                match &event {
                    StreamEvent::Listening => {
                        state.send_replace(SessionState::Listening);
                    }
                    StreamEvent::Error(_) => {
                        state.send_replace(SessionState::Closed);
                    }
                    StreamEvent::Results(_) => {}
                }
                if tx.send(event).await.is_err() {
                    break;
                }
            }
            Ok(Message::Close(frame)) => {
                debug!(?frame, "closed by server");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                error!("read error: {}", e);
                let _ = tx.send(StreamEvent::Error(e.to_string())).await;
                break;
            }
        }
    }
    state.send_replace(SessionState::Closed);
}

fn parse_event(text: &str) -> Option<StreamEvent> {
    let raw: serde_json::Value = match serde_json::from_str(text) {
        Ok(v) => v,
        Err(e) => {
            debug!(message = %text, error = %e, "skipping malformed message");
            return None;
        }
    };

    if let Some(err) = raw.get("error").and_then(|v| v.as_str()) {
        return Some(StreamEvent::Error(err.to_string()));
    }
    if raw.get("results").is_some() {
        return match serde_json::from_value(raw) {
            Ok(results) => Some(StreamEvent::Results(results)),
            Err(e) => {
                debug!(message = %text, error = %e, "skipping malformed results");
                None
            }
        };
    }
    if raw.get("state").and_then(|v| v.as_str()) == Some("listening") {
        return Some(StreamEvent::Listening);
    }
    debug!(message = %text, "ignoring message");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognize_url() {
        let opts = StreamOptions::default();
        let url = recognize_url("https://stream.example.com/speech-to-text/api", &opts).unwrap();
        assert_eq!(
            url.as_str(),
            "wss://stream.example.com/speech-to-text/api/v1/recognize?model=en-US_BroadbandModel"
        );

        let opts = StreamOptions {
            model: Some("en-US_NarrowbandModel".into()),
            customization_id: Some("cust 1".into()),
            ..Default::default()
        };
        let url = recognize_url("http://127.0.0.1:9000/api/", &opts).unwrap();
        assert_eq!(
            url.as_str(),
            "ws://127.0.0.1:9000/api/v1/recognize?model=en-US_NarrowbandModel&customization_id=cust+1"
        );
    }

    #[test]
    fn test_start_message() {
        let msg = StreamOptions::default().start_message();
        assert_eq!(msg["action"], "start");
        assert_eq!(msg["content-type"], DEFAULT_CONTENT_TYPE);
        assert_eq!(msg["interim_results"], true);
        assert_eq!(msg["inactivity_timeout"], 30);
    }

    #[test]
    fn test_parse_event() {
        assert!(matches!(parse_event(r#"{"state":"listening"}"#), Some(StreamEvent::Listening)));
        assert!(matches!(
            parse_event(r#"{"error":"Session timed out."}"#),
            Some(StreamEvent::Error(e)) if e == "Session timed out."
        ));
        match parse_event(r#"{"result_index":0,"results":[{"final":true,"alternatives":[{"transcript":"hi "}]}]}"#) {
            Some(StreamEvent::Results(r)) => assert_eq!(r.transcript(), "hi"),
            other => panic!("unexpected event: {other:?}"),
        }
        assert!(parse_event(r#"{"state":"thinking"}"#).is_none());
        assert!(parse_event("not json").is_none());
        assert!(parse_event(r#"{"results":"oops"}"#).is_none());
    }
}
