//! Service wrappers over the real HTTP transport against a local mock service.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
    routing::post,
};
use cogsdk_services::{
    AudioFormat, ClassifyOptions, Credentials, NaturalLanguageClassifier, RecognizeOptions,
    RestClient, SpeechToText, TextToSpeech, VisualRecognition, dispatch,
    text_to_speech::DEFAULT_VOICE,
};
use serde_json::{Value, json};
use tokio::sync::mpsc;

fn header_str<'a>(headers: &'a HeaderMap, name: header::HeaderName) -> &'a str {
    headers.get(name).and_then(|v| v.to_str().ok()).unwrap_or("")
}

async fn classify(Path(id): Path<String>, Json(body): Json<Value>) -> Json<Value> {
    let text = body["text"].as_str().unwrap_or_default().to_string();
    let top = if text == "hello" { "greeting" } else { "weather" };
    Json(json!({
        "classifier_id": id,
        "text": text,
        "top_class": top,
        "classes": [{ "class_name": top, "confidence": 0.9 }]
    }))
}

async fn recognize(
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    if header_str(&headers, header::CONTENT_TYPE) != "audio/wav" {
        return (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Json(json!({ "code": 415, "error": "Unsupported content type" })),
        );
    }
    let model = query.get("model").cloned().unwrap_or_default();
    (
        StatusCode::OK,
        Json(json!({
            "result_index": 0,
            "results": [{
                "final": true,
                "alternatives": [{ "transcript": format!("{} bytes with {} ", body.len(), model) }]
            }]
        })),
    )
}

async fn synthesize(headers: HeaderMap, Json(body): Json<Value>) -> impl IntoResponse {
    let accept = header_str(&headers, header::ACCEPT).to_string();
    let text = body["text"].as_str().unwrap_or_default().to_string();
    ([(header::CONTENT_TYPE, accept)], format!("AUDIO:{}", text))
}

async fn classify_image(headers: HeaderMap, body: Bytes) -> (StatusCode, Json<Value>) {
    let content_type = header_str(&headers, header::CONTENT_TYPE);
    let raw = String::from_utf8_lossy(&body);
    if !content_type.starts_with("multipart/form-data")
        || !raw.contains("name=\"images_file\"")
        || !raw.contains("filename=\"fruitbowl.jpg\"")
        || !raw.contains("name=\"classifier_ids\"")
    {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "code": 400, "error": "missing images_file" })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "images_processed": 1,
            "images": [{
                "image": "fruitbowl.jpg",
                "classifiers": [{
                    "name": "default",
                    "classifier_id": "default",
                    "classes": [
                        { "class": "banana", "score": 0.562 },
                        { "class": "fruit", "score": 0.788 }
                    ]
                }]
            }]
        })),
    )
}

async fn start_server() -> SocketAddr {
    let app = Router::new()
        .route("/api/v1/classifiers/{id}/classify", post(classify))
        .route("/api/v1/recognize", post(recognize))
        .route("/api/v1/synthesize", post(synthesize))
        .route("/api/v3/classify", post(classify_image));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr) -> Arc<RestClient> {
    let creds = Credentials::api_key(format!("http://{addr}/api"), "abc123").unwrap();
    Arc::new(RestClient::new(creds).unwrap())
}

#[tokio::test]
async fn recognize_sends_raw_audio() {
    let addr = start_server().await;
    let stt = SpeechToText::with_client(client(addr));

    let options = RecognizeOptions {
        model: Some("en-US_NarrowbandModel".into()),
        ..Default::default()
    };
    let resp = stt.recognize(vec![0u8; 1024], "audio/wav", &options).await.unwrap();
    assert_eq!(resp.payload.transcript(), "1024 bytes with en-US_NarrowbandModel");

    let err = stt
        .recognize(vec![0u8; 16], "audio/flac", &options)
        .await
        .unwrap_err();
    assert!(matches!(err, cogsdk_services::Error::Service { status: 415, .. }));
    assert_eq!(err.status(), Some(415));
}

#[tokio::test]
async fn synthesize_returns_audio_bytes() {
    let addr = start_server().await;
    let tts = TextToSpeech::with_client(client(addr));

    let resp = tts.synthesize("Hello", DEFAULT_VOICE, AudioFormat::Wav).await.unwrap();
    assert_eq!(resp.payload.as_ref(), b"AUDIO:Hello");
    assert_eq!(
        resp.headers.get(header::CONTENT_TYPE).unwrap(),
        "audio/wav"
    );
}

#[tokio::test]
async fn visual_classify_uploads_multipart() {
    let addr = start_server().await;
    let vr = VisualRecognition::with_client(client(addr));

    let options = ClassifyOptions {
        classifier_ids: vec!["default".into()],
        ..Default::default()
    };
    let resp = vr
        .classify(b"\xff\xd8\xff\xe0 fake jpeg".to_vec(), "fruitbowl.jpg", &options)
        .await
        .unwrap();
    let classes: Vec<_> = resp.payload.classes().iter().map(|c| c.class_name.clone()).collect();
    assert_eq!(classes, vec!["fruit", "banana"]);
}

#[tokio::test]
async fn dispatched_calls_complete_independently() {
    let addr = start_server().await;
    let nlc = Arc::new(NaturalLanguageClassifier::with_client(client(addr)));
    let (tx, mut rx) = mpsc::unbounded_channel();

    let mut handles = Vec::new();
    for text in ["hello", "is it hot outside"] {
        let nlc = nlc.clone();
        let ok_tx = tx.clone();
        let err_tx = tx.clone();
        handles.push(dispatch(
            async move { nlc.classify("10D41B-nlc-1", text).await },
            move |resp| {
                let _ = ok_tx.send(Ok(resp.payload.top_class));
            },
            move |err| {
                let _ = err_tx.send(Err(err.to_string()));
            },
        ));
    }
    drop(tx);
    for handle in handles {
        handle.await.unwrap();
    }

    let mut seen = Vec::new();
    while let Some(result) = rx.recv().await {
        seen.push(result.unwrap());
    }
    seen.sort();
    assert_eq!(seen, vec!["greeting", "weather"]);
}
