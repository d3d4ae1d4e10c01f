//! End-to-end checks of the reqwest transport against a local mock service.
//!
//! The mock service runs on an ephemeral port and answers the way the
//! remote services do: JSON payloads, JSON error envelopes and the
//! occasional malformed body.

use std::net::SocketAddr;

use axum::{
    Json, Router,
    body::Bytes,
    extract::Path,
    http::{HeaderMap, StatusCode, header},
    routing::{get, post},
};
use cogsdk_rest::{Credentials, Error, RequestBuilder, Response, RestClient};
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
struct Classification {
    classifier_id: String,
    top_class: String,
}

async fn classify(
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    if !auth.starts_with("Basic ") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "code": 401, "error": "Unauthorized" })),
        );
    }

    let top = if body["text"] == "hello" { "greeting" } else { "other" };
    (
        StatusCode::OK,
        Json(json!({ "classifier_id": id, "text": body["text"], "top_class": top })),
    )
}

async fn echo(headers: HeaderMap, body: Bytes) -> Json<Value> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    Json(json!({ "content_type": content_type, "length": body.len() }))
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::OK, "{\"classifier_id\": ")
}

async fn missing() -> (StatusCode, HeaderMap, Json<Value>) {
    let mut headers = HeaderMap::new();
    headers.insert("x-global-transaction-id", "txn-42".parse().unwrap());
    (
        StatusCode::NOT_FOUND,
        headers,
        Json(json!({ "code": 404, "error": "Classifier not found" })),
    )
}

async fn start_server() -> SocketAddr {
    let app = Router::new()
        .route("/api/v1/classifiers/{id}/classify", post(classify))
        .route("/api/v1/echo", post(echo))
        .route("/api/v1/broken", get(broken))
        .route("/api/v1/missing", get(missing));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
    addr
}

fn client(addr: SocketAddr) -> RestClient {
    let creds = Credentials::api_key(format!("http://{addr}/api"), "abc123").unwrap();
    RestClient::new(creds).unwrap()
}

#[tokio::test]
async fn classify_round_trip() {
    let addr = start_server().await;
    let client = client(addr);

    let req = RequestBuilder::post("/v1/classifiers/{id}/classify")
        .param("id", "nlc-1")
        .json(&json!({ "text": "hello" }))
        .build()
        .unwrap();
    let resp: Response<Classification> = client.send_json(req).await.unwrap();

    assert_eq!(resp.status, 200);
    assert_eq!(resp.payload.classifier_id, "nlc-1");
    assert_eq!(resp.payload.top_class, "greeting");
    assert!(resp.raw_json().contains("\"top_class\""));
}

#[tokio::test]
async fn bytes_body_keeps_content_type() {
    let addr = start_server().await;
    let client = client(addr);

    let req = RequestBuilder::post("/v1/echo")
        .bytes("audio/l16; rate=16000", vec![0u8; 320])
        .build()
        .unwrap();
    let resp: Response<Value> = client.send_json(req).await.unwrap();

    assert_eq!(resp.payload["content_type"], "audio/l16; rate=16000");
    assert_eq!(resp.payload["length"], 320);
}

#[tokio::test]
async fn malformed_payload_is_deserialize_error() {
    let addr = start_server().await;
    let client = client(addr);

    let req = RequestBuilder::get("/v1/broken").build().unwrap();
    let err = client.send_json::<Classification>(req).await.unwrap_err();

    assert!(err.is_deserialize(), "unexpected error: {err:?}");
    assert!(!err.is_transport());
}

#[tokio::test]
async fn error_envelope_is_service_error() {
    let addr = start_server().await;
    let client = client(addr);

    let req = RequestBuilder::get("/v1/missing").build().unwrap();
    match client.send_json::<Classification>(req).await.unwrap_err() {
        Error::Service {
            status,
            message,
            transaction_id,
            ..
        } => {
            assert_eq!(status, 404);
            assert_eq!(message, "Classifier not found");
            assert_eq!(transaction_id, "txn-42");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn connection_refused_is_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let client = client(addr);

    let req = RequestBuilder::get("/v1/missing").build().unwrap();
    let err = client.send_json::<Classification>(req).await.unwrap_err();

    assert!(err.is_transport(), "unexpected error: {err:?}");
}
