//! Streaming recognition against a local WebSocket service.

use std::time::Duration;

use cogsdk_services::{
    AudioChunker, Credentials, RecognizeSession, RestClient, SessionState, StreamEvent,
    StreamOptions,
};
use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::{
    WebSocketStream, accept_hdr_async,
    tungstenite::{
        Message,
        handshake::server::{ErrorResponse, Request, Response},
    },
};

async fn next_text(ws: &mut WebSocketStream<TcpStream>) -> Value {
    loop {
        if let Message::Text(text) = ws.next().await.unwrap().unwrap() {
            return serde_json::from_str(text.as_str()).unwrap();
        }
    }
}

async fn send_json(ws: &mut WebSocketStream<TcpStream>, value: Value) {
    ws.send(Message::Text(value.to_string().into())).await.unwrap();
}

fn client(addr: std::net::SocketAddr) -> RestClient {
    let creds = Credentials::api_key(format!("http://{addr}/speech-to-text/api"), "abc123").unwrap();
    RestClient::builder(creds).learning_opt_out(true).build().unwrap()
}

struct Upgrade {
    uri: String,
    auth: String,
    opt_out: String,
}

async fn accept(listener: &TcpListener) -> (WebSocketStream<TcpStream>, Upgrade) {
    let (stream, _) = listener.accept().await.unwrap();
    let mut upgrade = Upgrade {
        uri: String::new(),
        auth: String::new(),
        opt_out: String::new(),
    };
    let header = |req: &Request, name: &str| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string()
    };
    let ws = accept_hdr_async(
        stream,
        |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            upgrade.uri = req.uri().to_string();
            upgrade.auth = header(req, "authorization");
            upgrade.opt_out = header(req, "x-watson-learning-opt-out");
            Ok(resp)
        },
    )
    .await
    .unwrap();
    (ws, upgrade)
}

struct Seen {
    upgrade: Upgrade,
    start: Value,
    audio_bytes: usize,
}

async fn serve_once(listener: TcpListener) -> Seen {
    let (mut ws, upgrade) = accept(&listener).await;

    let start = next_text(&mut ws).await;
    send_json(&mut ws, json!({ "state": "listening" })).await;

    let mut audio_bytes = 0;
    loop {
        match ws.next().await.unwrap().unwrap() {
            Message::Binary(data) => audio_bytes += data.len(),
            Message::Text(text) => {
                let action: Value = serde_json::from_str(text.as_str()).unwrap();
                assert_eq!(action["action"], "stop");
                break;
            }
            _ => {}
        }
    }

    send_json(
        &mut ws,
        json!({
            "result_index": 0,
            "results": [{ "final": true, "alternatives": [{ "transcript": "hello world ", "confidence": 0.9 }] }]
        }),
    )
    .await;
    send_json(&mut ws, json!({ "state": "listening" })).await;

    while let Some(Ok(msg)) = ws.next().await {
        if msg.is_close() {
            break;
        }
    }

    Seen {
        upgrade,
        start,
        audio_bytes,
    }
}

#[tokio::test]
async fn recognize_session_round_trip() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(serve_once(listener));

    let options = StreamOptions {
        interim_results: false,
        ..Default::default()
    };
    let mut session = RecognizeSession::connect(&client(addr), &options).await.unwrap();
    session.wait_listening().await.unwrap();
    assert_eq!(session.state(), SessionState::Listening);

    let mut chunker = AudioChunker::new(16000, 1600).unwrap();
    chunker.push(&[100i16; 3200]);
    while let Some(window) = chunker.next_window() {
        session.send_audio(AudioChunker::to_l16(&window)).await.unwrap();
    }
    session.stop().await.unwrap();

    assert!(matches!(session.recv().await, Some(StreamEvent::Listening)));
    match session.recv().await {
        Some(StreamEvent::Results(results)) => {
            assert!(results.is_final());
            assert_eq!(results.transcript(), "hello world");
        }
        other => panic!("unexpected event: {other:?}"),
    }
    assert!(matches!(session.recv().await, Some(StreamEvent::Listening)));
    assert_eq!(session.state(), SessionState::Listening);

    session.close().await.unwrap();
    assert_eq!(session.state(), SessionState::Closed);
    assert!(session.send_audio(vec![0u8; 2]).await.unwrap_err().to_string().contains("closed"));

    let seen = server.await.unwrap();
    assert_eq!(
        seen.upgrade.uri,
        "/speech-to-text/api/v1/recognize?model=en-US_BroadbandModel"
    );
    assert_eq!(seen.upgrade.auth, "Basic YXBpa2V5OmFiYzEyMw==");
    assert_eq!(seen.upgrade.opt_out, "true");
    assert_eq!(seen.start["action"], "start");
    assert_eq!(seen.start["content-type"], "audio/l16;rate=16000");
    assert_eq!(seen.start["interim_results"], false);
    assert_eq!(seen.audio_bytes, 6400);
}

#[tokio::test]
async fn malformed_frames_keep_session_open() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (mut ws, _) = accept(&listener).await;
        next_text(&mut ws).await;
        send_json(&mut ws, json!({ "state": "listening" })).await;
        ws.send(Message::Text("not json".into())).await.unwrap();
        send_json(&mut ws, json!({ "results": "oops" })).await;

        let mut frames = 0;
        loop {
            match ws.next().await.unwrap().unwrap() {
                Message::Binary(_) => {
                    frames += 1;
                    send_json(
                        &mut ws,
                        json!({
                            "result_index": 0,
                            "results": [{ "final": true, "alternatives": [{ "transcript": "ok" }] }]
                        }),
                    )
                    .await;
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
        frames
    });

    let mut session = RecognizeSession::connect(&client(addr), &StreamOptions::default())
        .await
        .unwrap();
    session.wait_listening().await.unwrap();
    assert!(matches!(session.recv().await, Some(StreamEvent::Listening)));

    session.send_audio(vec![0u8; 320]).await.unwrap();
    match session.recv().await {
        Some(StreamEvent::Results(results)) => assert_eq!(results.transcript(), "ok"),
        other => panic!("unexpected event: {other:?}"),
    }
    assert_eq!(session.state(), SessionState::Listening);
    session.send_audio(vec![0u8; 320]).await.unwrap();
    assert!(matches!(session.recv().await, Some(StreamEvent::Results(_))));

    session.close().await.unwrap();
    assert_eq!(server.await.unwrap(), 2);
}

#[tokio::test]
async fn dropped_session_releases_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (mut ws, _) = accept(&listener).await;
        next_text(&mut ws).await;
        send_json(&mut ws, json!({ "state": "listening" })).await;
        while let Some(Ok(msg)) = ws.next().await {
            if msg.is_close() {
                break;
            }
        }
    });

    let session = RecognizeSession::connect(&client(addr), &StreamOptions::default())
        .await
        .unwrap();
    session.wait_listening().await.unwrap();
    drop(session);

    tokio::time::timeout(Duration::from_secs(5), server)
        .await
        .expect("server still connected after drop")
        .unwrap();
}
