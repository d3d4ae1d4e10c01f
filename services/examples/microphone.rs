//! Streaming recognition example.
//!
//! Streams a raw 16kHz mono PCM file in 100ms windows, the way a capture
//! callback would feed microphone audio.
//!
//! Run with:
//! ```bash
//! export STT_APIKEY="your-api-key"
//! cargo run -p cogsdk-services --example microphone -- speech.pcm
//! ```

use std::{env, time::Duration};

use cogsdk_services::{
    AudioChunker, Credentials, SpeechToText, StreamEvent, StreamOptions, speech_to_text,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let api_key = env::var("STT_APIKEY").expect("STT_APIKEY environment variable not set");
    let path = env::args().nth(1).expect("usage: microphone <file.pcm>");

    let stt = SpeechToText::new(Credentials::api_key(speech_to_text::DEFAULT_URL, api_key)?)?;
    let mut session = stt.recognize_stream(&StreamOptions::default()).await?;
    match session.recv().await {
        Some(StreamEvent::Listening) => {}
        other => return Err(format!("session did not start: {:?}", other).into()),
    }

    let pcm = std::fs::read(&path)?;
    let samples: Vec<i16> = pcm
        .chunks_exact(2)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect();

    let mut chunker = AudioChunker::for_duration(16000, Duration::from_millis(100), 20)?;
    for block in samples.chunks(512) {
        chunker.push(block);
        while let Some(window) = chunker.next_window() {
            session.send_audio(AudioChunker::to_l16(&window)).await?;
        }
    }
    if let Some(rest) = chunker.flush() {
        session.send_audio(AudioChunker::to_l16(&rest)).await?;
    }
    session.stop().await?;

    while let Some(event) = session.recv().await {
        match event {
            StreamEvent::Results(results) if results.is_final() => {
                println!("{}", results.transcript());
            }
            StreamEvent::Results(results) => {
                let interim = results
                    .results
                    .first()
                    .and_then(|r| r.alternatives.first())
                    .map(|a| a.transcript.as_str())
                    .unwrap_or_default();
                println!("... {}", interim);
            }
            StreamEvent::Listening => break,
            StreamEvent::Error(err) => {
                eprintln!("error: {}", err);
                break;
            }
        }
    }
    session.close().await?;

    Ok(())
}
