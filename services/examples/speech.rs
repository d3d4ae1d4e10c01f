//! Speech to text and text to speech example.
//!
//! Synthesizes a sentence, then transcribes the synthesized audio.
//!
//! Run with:
//! ```bash
//! export TTS_APIKEY="your-tts-api-key"
//! export STT_APIKEY="your-stt-api-key"
//! cargo run -p cogsdk-services --example speech
//! ```

use std::env;

use cogsdk_services::{
    AudioFormat, Credentials, RecognizeOptions, SpeechToText, TextToSpeech, speech_to_text,
    text_to_speech,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let tts_key = env::var("TTS_APIKEY").expect("TTS_APIKEY environment variable not set");
    let stt_key = env::var("STT_APIKEY").expect("STT_APIKEY environment variable not set");

    let tts = TextToSpeech::new(Credentials::api_key(text_to_speech::DEFAULT_URL, tts_key)?)?;
    let stt = SpeechToText::new(Credentials::api_key(speech_to_text::DEFAULT_URL, stt_key)?)?;

    // Example 1: list voices
    println!("Example 1: Voices");
    println!("---");

    let voices = tts.list_voices().await?.into_payload();
    for voice in voices.voices.iter().take(5) {
        println!("{} ({}, {})", voice.name, voice.language, voice.gender);
    }

    // Example 2: synthesize
    println!("\nExample 2: Synthesize");
    println!("---");

    let text = "The quick brown fox jumps over the lazy dog.";
    let audio = tts
        .synthesize(text, text_to_speech::DEFAULT_VOICE, AudioFormat::Wav)
        .await?
        .into_payload();
    println!("Synthesized {} bytes of audio", audio.len());
    std::fs::write("speech.wav", &audio)?;

    // Example 3: recognize the synthesized audio
    println!("\nExample 3: Recognize");
    println!("---");

    let options = RecognizeOptions {
        timestamps: true,
        ..Default::default()
    };
    let results = stt
        .recognize(audio, &AudioFormat::Wav.mime_type(), &options)
        .await?
        .into_payload();
    println!("Transcript: {}", results.transcript());

    Ok(())
}
