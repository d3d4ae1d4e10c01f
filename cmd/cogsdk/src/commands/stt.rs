//! Speech to text commands.

use std::path::Path;
use std::time::Duration;

use clap::{Args, Subcommand};

use cogsdk_services::{
    AudioChunker, CreateLanguageModel, CustomizationOperations, RecognizeOptions, SpeechToText,
    StreamEvent, StreamOptions, speech_to_text::DEFAULT_URL,
};

use super::{
    create_client, format_bytes, get_context, output_result, print_success, print_verbose,
    read_input_bytes,
};
use crate::Cli;

/// Speech to text service.
///
/// Recognizes audio files in one request, or streams raw 16-bit PCM over
/// a WebSocket session the way a microphone capture would.
#[derive(Args)]
pub struct SttCommand {
    #[command(subcommand)]
    command: SttSubcommand,
}

#[derive(Subcommand)]
enum SttSubcommand {
    /// List recognition models
    Models,
    /// Show a recognition model
    Model {
        /// Model ID
        model_id: String,
    },
    /// Recognize an audio file
    Recognize {
        /// Audio file (wav, flac, ogg, mp3, or raw l16 as .pcm/.raw)
        audio: String,
        /// Content type (guessed from the file extension if omitted)
        #[arg(long)]
        content_type: Option<String>,
        #[command(flatten)]
        options: RecognizeArgs,
    },
    /// Stream raw 16-bit little-endian PCM through a recognize session
    Stream {
        /// PCM file
        audio: String,
        /// Sample rate of the PCM data
        #[arg(long, default_value_t = 16000)]
        rate: u32,
        /// Window length in milliseconds
        #[arg(long, default_value_t = 100)]
        window_ms: u64,
        /// Model ID
        #[arg(long)]
        model: Option<String>,
        /// Custom language model ID
        #[arg(long)]
        customization_id: Option<String>,
        /// Print interim hypotheses
        #[arg(long)]
        interim: bool,
    },
    /// List custom language models
    #[command(name = "custom-list")]
    CustomList {
        /// Only models for this language
        #[arg(long)]
        language: Option<String>,
    },
    /// Create a custom language model
    #[command(name = "custom-create")]
    CustomCreate {
        /// Model name
        name: String,
        /// Base model
        #[arg(long, default_value = "en-US_BroadbandModel")]
        base_model: String,
        /// Description
        #[arg(long)]
        description: Option<String>,
    },
    /// Show a custom language model
    #[command(name = "custom-get")]
    CustomGet {
        /// Customization ID
        customization_id: String,
    },
    /// Train a custom language model
    #[command(name = "custom-train")]
    CustomTrain {
        /// Customization ID
        customization_id: String,
    },
    /// Delete a custom language model
    #[command(name = "custom-delete")]
    CustomDelete {
        /// Customization ID
        customization_id: String,
    },
}

#[derive(Args)]
struct RecognizeArgs {
    /// Model ID
    #[arg(long)]
    model: Option<String>,
    /// Custom language model ID
    #[arg(long)]
    customization_id: Option<String>,
    /// Keywords to spot (repeatable)
    #[arg(long = "keyword")]
    keywords: Vec<String>,
    /// Keyword confidence threshold
    #[arg(long)]
    keywords_threshold: Option<f32>,
    /// Maximum alternatives per result
    #[arg(long)]
    max_alternatives: Option<u32>,
    /// Include per-word timestamps
    #[arg(long)]
    timestamps: bool,
    /// Include per-word confidence
    #[arg(long)]
    word_confidence: bool,
    /// Format dates, times and numbers
    #[arg(long)]
    smart_formatting: bool,
    /// Label speakers
    #[arg(long)]
    speaker_labels: bool,
}

impl RecognizeArgs {
    fn to_options(&self) -> RecognizeOptions {
        RecognizeOptions {
            model: self.model.clone(),
            customization_id: self.customization_id.clone(),
            keywords: self.keywords.clone(),
            keywords_threshold: self.keywords_threshold,
            max_alternatives: self.max_alternatives,
            timestamps: self.timestamps,
            word_confidence: self.word_confidence,
            smart_formatting: self.smart_formatting,
            speaker_labels: self.speaker_labels,
            ..Default::default()
        }
    }
}

impl SttCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = get_context(cli)?;
        let stt = SpeechToText::with_client(create_client(cli, &ctx, DEFAULT_URL)?);

        match &self.command {
            SttSubcommand::Models => output_result(cli, &stt.list_models().await?.payload),
            SttSubcommand::Model { model_id } => output_result(cli, &stt.get_model(model_id).await?.payload),
            SttSubcommand::Recognize {
                audio,
                content_type,
                options,
            } => {
                let content_type = match content_type {
                    Some(ct) => ct.clone(),
                    None => audio_content_type(audio)?.to_string(),
                };
                let data = read_input_bytes(audio)?;
                print_verbose(cli, &format!("Audio: {} ({}, {})", audio, content_type, format_bytes(data.len())));

                let resp = stt.recognize(data, &content_type, &options.to_options()).await?;
                output_result(cli, &resp.payload)
            }
            SttSubcommand::Stream {
                audio,
                rate,
                window_ms,
                model,
                customization_id,
                interim,
            } => {
                let options = StreamOptions {
                    model: model.clone(),
                    customization_id: customization_id.clone(),
                    content_type: format!("audio/l16;rate={}", rate),
                    interim_results: *interim,
                    ..Default::default()
                };
                self.stream(cli, &stt, audio, *rate, *window_ms, &options).await
            }
            SttSubcommand::CustomList { language } => {
                let resp = stt.list_customizations(language.as_deref()).await?;
                output_result(cli, &resp.payload)
            }
            SttSubcommand::CustomCreate {
                name,
                base_model,
                description,
            } => {
                let req = CreateLanguageModel {
                    name: name.clone(),
                    base_model_name: base_model.clone(),
                    description: description.clone(),
                    ..Default::default()
                };
                let resp = stt.create_customization(&req).await?;
                output_result(cli, &resp.payload)
            }
            SttSubcommand::CustomGet { customization_id } => {
                let resp = stt.get_customization(customization_id).await?;
                output_result(cli, &resp.payload)
            }
            SttSubcommand::CustomTrain { customization_id } => {
                stt.train_customization(customization_id).await?;
                print_success(&format!("Training started for \"{}\"", customization_id));
                Ok(())
            }
            SttSubcommand::CustomDelete { customization_id } => {
                stt.delete_customization(customization_id).await?;
                print_success(&format!("Custom model \"{}\" deleted", customization_id));
                Ok(())
            }
        }
    }

    async fn stream(
        &self,
        cli: &Cli,
        stt: &SpeechToText,
        audio: &str,
        rate: u32,
        window_ms: u64,
        options: &StreamOptions,
    ) -> anyhow::Result<()> {
        let data = read_input_bytes(audio)?;
        let samples: Vec<i16> = data
            .chunks_exact(2)
            .map(|b| i16::from_le_bytes([b[0], b[1]]))
            .collect();
        let mut chunker = AudioChunker::for_duration(rate, Duration::from_millis(window_ms), 50)?;

        let mut session = stt.recognize_stream(options).await?;
        session.wait_listening().await?;
        // The first event is the listening acknowledgement of the start action.
        if let Some(StreamEvent::Error(e)) = session.recv().await {
            anyhow::bail!("recognition failed: {}", e);
        }
        print_verbose(cli, &format!("Streaming {} samples at {} Hz", samples.len(), rate));

        let mut sent = 0usize;
        for block in samples.chunks(chunker.capacity()) {
            chunker.push(block);
            while let Some(window) = chunker.next_window() {
                session.send_audio(AudioChunker::to_l16(&window)).await?;
                sent += window.len();
            }
        }
        if let Some(rest) = chunker.flush() {
            sent += rest.len();
            session.send_audio(AudioChunker::to_l16(&rest)).await?;
        }
        print_verbose(cli, &format!("Sent {} samples", sent));
        session.stop().await?;

        let mut transcript = Vec::new();
        while let Some(event) = session.recv().await {
            match event {
                StreamEvent::Results(results) => {
                    if results.is_final() {
                        transcript.push(results.transcript());
                    } else if options.interim_results {
                        eprintln!("... {}", interim_text(&results));
                    }
                }
                StreamEvent::Listening => break,
                StreamEvent::Error(e) => {
                    session.close().await?;
                    anyhow::bail!("recognition failed: {}", e);
                }
            }
        }
        session.close().await?;

        let result = serde_json::json!({
            "transcript": transcript.join(" "),
            "samples": sent,
        });
        output_result(cli, &result)
    }
}

fn interim_text(results: &cogsdk_services::RecognitionResults) -> String {
    results
        .results
        .iter()
        .filter_map(|r| r.alternatives.first())
        .map(|a| a.transcript.trim())
        .collect::<Vec<_>>()
        .join(" ")
}

fn audio_content_type(path: &str) -> anyhow::Result<&'static str> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    Ok(match ext.as_str() {
        "wav" => "audio/wav",
        "flac" => "audio/flac",
        "ogg" | "opus" => "audio/ogg",
        "mp3" => "audio/mp3",
        "webm" => "audio/webm",
        "pcm" | "raw" => "audio/l16;rate=16000",
        _ => anyhow::bail!("cannot guess content type of {}, use --content-type", path),
    })
}
