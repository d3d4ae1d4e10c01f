//! Text to speech commands.

use clap::{Args, Subcommand, ValueEnum};

use cogsdk_services::{
    AudioFormat, PhonemeFormat, TextToSpeech,
    text_to_speech::{DEFAULT_URL, DEFAULT_VOICE},
};

use super::{
    create_client, format_bytes, get_context, output_bytes, output_result, print_success,
    print_verbose,
};
use crate::Cli;

/// Text to speech service.
///
/// The voice defaults to the context's `voice` extra setting, then to the
/// service default voice.
#[derive(Args)]
pub struct TtsCommand {
    #[command(subcommand)]
    command: TtsSubcommand,
}

#[derive(Subcommand)]
enum TtsSubcommand {
    /// List voices
    Voices,
    /// Show a voice
    Voice {
        /// Voice name
        name: String,
    },
    /// Synthesize text to an audio file (requires -o)
    Synthesize {
        /// Text to speak
        text: String,
        /// Voice name
        #[arg(long)]
        voice: Option<String>,
        /// Audio format: wav, ogg, vorbis, flac, mp3, l16, basic
        #[arg(long, default_value = "wav")]
        format: String,
    },
    /// Show the pronunciation of a word
    Pronounce {
        /// Word
        text: String,
        /// Voice name
        #[arg(long)]
        voice: Option<String>,
        /// Phonetic alphabet
        #[arg(long, value_enum, default_value_t = Phonemes::Ipa)]
        phonemes: Phonemes,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Phonemes {
    Ipa,
    Ibm,
}

impl From<Phonemes> for PhonemeFormat {
    fn from(p: Phonemes) -> Self {
        match p {
            Phonemes::Ipa => PhonemeFormat::Ipa,
            Phonemes::Ibm => PhonemeFormat::Ibm,
        }
    }
}

impl TtsCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = get_context(cli)?;
        let tts = TextToSpeech::with_client(create_client(cli, &ctx, DEFAULT_URL)?);
        let default_voice = ctx.get_extra("voice").unwrap_or(DEFAULT_VOICE);

        match &self.command {
            TtsSubcommand::Voices => output_result(cli, &tts.list_voices().await?.payload),
            TtsSubcommand::Voice { name } => output_result(cli, &tts.get_voice(name).await?.payload),
            TtsSubcommand::Synthesize { text, voice, format } => {
                let output_path = cli
                    .output
                    .as_deref()
                    .ok_or_else(|| anyhow::anyhow!("output file is required for audio, use -o flag"))?;
                let format = AudioFormat::from_name(format)
                    .ok_or_else(|| anyhow::anyhow!("unsupported audio format: {}", format))?;
                let voice = voice.as_deref().unwrap_or(default_voice);

                print_verbose(cli, &format!("Voice: {}", voice));
                print_verbose(cli, &format!("Format: {}", format));

                let resp = tts.synthesize(text, voice, format).await?;
                output_bytes(&resp.payload, output_path)?;
                print_success(&format!(
                    "Audio saved to: {} ({})",
                    output_path,
                    format_bytes(resp.payload.len())
                ));
                Ok(())
            }
            TtsSubcommand::Pronounce { text, voice, phonemes } => {
                let voice = voice.as_deref().unwrap_or(default_voice);
                let resp = tts.pronunciation(text, voice, (*phonemes).into()).await?;
                output_result(cli, &resp.payload)
            }
        }
    }
}
