//! Tone analyzer commands.

use clap::{Args, ValueEnum};

use cogsdk_services::{
    ToneAnalyzer, ToneCategory,
    tone_analyzer::{DEFAULT_URL, DEFAULT_VERSION},
};

use super::{create_client, get_context, output_result, print_verbose};
use crate::Cli;

/// Tone analyzer service.
#[derive(Args)]
pub struct ToneCommand {
    /// Text to analyze (reads the -f file as plain text if omitted)
    text: Option<String>,
    /// Include sentence-level analysis
    #[arg(long)]
    sentences: bool,
    /// Tone categories (repeatable, all if omitted)
    #[arg(long = "tone", value_enum)]
    tones: Vec<Category>,
}

#[derive(Clone, Copy, ValueEnum)]
enum Category {
    Emotion,
    Language,
    Social,
}

impl From<Category> for ToneCategory {
    fn from(c: Category) -> Self {
        match c {
            Category::Emotion => ToneCategory::Emotion,
            Category::Language => ToneCategory::Language,
            Category::Social => ToneCategory::Social,
        }
    }
}

impl ToneCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let text = match (&self.text, &cli.input) {
            (Some(text), _) => text.clone(),
            (None, Some(path)) => std::fs::read_to_string(path)?,
            (None, None) => anyhow::bail!("text argument or -f file is required"),
        };

        let ctx = get_context(cli)?;
        let ta = ToneAnalyzer::with_client(create_client(cli, &ctx, DEFAULT_URL)?)
            .with_version(ctx.version_or(DEFAULT_VERSION));

        let tones: Vec<ToneCategory> = self.tones.iter().map(|&c| c.into()).collect();
        let analysis = ta.tone(&text, self.sentences, &tones).await?.payload;
        if let Some(tone) = analysis.dominant_tone() {
            print_verbose(cli, &format!("dominant tone: {} ({:.2})", tone.tone_id, tone.score));
        }
        output_result(cli, &analysis)
    }
}
