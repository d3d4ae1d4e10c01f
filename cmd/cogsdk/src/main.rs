//! cogsdk CLI - A command line interface for the cloud AI services.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{
    ClassifyCommand, ConfigCommand, ConversationCommand, DiscoveryCommand, SttCommand,
    ToneCommand, TranslateCommand, TtsCommand, VisualCommand,
};

/// cogsdk CLI - A command line interface for the cloud AI services.
///
/// This tool allows you to call:
///   - Natural language classification
///   - Speech to text (file and microphone streaming)
///   - Text to speech
///   - Conversation
///   - Discovery
///   - Language translation
///   - Tone analysis
///   - Visual recognition
///
/// Configuration is stored in ~/.cogsdk/cogsdk/ and supports multiple contexts,
/// similar to kubectl's context management. Each context points at one
/// service instance.
#[derive(Parser)]
#[command(name = "cogsdk")]
#[command(about = "Cloud AI services CLI tool")]
#[command(version)]
pub struct Cli {
    /// Config file (default is ~/.cogsdk/cogsdk/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Context name to use
    #[arg(short = 'c', long, global = true)]
    pub context: Option<String>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<String>,

    /// Input request file (YAML or JSON, `-` for stdin)
    #[arg(short = 'f', long = "file", global = true)]
    pub input: Option<String>,

    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage CLI configuration
    Config(ConfigCommand),
    /// Natural language classifier
    Classify(ClassifyCommand),
    /// Speech to text
    Stt(SttCommand),
    /// Text to speech
    Tts(TtsCommand),
    /// Conversation workspaces
    Conversation(ConversationCommand),
    /// Discovery environments, collections and queries
    Discovery(DiscoveryCommand),
    /// Language translation
    Translate(TranslateCommand),
    /// Tone analysis
    Tone(ToneCommand),
    /// Visual recognition
    Visual(VisualCommand),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Config(cmd) => cmd.run(&cli).await,
        Commands::Classify(cmd) => cmd.run(&cli).await,
        Commands::Stt(cmd) => cmd.run(&cli).await,
        Commands::Tts(cmd) => cmd.run(&cli).await,
        Commands::Conversation(cmd) => cmd.run(&cli).await,
        Commands::Discovery(cmd) => cmd.run(&cli).await,
        Commands::Translate(cmd) => cmd.run(&cli).await,
        Commands::Tone(cmd) => cmd.run(&cli).await,
        Commands::Visual(cmd) => cmd.run(&cli).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "cogsdk", "classify", "text", "10D41B-nlc-1", "hello", "-c", "nlc", "--json", "-v",
        ])
        .unwrap();
        assert_eq!(cli.context.as_deref(), Some("nlc"));
        assert!(cli.json);
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Classify(_)));
    }
}
