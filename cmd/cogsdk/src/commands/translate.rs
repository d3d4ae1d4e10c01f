//! Language translator commands.

use clap::{Args, Subcommand};

use cogsdk_services::{
    LanguageTranslator, TranslateRequest,
    language_translator::{DEFAULT_URL, DEFAULT_VERSION},
};

use super::{create_client, get_context, load_request, output_result};
use crate::Cli;

/// Language translator service.
#[derive(Args)]
pub struct TranslateCommand {
    #[command(subcommand)]
    command: TranslateSubcommand,
}

#[derive(Subcommand)]
enum TranslateSubcommand {
    /// Translate text (arguments, or a full request with -f)
    Text {
        /// Text segments to translate
        text: Vec<String>,
        /// Model ID such as en-es
        #[arg(long)]
        model: Option<String>,
        /// Source language
        #[arg(long)]
        source: Option<String>,
        /// Target language
        #[arg(long)]
        target: Option<String>,
    },
    /// Identify the language of text
    Identify {
        /// Text
        text: String,
    },
    /// List identifiable languages
    Languages,
}

impl TranslateCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = get_context(cli)?;
        let lt = LanguageTranslator::with_client(create_client(cli, &ctx, DEFAULT_URL)?)
            .with_version(ctx.version_or(DEFAULT_VERSION));

        match &self.command {
            TranslateSubcommand::Text {
                text,
                model,
                source,
                target,
            } => {
                let req = match &cli.input {
                    Some(path) => load_request::<TranslateRequest>(path)?,
                    None => TranslateRequest {
                        text: text.clone(),
                        model_id: model.clone(),
                        source: source.clone(),
                        target: target.clone(),
                    },
                };
                output_result(cli, &lt.translate(&req).await?.payload)
            }
            TranslateSubcommand::Identify { text } => output_result(cli, &lt.identify(text).await?.payload),
            TranslateSubcommand::Languages => {
                output_result(cli, &lt.list_identifiable_languages().await?.payload)
            }
        }
    }
}
