//! Natural language classifier commands.

use clap::{Args, Subcommand};

use cogsdk_services::{NaturalLanguageClassifier, classifier::DEFAULT_URL};

use super::{create_client, get_context, output_result, print_success};
use crate::Cli;

/// Natural language classifier.
#[derive(Args)]
pub struct ClassifyCommand {
    #[command(subcommand)]
    command: ClassifySubcommand,
}

#[derive(Subcommand)]
enum ClassifySubcommand {
    /// Classify a phrase
    Text {
        /// Classifier ID
        classifier_id: String,
        /// Phrase to classify
        text: String,
    },
    /// List classifiers
    List,
    /// Show classifier status
    Get {
        /// Classifier ID
        classifier_id: String,
    },
    /// Delete a classifier
    Delete {
        /// Classifier ID
        classifier_id: String,
    },
}

impl ClassifyCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = get_context(cli)?;
        let nlc = NaturalLanguageClassifier::with_client(create_client(cli, &ctx, DEFAULT_URL)?);

        match &self.command {
            ClassifySubcommand::Text { classifier_id, text } => {
                let resp = nlc.classify(classifier_id, text).await?;
                output_result(cli, &resp.payload)
            }
            ClassifySubcommand::List => {
                let resp = nlc.list_classifiers().await?;
                output_result(cli, &resp.payload)
            }
            ClassifySubcommand::Get { classifier_id } => {
                let resp = nlc.get_classifier(classifier_id).await?;
                output_result(cli, &resp.payload)
            }
            ClassifySubcommand::Delete { classifier_id } => {
                nlc.delete_classifier(classifier_id).await?;
                print_success(&format!("Classifier \"{}\" deleted", classifier_id));
                Ok(())
            }
        }
    }
}
