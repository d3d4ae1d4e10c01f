//! Visual recognition commands.

use std::path::Path;

use clap::Args;

use cogsdk_services::{
    ClassifyOptions, VisualRecognition,
    visual_recognition::{DEFAULT_URL, DEFAULT_VERSION},
};

use super::{create_client, get_context, output_result, print_verbose, read_input_bytes};
use crate::Cli;

/// Visual recognition service.
///
/// Classifies one image file.
#[derive(Args)]
pub struct VisualCommand {
    /// Image file (jpg, png, gif, tif or a zip of images)
    image: String,
    /// Classifier IDs (repeatable)
    #[arg(long = "classifier")]
    classifier_ids: Vec<String>,
    /// Classifier owners: IBM, me (repeatable)
    #[arg(long = "owner")]
    owners: Vec<String>,
    /// Minimum class score
    #[arg(long)]
    threshold: Option<f32>,
    /// Language of class names
    #[arg(long)]
    lang: Option<String>,
    /// Print only the classes, highest score first
    #[arg(long)]
    classes: bool,
}

impl VisualCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = get_context(cli)?;
        let vr = VisualRecognition::with_client(create_client(cli, &ctx, DEFAULT_URL)?)
            .with_version(ctx.version_or(DEFAULT_VERSION));

        let data = read_input_bytes(&self.image)?;
        let filename = Path::new(&self.image)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(self.image.as_str());
        let options = ClassifyOptions {
            classifier_ids: self.classifier_ids.clone(),
            owners: self.owners.clone(),
            threshold: self.threshold,
            accept_language: self.lang.clone(),
        };

        let resp = vr.classify(data, filename, &options).await?;
        print_verbose(cli, &format!("images processed: {}", resp.payload.images_processed));
        if self.classes {
            output_result(cli, &resp.payload.classes())
        } else {
            output_result(cli, &resp.payload)
        }
    }
}
