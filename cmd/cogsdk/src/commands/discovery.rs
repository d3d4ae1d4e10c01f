//! Discovery commands.

use std::path::Path;

use clap::{Args, Subcommand};

use cogsdk_services::{
    CollectionOperations, CreateCollection, Discovery, QueryOptions,
    discovery::{DEFAULT_URL, DEFAULT_VERSION},
};

use super::{create_client, get_context, output_result, print_success, read_input_bytes};
use crate::Cli;

/// Discovery service.
#[derive(Args)]
pub struct DiscoveryCommand {
    #[command(subcommand)]
    command: DiscoverySubcommand,
}

#[derive(Subcommand)]
enum DiscoverySubcommand {
    /// List environments
    Environments,
    /// List collections of an environment
    Collections {
        /// Environment ID
        environment_id: String,
    },
    /// Show a collection
    Collection {
        environment_id: String,
        collection_id: String,
    },
    /// Create a collection
    #[command(name = "create-collection")]
    CreateCollection {
        environment_id: String,
        /// Collection name
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        configuration_id: Option<String>,
        #[arg(long)]
        language: Option<String>,
    },
    /// Delete a collection
    #[command(name = "delete-collection")]
    DeleteCollection {
        environment_id: String,
        collection_id: String,
    },
    /// Query a collection
    Query {
        environment_id: String,
        collection_id: String,
        /// Natural language query
        #[arg(long)]
        nlq: Option<String>,
        /// Query language expression
        #[arg(long)]
        query: Option<String>,
        /// Filter expression
        #[arg(long)]
        filter: Option<String>,
        /// Number of results
        #[arg(long)]
        count: Option<u32>,
        /// Fields to return (repeatable)
        #[arg(long = "return")]
        return_fields: Vec<String>,
    },
    /// Upload a document
    Add {
        environment_id: String,
        collection_id: String,
        /// Document file
        file: String,
        /// Content type (guessed from the extension if omitted)
        #[arg(long)]
        content_type: Option<String>,
        /// Metadata as a JSON object
        #[arg(long)]
        metadata: Option<String>,
    },
}

impl DiscoveryCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = get_context(cli)?;
        let discovery = Discovery::with_client(create_client(cli, &ctx, DEFAULT_URL)?)
            .with_version(ctx.version_or(DEFAULT_VERSION));

        match &self.command {
            DiscoverySubcommand::Environments => {
                output_result(cli, &discovery.list_environments().await?.payload)
            }
            DiscoverySubcommand::Collections { environment_id } => {
                output_result(cli, &discovery.list_collections(environment_id).await?.payload)
            }
            DiscoverySubcommand::Collection {
                environment_id,
                collection_id,
            } => {
                let resp = discovery.get_collection(environment_id, collection_id).await?;
                output_result(cli, &resp.payload)
            }
            DiscoverySubcommand::CreateCollection {
                environment_id,
                name,
                description,
                configuration_id,
                language,
            } => {
                let req = CreateCollection {
                    name: name.clone(),
                    description: description.clone(),
                    configuration_id: configuration_id.clone(),
                    language: language.clone(),
                };
                let resp = discovery.create_collection(environment_id, &req).await?;
                output_result(cli, &resp.payload)
            }
            DiscoverySubcommand::DeleteCollection {
                environment_id,
                collection_id,
            } => {
                discovery.delete_collection(environment_id, collection_id).await?;
                print_success(&format!("Collection \"{}\" deleted", collection_id));
                Ok(())
            }
            DiscoverySubcommand::Query {
                environment_id,
                collection_id,
                nlq,
                query,
                filter,
                count,
                return_fields,
            } => {
                let options = QueryOptions {
                    natural_language_query: nlq.clone(),
                    query: query.clone(),
                    filter: filter.clone(),
                    count: *count,
                    return_fields: return_fields.clone(),
                    ..Default::default()
                };
                let resp = discovery.query(environment_id, collection_id, &options).await?;
                output_result(cli, &resp.payload)
            }
            DiscoverySubcommand::Add {
                environment_id,
                collection_id,
                file,
                content_type,
                metadata,
            } => {
                let data = read_input_bytes(file)?;
                let filename = Path::new(file)
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or(file.as_str());
                let content_type = content_type
                    .as_deref()
                    .unwrap_or_else(|| document_content_type(filename));
                let metadata = metadata
                    .as_deref()
                    .map(serde_json::from_str::<serde_json::Value>)
                    .transpose()
                    .map_err(|e| anyhow::anyhow!("invalid --metadata: {}", e))?;

                let resp = discovery
                    .add_document(environment_id, collection_id, data, filename, content_type, metadata.as_ref())
                    .await?;
                output_result(cli, &resp.payload)
            }
        }
    }
}

fn document_content_type(filename: &str) -> &'static str {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "json" => "application/json",
        "html" | "htm" => "text/html",
        "pdf" => "application/pdf",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        _ => "text/plain",
    }
}
