//! Conversation commands.

use std::io::{self, BufRead, Write};

use clap::{Args, Subcommand};

use cogsdk_services::{
    Conversation, MessageRequest,
    conversation::{DEFAULT_URL, DEFAULT_VERSION},
};

use super::{create_client, get_context, load_request, output_result, print_verbose};
use crate::Cli;

/// Conversation service.
#[derive(Args)]
pub struct ConversationCommand {
    #[command(subcommand)]
    command: ConversationSubcommand,
}

#[derive(Subcommand)]
enum ConversationSubcommand {
    /// Send one message (text argument, or a full request with -f)
    Message {
        /// Workspace ID
        workspace_id: String,
        /// User input
        text: Option<String>,
    },
    /// Chat interactively, carrying the dialog context between turns
    Chat {
        /// Workspace ID
        workspace_id: String,
    },
}

impl ConversationCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        let ctx = get_context(cli)?;
        let conv = Conversation::with_client(create_client(cli, &ctx, DEFAULT_URL)?)
            .with_version(ctx.version_or(DEFAULT_VERSION));

        match &self.command {
            ConversationSubcommand::Message { workspace_id, text } => {
                let req = match (&cli.input, text) {
                    (Some(path), _) => load_request::<MessageRequest>(path)?,
                    (None, Some(text)) => MessageRequest::text(text.as_str()),
                    (None, None) => anyhow::bail!("message text or -f request file is required"),
                };
                let resp = conv.message(workspace_id, &req).await?;
                output_result(cli, &resp.payload)
            }
            ConversationSubcommand::Chat { workspace_id } => self.chat(cli, &conv, workspace_id).await,
        }
    }

    async fn chat(&self, cli: &Cli, conv: &Conversation, workspace_id: &str) -> anyhow::Result<()> {
        // An empty first message starts the dialog and returns its greeting.
        let mut resp = conv.message(workspace_id, &MessageRequest::default()).await?.payload;
        let stdin = io::stdin();
        loop {
            for line in &resp.output.text {
                println!("< {}", line);
            }
            if let Some(intent) = resp.top_intent() {
                print_verbose(cli, &format!("intent: {} ({:.2})", intent.intent, intent.confidence));
            }

            print!("> ");
            io::stdout().flush()?;
            let mut input = String::new();
            if stdin.lock().read_line(&mut input)? == 0 {
                return Ok(());
            }
            let input = input.trim();
            if input.is_empty() {
                continue;
            }

            let req = MessageRequest::text(input).with_context(resp.context.clone());
            resp = conv.message(workspace_id, &req).await?.payload;
        }
    }
}
