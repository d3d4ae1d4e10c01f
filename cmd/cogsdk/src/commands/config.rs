//! Configuration management commands.

use clap::{Args, Subcommand};

use cogsdk_cli::Context as CliContext;

use super::{get_config, output_result, print_success};
use crate::Cli;

/// Manage CLI configuration.
///
/// Contexts allow you to manage multiple service instances,
/// similar to kubectl's context management.
///
/// Configuration is stored in ~/.cogsdk/cogsdk/config.yaml
#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    command: ConfigSubcommand,
}

#[derive(Subcommand)]
enum ConfigSubcommand {
    /// Add or replace a context
    #[command(name = "add-context")]
    AddContext {
        /// Context name
        name: String,
        /// Service base URL
        #[arg(long)]
        url: Option<String>,
        /// API key
        #[arg(long)]
        api_key: Option<String>,
        /// Basic auth username
        #[arg(long, requires = "password")]
        username: Option<String>,
        /// Basic auth password
        #[arg(long, requires = "username")]
        password: Option<String>,
        /// Pre-obtained bearer token
        #[arg(long)]
        token: Option<String>,
        /// API version date
        #[arg(long)]
        api_version: Option<String>,
        /// Request timeout in seconds
        #[arg(long)]
        timeout: Option<i32>,
        /// Maximum retries
        #[arg(long)]
        max_retries: Option<i32>,
        /// Opt out of request logging by the service
        #[arg(long)]
        learning_opt_out: bool,
        /// Extra setting as key=value (repeatable)
        #[arg(long = "set", value_name = "KEY=VALUE")]
        extra: Vec<String>,
    },
    /// Delete a context
    #[command(name = "delete-context")]
    DeleteContext {
        /// Context name
        name: String,
    },
    /// Set the current context
    #[command(name = "use-context")]
    UseContext {
        /// Context name
        name: String,
    },
    /// Display the current context
    #[command(name = "get-context")]
    GetContext,
    /// List all contexts
    #[command(name = "list-contexts", alias = "get-contexts")]
    ListContexts,
    /// View the configuration with secrets masked
    View,
}

impl ConfigCommand {
    pub async fn run(&self, cli: &Cli) -> anyhow::Result<()> {
        match &self.command {
            ConfigSubcommand::AddContext {
                name,
                url,
                api_key,
                username,
                password,
                token,
                api_version,
                timeout,
                max_retries,
                learning_opt_out,
                extra,
            } => {
                let mut cfg = get_config(cli)?;

                let mut ctx = CliContext {
                    url: url.clone().unwrap_or_default(),
                    api_key: api_key.clone().unwrap_or_default(),
                    username: username.clone().unwrap_or_default(),
                    password: password.clone().unwrap_or_default(),
                    token: token.clone().unwrap_or_default(),
                    version: api_version.clone().unwrap_or_default(),
                    timeout: timeout.unwrap_or(0),
                    max_retries: max_retries.unwrap_or(0),
                    learning_opt_out: *learning_opt_out,
                    ..Default::default()
                };
                for pair in extra {
                    let (key, value) = pair
                        .split_once('=')
                        .ok_or_else(|| anyhow::anyhow!("invalid --set {:?}, expected KEY=VALUE", pair))?;
                    ctx.set_extra(key.trim(), value.trim());
                }
                if ctx.auth_mode().is_none() {
                    anyhow::bail!("one of --api-key, --username/--password or --token is required");
                }

                cfg.add_context(name, ctx)?;
                print_success(&format!("Context \"{}\" added successfully", name));
                Ok(())
            }

            ConfigSubcommand::DeleteContext { name } => {
                let mut cfg = get_config(cli)?;
                cfg.delete_context(name)?;
                print_success(&format!("Context \"{}\" deleted", name));
                Ok(())
            }

            ConfigSubcommand::UseContext { name } => {
                let mut cfg = get_config(cli)?;
                cfg.use_context(name)?;
                print_success(&format!("Switched to context \"{}\"", name));
                Ok(())
            }

            ConfigSubcommand::GetContext => {
                let cfg = get_config(cli)?;
                if cfg.current_context.is_empty() {
                    println!("No current context set");
                } else {
                    println!("{}", cfg.current_context);
                }
                Ok(())
            }

            ConfigSubcommand::ListContexts => {
                let cfg = get_config(cli)?;

                if cfg.contexts.is_empty() {
                    println!("No contexts configured");
                    return Ok(());
                }

                println!("{:<8} {:<20} {:<10} {}", "CURRENT", "NAME", "AUTH", "URL");
                for name in cfg.list_contexts() {
                    let Some(ctx) = cfg.get_context(name) else {
                        continue;
                    };
                    let current = if name == cfg.current_context { "*" } else { "" };
                    let url = if ctx.url.is_empty() { "(default)" } else { &ctx.url };
                    println!("{:<8} {:<20} {:<10} {}", current, name, ctx.auth_label(), url);
                }

                Ok(())
            }

            ConfigSubcommand::View => {
                let cfg = get_config(cli)?;

                eprintln!("Config file: {}", cfg.path().display());
                let mut view = cfg.clone();
                for ctx in view.contexts.values_mut() {
                    *ctx = ctx.masked();
                }
                output_result(cli, &view)
            }
        }
    }
}
