//! Utility functions for CLI commands.

use std::sync::Arc;

use cogsdk_cli::{Config, Context, Output, OutputFormat, load_config};
use cogsdk_services::RestClient;
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use crate::Cli;

const APP_NAME: &str = "cogsdk";

/// Gets the global configuration.
pub fn get_config(cli: &Cli) -> anyhow::Result<Config> {
    load_config(APP_NAME, cli.config.as_deref())
}

/// Gets the context configuration to use.
pub fn get_context(cli: &Cli) -> anyhow::Result<Context> {
    let cfg = get_config(cli)?;

    match cfg.resolve_context(cli.context.as_deref()) {
        Some(ctx) => Ok(ctx.clone()),
        None => match cli.context.as_deref() {
            Some(name) => anyhow::bail!("context '{}' not found", name),
            None => anyhow::bail!(
                "no context specified. Use -c flag or set a default context with 'cogsdk config use-context'"
            ),
        },
    }
}

/// Creates a shared client for the service at `default_url` from the
/// resolved context.
pub fn create_client(cli: &Cli, ctx: &Context, default_url: &str) -> anyhow::Result<Arc<RestClient>> {
    print_verbose(cli, &format!("Using context: {}", ctx.name));
    debug!(context = %ctx.name, url = %ctx.url_or(default_url), auth = ctx.auth_label(), "creating client");
    Ok(Arc::new(ctx.client(default_url)?))
}

/// Loads a request from the `-f` file.
pub fn load_request<T: DeserializeOwned>(path: &str) -> anyhow::Result<T> {
    Ok(cogsdk_cli::load_request(path)?)
}

/// Reads a binary input (audio, image, document) from disk.
pub fn read_input_bytes(path: &str) -> anyhow::Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| anyhow::anyhow!("failed to read {}: {}", path, e))
}

/// Outputs result as JSON or YAML, to the `-o` file or stdout.
pub fn output_result<T: Serialize>(cli: &Cli, result: &T) -> anyhow::Result<()> {
    Output::new(OutputFormat::from_json_flag(cli.json), cli.output.clone()).write(result)
}

/// Outputs binary data to a file.
pub fn output_bytes(data: &[u8], output_path: &str) -> anyhow::Result<()> {
    Output::new(OutputFormat::Yaml, None).write_binary(data, output_path)
}

/// Prints verbose output if enabled.
pub fn print_verbose(cli: &Cli, msg: &str) {
    cogsdk_cli::print_verbose(cli.verbose, msg);
}

/// Prints success message.
pub fn print_success(msg: &str) {
    eprintln!("\x1b[32m✓\x1b[0m {}", msg);
}

/// Formats bytes to human readable string.
pub fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}
