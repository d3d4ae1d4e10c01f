//! CLI utilities for cogsdk.
//!
//! Context-based configuration, output formatting and request-file loading
//! shared by the `cogsdk` binary.

pub mod config;
pub mod output;
pub mod request;

pub use config::{Config, Context, load_config, mask_api_key};
pub use output::{Output, OutputFormat, guess_extension, print_verbose};
pub use request::{RequestError, load_request, load_request_from_stdin, parse_request};
