//! Request-file loading.
//!
//! Commands that take structured input (`-f request.yaml`) read it through
//! these helpers. `-` reads from stdin.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Error type for request loading.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("failed to read file: {0}")]
    ReadFile(#[from] io::Error),
    #[error("failed to parse YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),
    #[error("failed to parse JSON: {0}")]
    ParseJson(#[from] serde_json::Error),
    #[error("failed to parse request (tried YAML and JSON)")]
    ParseFailed,
}

/// Loads a request from a YAML or JSON file, or stdin when `path` is `-`.
pub fn load_request<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, RequestError> {
    let path = path.as_ref();
    if path.as_os_str() == "-" {
        return load_request_from_stdin();
    }
    let data = fs::read(path)?;
    parse_request(&data, path)
}

/// Parses request data by file extension, falling back to content sniffing.
pub fn parse_request<T: DeserializeOwned>(data: &[u8], path: impl AsRef<Path>) -> Result<T, RequestError> {
    let ext = path
        .as_ref()
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase());

    match ext.as_deref() {
        Some("yaml") | Some("yml") => Ok(serde_yaml::from_slice(data)?),
        Some("json") => Ok(serde_json::from_slice(data)?),
        _ => sniff(data, false),
    }
}

/// Loads a request from stdin.
pub fn load_request_from_stdin<T: DeserializeOwned>() -> Result<T, RequestError> {
    let mut data = Vec::new();
    io::stdin().read_to_end(&mut data)?;
    sniff(&data, true)
}

fn sniff<T: DeserializeOwned>(data: &[u8], json_first: bool) -> Result<T, RequestError> {
    if json_first {
        if let Ok(v) = serde_json::from_slice(data) {
            return Ok(v);
        }
    }
    if let Ok(v) = serde_yaml::from_slice(data) {
        return Ok(v);
    }
    if !json_first {
        if let Ok(v) = serde_json::from_slice(data) {
            return Ok(v);
        }
    }
    Err(RequestError::ParseFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[derive(Debug, Deserialize, PartialEq)]
    struct TranslateInput {
        text: Vec<String>,
        #[serde(default)]
        target: Option<String>,
    }

    #[test]
    fn test_load_yaml() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        writeln!(file, "text:\n  - Hello\ntarget: es").unwrap();

        let req: TranslateInput = load_request(file.path()).unwrap();
        assert_eq!(req.text, vec!["Hello"]);
        assert_eq!(req.target.as_deref(), Some("es"));
    }

    #[test]
    fn test_load_json() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        writeln!(file, r#"{{"text": ["Hello", "World"]}}"#).unwrap();

        let req: TranslateInput = load_request(file.path()).unwrap();
        assert_eq!(req.text.len(), 2);
        assert_eq!(req.target, None);
    }

    #[test]
    fn test_bad_json_reports_json_error() {
        let mut file = NamedTempFile::with_suffix(".json").unwrap();
        writeln!(file, "text: [Hello]").unwrap();

        let result: Result<TranslateInput, _> = load_request(file.path());
        assert!(matches!(result, Err(RequestError::ParseJson(_))));
    }

    #[test]
    fn test_parse_unknown_extension() {
        let req: TranslateInput = parse_request(b"text: [Hola]", "request.txt").unwrap();
        assert_eq!(req.text, vec!["Hola"]);
    }

    #[test]
    fn test_parse_invalid() {
        let result: Result<TranslateInput, _> = parse_request(b"invalid data {{{{", "request.txt");
        assert!(matches!(result, Err(RequestError::ParseFailed)));
    }

    #[test]
    fn test_missing_file() {
        let result: Result<TranslateInput, _> = load_request("/nonexistent/request.yaml");
        assert!(matches!(result, Err(RequestError::ReadFile(_))));
    }
}
