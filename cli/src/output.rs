//! Output utilities for CLI tools.

use std::{fs::File, io::Write, path::Path};

use serde::Serialize;

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// YAML format (default).
    #[default]
    Yaml,
    /// JSON format.
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json { OutputFormat::Json } else { OutputFormat::Yaml }
    }
}

/// Output configuration.
pub struct Output {
    pub format: OutputFormat,
    pub file: Option<String>,
}

impl Output {
    /// Creates a new output configuration.
    pub fn new(format: OutputFormat, file: Option<String>) -> Self {
        Self { format, file }
    }

    /// Renders a value in the configured format.
    pub fn render<T: Serialize>(&self, value: &T) -> anyhow::Result<String> {
        Ok(match self.format {
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
            OutputFormat::Json => serde_json::to_string_pretty(value)?,
        })
    }

    /// Writes a value to the output file, or stdout.
    pub fn write<T: Serialize>(&self, value: &T) -> anyhow::Result<()> {
        let output = self.render(value)?;
        match &self.file {
            Some(path) => {
                let mut file = File::create(path)?;
                file.write_all(output.as_bytes())?;
            }
            None => println!("{}", output),
        }
        Ok(())
    }

    /// Writes binary data to `path`.
    pub fn write_binary(&self, data: &[u8], path: impl AsRef<Path>) -> anyhow::Result<()> {
        let mut file = File::create(path)?;
        file.write_all(data)?;
        Ok(())
    }
}

/// Prints verbose output if enabled.
pub fn print_verbose(enabled: bool, message: &str) {
    if enabled {
        eprintln!("[verbose] {}", message);
    }
}

/// Guesses a file extension from an audio format name or MIME type.
pub fn guess_extension(format: &str) -> &'static str {
    let format = format.to_lowercase();
    let base = format.split(';').next().unwrap_or_default().trim();
    match base {
        "mp3" | "audio/mp3" | "audio/mpeg" => "mp3",
        "wav" | "audio/wav" => "wav",
        "flac" | "audio/flac" => "flac",
        "ogg" | "ogg-opus" | "ogg-vorbis" | "audio/ogg" => "ogg",
        "l16" | "pcm" | "audio/l16" => "pcm",
        "basic" | "audio/basic" => "au",
        "png" | "image/png" => "png",
        "jpg" | "jpeg" | "image/jpeg" => "jpg",
        "json" | "application/json" => "json",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_guess_extension() {
        assert_eq!(guess_extension("audio/wav"), "wav");
        assert_eq!(guess_extension("audio/ogg;codecs=opus"), "ogg");
        assert_eq!(guess_extension("audio/l16;rate=22050"), "pcm");
        assert_eq!(guess_extension("MP3"), "mp3");
        assert_eq!(guess_extension("video/mp4"), "bin");
    }

    #[test]
    fn test_render() {
        let value = json!({ "top_class": "greeting" });
        let yaml = Output::new(OutputFormat::Yaml, None).render(&value).unwrap();
        assert_eq!(yaml.trim(), "top_class: greeting");
        let json = Output::new(OutputFormat::from_json_flag(true), None).render(&value).unwrap();
        assert!(json.contains("\"top_class\": \"greeting\""));
    }

    #[test]
    fn test_write_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        let out = Output::new(OutputFormat::Json, Some(path.to_string_lossy().into_owned()));
        out.write(&json!({ "ok": true })).unwrap();
        let written: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["ok"], true);

        let audio = dir.path().join("speech.wav");
        out.write_binary(b"RIFF", &audio).unwrap();
        assert_eq!(std::fs::read(&audio).unwrap(), b"RIFF");
    }
}
