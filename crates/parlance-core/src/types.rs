//! Transient request/response values passed through the gateway.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Provider credential. Immutable once loaded; never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Value for an `Authorization` header.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// Audio bytes plus the filename they were uploaded under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioResource {
    pub filename: String,
    pub data: Vec<u8>,
}

impl AudioResource {
    pub fn new(filename: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            data: data.into(),
        }
    }

    /// Read a local file into a resource named after the file's last path component.
    pub async fn from_path(path: &Path) -> crate::error::Result<Self> {
        let data = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio.wav".into());
        Ok(Self { filename, data })
    }
}

/// A single word with its offsets (seconds) into the audio stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WordTiming {
    pub word: String,
    pub start: f64,
    pub end: f64,
}

/// Transcript text plus word timings in provider (chronological) order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TimedTranscript {
    pub text: String,
    #[serde(default)]
    pub words: Vec<WordTiming>,
}
