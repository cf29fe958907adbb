//! Text-to-speech via the provider's speech endpoint.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{DateTime, Local};
use serde_json::json;
use tracing::{debug, info};

use crate::{check_status, GatewayError, MediaGateway, Result};

const SPEECH_PATH: &str = "/v1/audio/speech";

/// `<root>/YYYYMMDDHHMMSS.wav` for the given instant.
///
/// Two requests within the same second map to the same file; the later write wins.
pub fn speech_output_path(root: &Path, at: DateTime<Local>) -> PathBuf {
    root.join(format!("{}.wav", at.format("%Y%m%d%H%M%S")))
}

impl MediaGateway {
    /// Synthesize `input_text` and write the audio under the storage root.
    ///
    /// The output path is logged, not returned.
    pub async fn synthesize_speech(&self, input_text: &str) -> Result<()> {
        self.synthesize(input_text)
            .await
            .map_err(|e| GatewayError::Synthesis(format!("{e:#}")))
    }

    async fn synthesize(&self, input_text: &str) -> anyhow::Result<()> {
        let model = self.config.speech_model();
        let voice = self.config.voice();

        let mut body = json!({
            "model": model,
            "voice": voice,
            "input": input_text,
        });
        if let Some(format) = self.config.speech_format() {
            body["response_format"] = json!(format);
        }

        debug!(model, voice, text_len = input_text.len(), "Requesting speech synthesis");

        let resp = self
            .provider_post(SPEECH_PATH)
            .json(&body)
            .send()
            .await
            .context("Failed to send speech synthesis request")?;
        let resp = check_status(resp, "Speech").await?;

        let bytes = resp
            .bytes()
            .await
            .context("Failed to read synthesized audio bytes")?;

        let root = self.config.storage_root();
        tokio::fs::create_dir_all(&root)
            .await
            .with_context(|| format!("Failed to create storage root {}", root.display()))?;

        let audio_path = speech_output_path(&root, Local::now());
        tokio::fs::write(&audio_path, &bytes)
            .await
            .with_context(|| format!("Failed to write {}", audio_path.display()))?;

        info!(
            path = %audio_path.display(),
            bytes = bytes.len(),
            voice,
            model,
            "Generated audio file saved"
        );
        Ok(())
    }
}
