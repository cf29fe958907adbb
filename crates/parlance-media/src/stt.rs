//! Speech-to-text against the provider's transcription endpoint.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use tracing::{debug, info};

use crate::{check_status, GatewayError, MediaGateway, Result, TimedTranscript};

const TRANSCRIPTIONS_PATH: &str = "/v1/audio/transcriptions";

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

impl MediaGateway {
    /// Transcribe the audio file at `audio_path` to plain text.
    pub async fn transcribe(&self, audio_path: &Path) -> Result<String> {
        self.transcribe_plain(audio_path)
            .await
            .map_err(|e| GatewayError::Transcription(format!("{e:#}")))
    }

    /// Transcribe with word-level timestamps, in the order the provider returns them.
    pub async fn transcribe_with_timestamps(&self, audio_path: &Path) -> Result<TimedTranscript> {
        self.transcribe_verbose(audio_path)
            .await
            .map_err(|e| GatewayError::Transcription(format!("{e:#}")))
    }

    async fn transcribe_plain(&self, audio_path: &Path) -> anyhow::Result<String> {
        let form = self.transcription_form(audio_path).await?;
        let resp = self.send_transcription(form).await?;

        let result: TranscriptionResponse = resp
            .json()
            .await
            .context("Failed to parse transcription response")?;

        info!(
            model = self.config.transcription_model(),
            chars = result.text.len(),
            "Audio transcribed"
        );
        Ok(result.text)
    }

    async fn transcribe_verbose(&self, audio_path: &Path) -> anyhow::Result<TimedTranscript> {
        let form = self
            .transcription_form(audio_path)
            .await?
            .text("response_format", "verbose_json")
            .text("timestamp_granularities[]", "word");
        let resp = self.send_transcription(form).await?;

        let result: TimedTranscript = resp
            .json()
            .await
            .context("Failed to parse verbose transcription response")?;

        info!(
            model = self.config.transcription_model(),
            chars = result.text.len(),
            words = result.words.len(),
            "Audio transcribed with word timestamps"
        );
        Ok(result)
    }

    /// Read the whole file and build the base multipart form.
    async fn transcription_form(
        &self,
        audio_path: &Path,
    ) -> anyhow::Result<reqwest::multipart::Form> {
        let file_bytes = tokio::fs::read(audio_path)
            .await
            .with_context(|| format!("Failed to read audio file {}", audio_path.display()))?;
        let file_name = audio_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio.wav".into());

        debug!(
            file = file_name,
            bytes = file_bytes.len(),
            model = self.config.transcription_model(),
            "Sending audio for transcription"
        );

        let file_part = reqwest::multipart::Part::bytes(file_bytes)
            .file_name(file_name)
            .mime_str("application/octet-stream")?;

        Ok(reqwest::multipart::Form::new()
            .part("file", file_part)
            .text("model", self.config.transcription_model().to_string()))
    }

    async fn send_transcription(
        &self,
        form: reqwest::multipart::Form,
    ) -> anyhow::Result<reqwest::Response> {
        let resp = self
            .provider_post(TRANSCRIPTIONS_PATH)
            .multipart(form)
            .send()
            .await
            .context("Failed to send audio for transcription")?;
        check_status(resp, "Transcription").await
    }
}
