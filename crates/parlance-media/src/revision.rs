//! Text revision through the provider's chat completions endpoint.
//!
//! The reply is constrained with a strict JSON schema to a single `text`
//! field, which is parsed and returned.

use std::path::Path;

use anyhow::Context;
use base64::Engine;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::{check_status, GatewayError, MediaGateway, Result};

const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

pub const SYSTEM_PROMPT: &str = "You are an English tutor. Please refine a user's talk to make them sound more natural and grammarly correct.";

/// Structured reply the provider is forced to produce.
#[derive(Debug, Deserialize)]
struct TextRevision {
    text: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    refusal: Option<String>,
}

/// Encode image bytes as a data URL.
///
/// The MIME type is always `image/jpeg`, whatever the actual format.
pub fn image_data_url(bytes: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(bytes);
    format!("data:image/jpeg;base64,{encoded}")
}

/// System instruction plus the user turn, with the image as a second content part.
fn build_messages(text: &str, image_url: Option<&str>) -> Vec<Value> {
    let user = match image_url {
        None => json!({"role": "user", "content": text}),
        Some(url) => json!({
            "role": "user",
            "content": [
                {"type": "text", "text": text},
                {"type": "image_url", "image_url": {"url": url}},
            ]
        }),
    };
    vec![json!({"role": "system", "content": SYSTEM_PROMPT}), user]
}

fn response_format() -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "TextRevision",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "text": {"type": "string"}
                },
                "required": ["text"],
                "additionalProperties": false
            }
        }
    })
}

fn parse_revision(body: ChatResponse) -> anyhow::Result<String> {
    let message = body
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| anyhow::anyhow!("No choices in revision response"))?;

    if let Some(refusal) = message.refusal {
        anyhow::bail!("Provider refused revision: {refusal}");
    }

    let content = message
        .content
        .ok_or_else(|| anyhow::anyhow!("No content in revision response"))?;
    let revision: TextRevision = serde_json::from_str(&content)
        .context("Revision response does not match the TextRevision schema")?;
    Ok(revision.text)
}

impl MediaGateway {
    /// Rewrite `text` to sound more natural, optionally using the image at `image_path` as context.
    pub async fn revise_text(&self, text: &str, image_path: Option<&Path>) -> Result<String> {
        self.revise(text, image_path)
            .await
            .map_err(|e| GatewayError::Revision(format!("{e:#}")))
    }

    async fn revise(&self, text: &str, image_path: Option<&Path>) -> anyhow::Result<String> {
        let image_url = match image_path {
            Some(path) => {
                let bytes = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("Failed to read image {}", path.display()))?;
                Some(image_data_url(&bytes))
            }
            None => None,
        };

        let model = self.config.revision_model();
        let request = json!({
            "model": model,
            "messages": build_messages(text, image_url.as_deref()),
            "max_tokens": self.config.revision_max_tokens(),
            "response_format": response_format(),
        });

        debug!(
            model,
            text_len = text.len(),
            with_image = image_url.is_some(),
            "Requesting text revision"
        );

        let resp = self
            .provider_post(CHAT_COMPLETIONS_PATH)
            .json(&request)
            .send()
            .await
            .context("Failed to send revision request")?;
        let resp = check_status(resp, "Revision").await?;

        let body: ChatResponse = resp
            .json()
            .await
            .context("Failed to parse revision response")?;
        let revised = parse_revision(body)?;

        info!(model, chars = revised.len(), "Text revised");
        Ok(revised)
    }
}
