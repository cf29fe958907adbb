//! Media gateway: speech-to-text, text revision, text-to-speech,
//! acoustic quality assessment, and audio storage.
//!
//! Every operation is a single request/response call against an external
//! endpoint. [`MediaGateway`] carries the configuration and the provider
//! credential, both resolved once at construction.

use parlance_core::config::Config;
use parlance_core::types::Credential;
use tracing::debug;

pub mod assess;
pub mod revision;
pub mod storage;
pub mod stt;
pub mod tts;

pub use parlance_core::error::{GatewayError, Result};
pub use parlance_core::types::{AudioResource, TimedTranscript, WordTiming};

pub struct MediaGateway {
    config: Config,
    credential: Option<Credential>,
    client: reqwest::Client,
}

impl MediaGateway {
    /// Build a gateway from startup configuration.
    ///
    /// A missing API key is not an error here; provider calls made without
    /// one are rejected by the provider.
    pub fn new(config: Config) -> Self {
        let credential = config.api_key().map(Credential::new);
        debug!(
            base_url = config.provider_base_url(),
            has_credential = credential.is_some(),
            "Media gateway configured"
        );
        Self {
            config,
            credential,
            client: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn provider_url(&self, path: &str) -> String {
        format!("{}{path}", self.config.provider_base_url())
    }

    /// Start a POST to the provider, attaching the credential when present.
    fn provider_post(&self, path: &str) -> reqwest::RequestBuilder {
        let req = self.client.post(self.provider_url(path));
        match &self.credential {
            Some(cred) => req.header("Authorization", cred.bearer()),
            None => req,
        }
    }
}

/// Fail with the status and body when the response is not 2xx.
pub(crate) async fn check_status(
    resp: reqwest::Response,
    api: &str,
) -> anyhow::Result<reqwest::Response> {
    if resp.status().is_success() {
        return Ok(resp);
    }
    let status = resp.status();
    let body = resp.text().await.unwrap_or_default();
    anyhow::bail!("{api} API error ({status}): {body}")
}
