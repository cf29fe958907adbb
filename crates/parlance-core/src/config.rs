//! Configuration loading and validation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_KEY_ENV: &str = "API_KEY";
pub const DEFAULT_PROVIDER_BASE_URL: &str = "https://api.openai.com";
pub const DEFAULT_TRANSCRIPTION_MODEL: &str = "whisper-1";
pub const DEFAULT_REVISION_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_REVISION_MAX_TOKENS: u32 = 300;
pub const DEFAULT_SPEECH_MODEL: &str = "tts-1";
pub const DEFAULT_VOICE: &str = "nova";
pub const DEFAULT_ASSESSMENT_URL: &str = "http://localhost:6000/assess";
pub const DEFAULT_STORAGE_ROOT: &str = "../database/audios";

/// Top-level Parlance configuration.
///
/// Every section is optional; accessors fall back to the built-in defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub models: Option<ModelsConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub assessment: Option<AssessmentConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageConfig>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

/// Speech/text provider endpoint and credential source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Direct API key. Accepted on input, never written back out.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    /// Environment variable holding the API key (default: `API_KEY`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl ProviderConfig {
    /// Resolve the API key: check `api_key` field first, then the `api_key_env` environment variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        let env = self
            .api_key_env
            .clone()
            .or_else(|| Some(DEFAULT_API_KEY_ENV.to_string()));
        resolve_secret_field(&self.api_key, &env)
    }
}

/// Model identifiers and generation limits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub revision_max_tokens: Option<u32>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,

    /// Forwarded as `response_format` to the speech endpoint when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech_format: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssessmentConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory that uploads and synthesized speech are written to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub root: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log format: "plain" (default) or "json".
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Log level override (trace/debug/info/warn/error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
            level: None,
        }
    }
}

fn default_log_format() -> String {
    "plain".into()
}

/// A non-empty direct value, else a non-empty value of the named environment variable.
pub fn resolve_secret_field(direct: &Option<String>, env_var: &Option<String>) -> Option<String> {
    direct.clone().filter(|v| !v.is_empty()).or_else(|| {
        env_var
            .as_deref()
            .and_then(|name| std::env::var(name).ok())
            .filter(|v| !v.is_empty())
    })
}

/// Replace `${NAME}` placeholders with environment values; unset names become empty.
fn expand_placeholders(raw: &str) -> String {
    let Ok(placeholder) = regex::Regex::new(r"\$\{([^}]+)\}") else {
        return raw.to_string();
    };
    placeholder
        .replace_all(raw, |caps: &regex::Captures| std::env::var(&caps[1]).unwrap_or_default())
        .into_owned()
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

impl Config {
    /// Load config from a JSON5 file, substituting `${ENV_VAR}` references.
    ///
    /// A missing file yields the defaults.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path).map_err(|e| {
            crate::error::GatewayError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;

        let config: Config = json5::from_str(&expand_placeholders(&raw))
            .map_err(|e| crate::error::GatewayError::Config(e.to_string()))?;

        Ok(config)
    }

    /// Default config file location.
    pub fn config_path() -> PathBuf {
        data_dir().join("config.json")
    }

    /// The provider API key, resolved from config or environment.
    pub fn api_key(&self) -> Option<String> {
        match &self.provider {
            Some(p) => p.resolve_api_key(),
            None => ProviderConfig::default().resolve_api_key(),
        }
    }

    pub fn provider_base_url(&self) -> &str {
        self.provider
            .as_ref()
            .and_then(|p| p.base_url.as_deref())
            .unwrap_or(DEFAULT_PROVIDER_BASE_URL)
            .trim_end_matches('/')
    }

    pub fn transcription_model(&self) -> &str {
        self.models
            .as_ref()
            .and_then(|m| m.transcription.as_deref())
            .unwrap_or(DEFAULT_TRANSCRIPTION_MODEL)
    }

    pub fn revision_model(&self) -> &str {
        self.models
            .as_ref()
            .and_then(|m| m.revision.as_deref())
            .unwrap_or(DEFAULT_REVISION_MODEL)
    }

    pub fn revision_max_tokens(&self) -> u32 {
        self.models
            .as_ref()
            .and_then(|m| m.revision_max_tokens)
            .unwrap_or(DEFAULT_REVISION_MAX_TOKENS)
    }

    pub fn speech_model(&self) -> &str {
        self.models
            .as_ref()
            .and_then(|m| m.speech.as_deref())
            .unwrap_or(DEFAULT_SPEECH_MODEL)
    }

    pub fn voice(&self) -> &str {
        self.models
            .as_ref()
            .and_then(|m| m.voice.as_deref())
            .unwrap_or(DEFAULT_VOICE)
    }

    pub fn speech_format(&self) -> Option<&str> {
        self.models.as_ref().and_then(|m| m.speech_format.as_deref())
    }

    pub fn assessment_url(&self) -> &str {
        self.assessment
            .as_ref()
            .and_then(|a| a.url.as_deref())
            .unwrap_or(DEFAULT_ASSESSMENT_URL)
    }

    pub fn storage_root(&self) -> PathBuf {
        PathBuf::from(
            self.storage
                .as_ref()
                .and_then(|s| s.root.as_deref())
                .unwrap_or(DEFAULT_STORAGE_ROOT),
        )
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn log_json(&self) -> bool {
        self.logging.as_ref().is_some_and(|l| l.format == "json")
    }

    /// Check the config for problems. Returns `(warnings, errors)`.
    pub fn validate(&self) -> (Vec<String>, Vec<String>) {
        let mut warnings = Vec::new();
        let mut errors = Vec::new();

        if self.api_key().is_none() {
            warnings.push(
                "No provider API key configured; provider calls will be rejected".to_string(),
            );
        }

        if self.storage_root().as_os_str().is_empty() {
            warnings.push("Storage root is empty; files will be written to the working directory".to_string());
        }

        if !is_http_url(self.provider_base_url()) {
            errors.push(format!(
                "Provider base URL is not an http(s) URL: {}",
                self.provider_base_url()
            ));
        }

        if !is_http_url(self.assessment_url()) {
            errors.push(format!(
                "Assessment URL is not an http(s) URL: {}",
                self.assessment_url()
            ));
        }

        if let Some(logging) = &self.logging {
            if logging.format != "plain" && logging.format != "json" {
                errors.push(format!(
                    "Unknown logging format '{}' (expected \"plain\" or \"json\")",
                    logging.format
                ));
            }
        }

        if self.revision_max_tokens() == 0 {
            errors.push("models.revision_max_tokens must be greater than zero".to_string());
        }

        (warnings, errors)
    }
}

/// Per-user data directory (`~/.parlance`).
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".parlance")
}
