use thiserror::Error;

/// Failure kinds surfaced by the gateway.
///
/// Provider-facing variants carry only the underlying message; auth failures,
/// rate limits and malformed input are not distinguished.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Config error: {0}")]
    Config(String),

    #[error("Transcription error: {0}")]
    Transcription(String),

    #[error("Revision error: {0}")]
    Revision(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Quality assessment error: {0}")]
    QualityAssessment(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GatewayError>;
