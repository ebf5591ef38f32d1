use crate::constants::ERROR_BODY_PREVIEW_CHARS;
use crate::validation::truncate_chars;

#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Text(#[from] medchat_types::TextError),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(reqwest::Error),
    #[error("record store request for `{table}` failed: {source}")]
    StoreRequest {
        table: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("record store returned {status} for `{table}`: {body}")]
    StoreStatus {
        table: &'static str,
        status: u16,
        body: String,
    },
    #[error("failed to decode `{table}` rows: {source}")]
    StoreDecode {
        table: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("generation request failed: {0}")]
    GenerationRequest(reqwest::Error),
    #[error("generation service returned {status}: {body}")]
    GenerationStatus { status: u16, body: String },
    #[error("failed to decode generation response: {0}")]
    GenerationDecode(reqwest::Error),
    #[error(
        "generation returned no text (block reason: {reason})",
        reason = block_reason.as_deref().unwrap_or("none")
    )]
    EmptyGeneration { block_reason: Option<String> },

    #[error("notification delivery failed: {0}")]
    Notification(String),

    #[error("failed to read records file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to deserialize records: {0}")]
    Deserialization(serde_json::Error),
    #[error("failed to serialize records: {0}")]
    Serialization(serde_json::Error),
}

pub type PatientResult<T> = std::result::Result<T, PatientError>;

/// Shortens a remote error body before it is stored in an error value or logged.
pub(crate) fn body_preview(body: &str) -> String {
    truncate_chars(body.trim(), ERROR_BODY_PREVIEW_CHARS)
}
