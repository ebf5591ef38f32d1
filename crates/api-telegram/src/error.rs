#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("failed to build HTTP client: {0}")]
    HttpClient(reqwest::Error),
    #[error("Telegram `{method}` request failed: {source}")]
    Request {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to decode Telegram `{method}` response: {source}")]
    Decode {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error(
        "Telegram `{method}` returned an error ({code}): {description}",
        code = error_code.map_or_else(|| "no code".to_string(), |c| c.to_string())
    )]
    Api {
        method: &'static str,
        error_code: Option<i64>,
        description: String,
    },
}

pub type TelegramResult<T> = std::result::Result<T, TelegramError>;
