use thiserror::Error;

#[derive(Error, Debug)]
pub enum TributaryError {
    /// The user supplied source options are missing, malformed or unsupported.
    #[error("Invalid source options: {0}")]
    FeedValidation(String),

    #[error("Failed to get and parse feed: {0}")]
    FeedGetAndParse(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The feed or API response parsed but lacks a field we cannot do without.
    #[error("Invalid feed: {0}")]
    InvalidFeed(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decrypt secret: {0}")]
    Decrypt(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl TributaryError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::FeedValidation(msg.into())
    }

    /// Validation failures need the user to fix the source; everything else may
    /// succeed on a later poll.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::FeedValidation(_))
    }
}

pub type Result<T> = std::result::Result<T, TributaryError>;
