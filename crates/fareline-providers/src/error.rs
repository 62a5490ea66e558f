use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("invalid price: {0}")]
    InvalidPrice(String),

    #[error("invalid time: {0}")]
    InvalidTime(String),

    #[error("provider request exceeded the deadline")]
    DeadlineExceeded,

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid provider URL {url:?}: {reason}")]
    BadUrl { url: String, reason: String },
}
