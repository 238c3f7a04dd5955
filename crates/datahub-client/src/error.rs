use reqwest::StatusCode;
use thiserror::Error;

/// Errors from the DataHub client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Any non-2xx response is fatal and carries the body for diagnosis.
    #[error("HTTP {status}: {body}")]
    Http { status: StatusCode, body: String },

    #[error("invalid file id {id:?}: {reason}")]
    InvalidFileId { id: String, reason: &'static str },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ClientResult<T> = Result<T, ClientError>;
