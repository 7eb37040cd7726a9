use thiserror::Error;

pub type Result<T> = std::result::Result<T, NaraError>;

#[derive(Debug, Error)]
pub enum NaraError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Upstream returned result code {code}: {message}")]
    Upstream { code: String, message: String },

    #[error(
        "[{label}] request failed after {attempts} attempts: status={status:?}, body={body:?}, error={last_error:?}"
    )]
    RetriesExhausted {
        label: String,
        attempts: u32,
        status: Option<u16>,
        body: Option<String>,
        last_error: Option<String>,
    },
}

impl NaraError {
    /// Whether this error should end the whole run rather than a single query.
    pub fn is_fatal(&self) -> bool {
        matches!(self, NaraError::RetriesExhausted { .. })
    }

    /// The server rejected the `_type` parameter spelling with an "Unexpected" 5xx.
    pub(crate) fn is_unexpected_format(&self) -> bool {
        match self {
            NaraError::RetriesExhausted {
                status: Some(status),
                body: Some(body),
                ..
            } => *status >= 500 && body.contains("Unexpected"),
            _ => false,
        }
    }
}

impl From<reqwest::Error> for NaraError {
    fn from(err: reqwest::Error) -> Self {
        NaraError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for NaraError {
    fn from(err: serde_json::Error) -> Self {
        NaraError::Parse(err.to_string())
    }
}
