use thiserror::Error;

#[derive(Debug, Error)]
pub enum UnipileError {
    #[error("unipile api key is not configured")]
    MissingApiKey,
    #[error("unipile request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unipile returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("invalid unipile response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid unipile request: {0}")]
    InvalidRequest(String),
}

impl UnipileError {
    /// HTTP status reported by Unipile, if the request got that far.
    pub fn status(&self) -> Option<u16> {
        match self {
            UnipileError::Api { status, .. } => Some(*status),
            UnipileError::Http(err) => err.status().map(|status| status.as_u16()),
            _ => None,
        }
    }
}
