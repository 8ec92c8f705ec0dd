use thiserror::Error;

#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("assistant request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("assistant api returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("invalid assistant response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("invalid assistant request: {0}")]
    InvalidRequest(String),
    #[error("assistant run {run_id} ended as {status}: {message}")]
    RunFailed {
        run_id: String,
        status: String,
        message: String,
    },
    #[error("assistant run {run_id} did not finish after {attempts} polls")]
    RunTimedOut { run_id: String, attempts: u32 },
    #[error("assistant produced no reply")]
    NoReply,
}
