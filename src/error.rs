use reqwest::StatusCode;

/// ApiError
///
/// The three failure classes a call to the learning API can end in. Call sites
/// do not branch on the variant; `FetchState::from_result` collapses every one
/// of them into the same human-readable message.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, TLS, connection reset, ...).
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The backend answered with a non-2xx status.
    #[error("backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    /// The body arrived but did not have the expected JSON shape.
    #[error("unexpected response shape: {0}")]
    Decode(String),
}

impl ApiError {
    /// The backend status, when the failure was an HTTP response.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err)
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
