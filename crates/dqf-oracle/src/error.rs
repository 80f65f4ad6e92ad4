use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("OPENAI_API_KEY is not configured")]
    MissingCredentials,

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("oracle request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("oracle returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("oracle returned no content")]
    EmptyResponse,

    #[error("could not parse oracle answer: {0}")]
    Parse(String),
}

impl OracleError {
    /// Transport failures, rate limits and server errors are worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::MissingCredentials | Self::Client(_) | Self::EmptyResponse | Self::Parse(_) => {
                false
            }
        }
    }
}
