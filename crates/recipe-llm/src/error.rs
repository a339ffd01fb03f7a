use thiserror::Error;

/// Failure of a single completion call. Never retried.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("provider rejected credentials (HTTP {status}): {detail}")]
    Auth { status: u16, detail: String },

    #[error("provider quota or rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("provider returned HTTP {status}: {detail}")]
    Http { status: u16, detail: String },

    #[error("provider request failed: {0}")]
    Network(String),

    #[error("malformed provider response: {0}")]
    Malformed(String),
}

impl ProviderError {
    pub(crate) fn from_status(status: u16, detail: String) -> Self {
        match status {
            401 | 403 => Self::Auth { status, detail },
            429 => Self::RateLimited(detail),
            _ => Self::Http { status, detail },
        }
    }
}
