use thiserror::Error;

/// Classified provider failure. Tells the caller *why* the model call failed;
/// the response engine recovers from every variant by falling back.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    /// No credential was configured for the provider.
    #[error("provider is not configured")]
    NotConfigured,

    /// Connection refused, DNS failure, reset, etc.
    #[error("network failure: {0}")]
    Network(String),

    /// The request did not complete within the adapter's timeout.
    #[error("request timed out: {0}")]
    Timeout(String),

    /// The provider answered with a non-success status (auth, quota, outage...).
    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// The body could not be decoded into the expected shape.
    #[error("malformed provider response: {0}")]
    Malformed(String),

    /// The provider answered but produced no usable text.
    #[error("provider returned an empty response")]
    EmptyResponse,

    /// The adapter panicked while handling the call.
    #[error("provider panicked: {0}")]
    Panicked(String),
}

/// Longest slice of an error body kept in the error message.
const MAX_BODY_CHARS: usize = 300;

impl ProviderError {
    pub fn from_status(status: u16, body: &str) -> Self {
        ProviderError::Status {
            status,
            body: truncate_body(body),
        }
    }

    /// Quota and rate-limit failures are worth a distinct log line.
    pub fn is_quota(&self) -> bool {
        matches!(self, ProviderError::Status { status: 402 | 429, .. })
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout(err.to_string())
        } else if err.is_decode() {
            ProviderError::Malformed(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_BODY_CHARS {
        return trimmed.to_string();
    }
    let mut cut: String = trimmed.chars().take(MAX_BODY_CHARS).collect();
    cut.push('…');
    cut
}
