use thiserror::Error;

/// Errors surfaced by provider clients.
#[derive(Debug, Error)]
pub enum AiClientError {
    /// Non-success HTTP status from the provider, with the response body.
    #[error("provider API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Rate limit (429) that persisted through retries.
    #[error("provider rate limit exceeded after {attempts} attempts")]
    RateLimited { attempts: u32 },

    /// Transport-level failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response parsed but did not contain the expected payload.
    #[error("empty response from provider")]
    EmptyResponse,
}

pub type Result<T> = std::result::Result<T, AiClientError>;
