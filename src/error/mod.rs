use thiserror::Error;

/// Failures surfaced by a batched send.
///
/// A single chunk failing aborts the whole send; the caller never sees a
/// partially aggregated response.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GcmError {
    #[error("Server API key not set")]
    IllegalApiKey,

    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    #[error("Unknown error: {0}")]
    UnknownError(String),

    #[error("Malformed response body: {0}")]
    MalformedResponse(String),
}

impl GcmError {
    /// Stable machine-readable code for logs and metrics
    pub fn code(&self) -> &'static str {
        match self {
            GcmError::IllegalApiKey => "ILLEGAL_API_KEY",
            GcmError::MalformedRequest(_) => "MALFORMED_REQUEST",
            GcmError::AuthenticationError(_) => "AUTHENTICATION_ERROR",
            GcmError::UnknownError(_) => "UNKNOWN_ERROR",
            GcmError::MalformedResponse(_) => "MALFORMED_RESPONSE",
        }
    }

    /// Diagnostic text carried by the error (usually the gateway response body)
    pub fn detail(&self) -> &str {
        match self {
            GcmError::IllegalApiKey => "",
            GcmError::MalformedRequest(detail)
            | GcmError::AuthenticationError(detail)
            | GcmError::UnknownError(detail)
            | GcmError::MalformedResponse(detail) => detail,
        }
    }
}

pub type Result<T> = std::result::Result<T, GcmError>;
