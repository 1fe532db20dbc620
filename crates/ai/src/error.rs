use thiserror::Error;

/// Failure reported by an external collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AiError {
    /// The input cannot be processed (wrong file type, missing data).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The service ran but produced no usable result.
    #[error("inference failed: {0}")]
    InferenceFailed(String),

    /// The service could not be reached or is not configured.
    #[error("service unavailable: {0}")]
    Unavailable(String),
}

impl AiError {
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::InferenceFailed(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}
