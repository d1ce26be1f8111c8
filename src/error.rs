use thiserror::Error;

/// Unified error type for relver operations
#[derive(Error, Debug)]
pub enum RelverError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Consistency error: {0}")]
    Consistency(String),

    /// Expected race: a concurrent invocation created the same tag first.
    /// Callers recover from this variant; it never aborts a run on its own.
    #[error("Tag '{0}' already exists")]
    TagAlreadyExists(String),

    #[error("API request failed: {0}")]
    Api(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("HTTP transport failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in relver
pub type Result<T> = std::result::Result<T, RelverError>;

impl RelverError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        RelverError::Config(msg.into())
    }

    /// Create a consistency error with context
    pub fn consistency(msg: impl Into<String>) -> Self {
        RelverError::Consistency(msg.into())
    }

    /// Create an API error with context
    pub fn api(msg: impl Into<String>) -> Self {
        RelverError::Api(msg.into())
    }
}
