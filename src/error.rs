use thiserror::Error;

/// Main error type for the matching engine
#[derive(Error, Debug)]
pub enum MatcherError {
    /// The pass was superseded or its deadline expired
    #[error("Matching pass cancelled")]
    Cancelled,

    /// A single strategy failed; the engine drops its output
    #[error("Strategy '{strategy}' error: {message}")]
    Strategy { strategy: String, message: String },

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Corpus/config file errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Candidate source errors
    #[error("Candidate source error: {0}")]
    Source(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl MatcherError {
    /// Cancellation is a signal to the caller, not a failure of the pass
    pub fn is_cancelled(&self) -> bool {
        matches!(self, MatcherError::Cancelled)
    }
}

impl From<String> for MatcherError {
    fn from(s: String) -> Self {
        MatcherError::Other(s)
    }
}

impl From<&str> for MatcherError {
    fn from(s: &str) -> Self {
        MatcherError::Other(s.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, MatcherError>;
