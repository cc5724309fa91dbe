use thiserror::Error;

#[derive(Error, Debug)]
pub enum VeracityError {
    /// Store or external service unreachable. Retried bounded, then fatal
    /// for the unit of work.
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Database error: {0}")]
    Database(String),

    /// Inference output failed shape validation. Recovered locally with a
    /// documented default, never fatal.
    #[error("Malformed inference output: {0}")]
    MalformedOutput(String),

    /// Referenced entity missing at processing time. Unit aborts, no retry.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl VeracityError {
    /// Whether a unit-of-work failure with this error is worth another
    /// attempt. Not-found and malformed-output never are.
    pub fn is_transient(&self) -> bool {
        matches!(self, VeracityError::Transport(_) | VeracityError::Database(_))
    }
}
