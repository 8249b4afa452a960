use thiserror::Error;

#[derive(Error, Debug)]
pub enum BoardError {
    #[error("Remote error: {0}")]
    Remote(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Busy: {0}")]
    Busy(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BoardError {
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote(message.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Whether the error came back from a remote service call.
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote(_))
    }
}
