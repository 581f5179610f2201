//! Error types for the clan calendar.

use thiserror::Error;

/// Errors that can occur in clancal operations.
#[derive(Error, Debug)]
pub enum ClanCalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown time zone: {0}")]
    Timezone(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("{0}")]
    Validation(String),

    /// Non-success response from the hosted backend, carrying its message.
    #[error("{message}")]
    Backend { status: u16, message: String },

    #[error("Events are not in start-time order (at position {0})")]
    Unordered(usize),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type alias for clancal operations.
pub type ClanCalResult<T> = Result<T, ClanCalError>;
