//! Error types for L2DA steering operations.

use l2da_types::{MacAddress, ParseError};
use thiserror::Error;

/// Result type alias for L2DA operations.
pub type Result<T> = std::result::Result<T, L2daError>;

/// Errors returned by the steering context and its collaborators.
///
/// A failed frame clone on the receive path is not represented here: it is
/// logged, counted and skipped.
#[derive(Debug, Error)]
pub enum L2daError {
    /// No mapping exists for the address.
    #[error("no mapping for {0}")]
    NotFound(MacAddress),

    /// Entry allocation failed; the table is unchanged.
    #[error("cannot allocate mapping entry for {0}")]
    OutOfMemory(MacAddress),

    /// Malformed request: short output buffer, or a link that cannot transmit.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The named link is not a member of the aggregate.
    #[error("link '{0}' is not a member of the aggregate")]
    LinkNotFound(String),

    /// Configuration validation error.
    #[error("invalid configuration for {field}: {message}")]
    Config {
        /// The field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl L2daError {
    /// Creates a configuration error for `field`.
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            message: message.into(),
        }
    }
}
