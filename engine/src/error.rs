//! Error types for the Plank engine.

use thiserror::Error;

/// Why an inbound socket payload could not be turned into a change event.
///
/// None of these are fatal: the connection keeps running and the raw text is
/// recorded in the event log.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("malformed notification: {0}")]
    Malformed(String),

    #[error("unknown action: {0}")]
    UnknownAction(String),

    #[error("{action} notification is missing '{field}'")]
    MissingField {
        action: &'static str,
        field: &'static str,
    },
}

/// Result type for decoding.
pub type Result<T> = std::result::Result<T, DecodeError>;
