//! Error types for the client.
//!
//! None of these cross the [`SyncClient`](crate::SyncClient) facade: they are
//! turned into state transitions and event log entries where they occur.

/// Socket-level failure.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("connection refused: {0}")]
    Refused(String),

    #[error("socket closed: {0}")]
    Closed(String),
}

/// Failure of a call to the items HTTP API.
#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{status} - {body}")]
    Status { status: u16, body: String },
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error("origin must start with http:// or https://, got {0}")]
    InvalidOrigin(String),

    #[error("PLANK_ORIGIN is required when PLANK_ENV=production")]
    MissingOrigin,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = MutationError::Status {
            status: 404,
            body: "Item not found".into(),
        };
        assert_eq!(err.to_string(), "404 - Item not found");

        let err = ConfigError::InvalidValue {
            name: "PLANK_BACKOFF",
            value: "random".into(),
        };
        assert_eq!(err.to_string(), "invalid value for PLANK_BACKOFF: random");
    }
}
