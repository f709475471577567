//! Error types for the Stump client and event subsystem

use reqwest::StatusCode;
use thiserror::Error;

/// Failures surfaced by the Stump query/mutation path and the subscription socket.
#[derive(Debug, Error)]
pub enum StumpError {
    /// Network-level failure (connect, TLS, body read)
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The endpoint answered with a non-success HTTP status
    #[error("request failed with status {status}")]
    Status { status: StatusCode },

    /// The GraphQL envelope carried one or more errors
    #[error("{message}")]
    GraphQl { message: String, errors: Vec<String> },

    /// The GraphQL envelope had neither errors nor data
    #[error("GraphQL response data is null")]
    EmptyResponse,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("websocket error: {0}")]
    WebSocket(String),

    /// The subscription server broke the message protocol
    #[error("subscription protocol error: {0}")]
    Protocol(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl StumpError {
    /// Build the GraphQL error from the messages of a non-empty `errors` list.
    pub fn graphql(errors: Vec<String>) -> Self {
        Self::GraphQl {
            message: format!("GraphQL errors: {}", errors.join(", ")),
            errors,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for StumpError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::WebSocket(e.to_string())
    }
}

pub type Result<T, E = StumpError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_graphql_error_joins_messages() {
        let err = StumpError::graphql(vec!["first".to_string(), "second".to_string()]);
        assert_eq!(err.to_string(), "GraphQL errors: first, second");
        match err {
            StumpError::GraphQl { errors, .. } => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_not_found_predicate() {
        assert!(StumpError::NotFound("series 1".into()).is_not_found());
        assert!(!StumpError::EmptyResponse.is_not_found());
    }
}
