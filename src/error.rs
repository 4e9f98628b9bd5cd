//! Error taxonomy shared by the model, persistence and coach layers.

use crate::types::{NodeId, ZoneId};

/// Every recoverable failure the editor can report.
///
/// None of these leave the document in a modified state: the operation that
/// produced the error is aborted before anything is written.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapError {
    /// A required field was empty (e.g. a component name).
    #[error("{0}")]
    Validation(String),
    /// Imported or stored text was not a valid map document.
    #[error("Invalid JSON: {0}")]
    Format(String),
    /// An operation referenced a node that does not exist.
    #[error("no component with id {0}")]
    UnknownNode(NodeId),
    /// An operation referenced a zone that does not exist.
    #[error("no zone with id {0}")]
    UnknownZone(ZoneId),
    /// The chat request never reached the proxy, or its response was unreadable.
    #[error("Could not reach the AI coach: {0}")]
    Network(String),
    /// The proxy answered with an error status.
    #[error("AI coach error ({status}): {message}")]
    Upstream {
        /// HTTP status returned by the proxy
        status: u16,
        /// Error message extracted from the response body
        message: String,
    },
    /// A chat request is already waiting for its reply.
    #[error("the AI coach is still answering the previous message")]
    Busy,
}

impl From<serde_json::Error> for MapError {
    fn from(err: serde_json::Error) -> Self {
        MapError::Format(err.to_string())
    }
}
