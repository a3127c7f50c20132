//! Error types and handling for the MCP server.
//!
//! This module defines a unified error type that can represent errors from
//! the tools domain, the backend client and the transport layer.

use thiserror::Error;

/// A specialized Result type for MCP server operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for the MCP server.
#[derive(Debug, Error)]
pub enum Error {
    /// Error originating from the tools domain.
    #[error("Tool error: {0}")]
    Tool(#[from] crate::domains::tools::ToolError),

    /// Error raised by the OPNsense client.
    #[error("Backend error: {}", .0.describe())]
    Backend(#[from] crate::backend::BackendError),

    /// Error raised by a transport.
    #[error("Transport error: {0}")]
    Transport(#[from] super::transport::TransportError),

    /// Configuration-related errors.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors from file operations or network communication.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

}

impl Error {
    /// Create a new configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendError;
    use crate::domains::tools::ToolError;

    #[test]
    fn test_conversions() {
        let err: Error = ToolError::unknown_tool("nope").into();
        assert!(matches!(err, Error::Tool(_)));
        assert!(err.to_string().contains("nope"));

        let err: Error = BackendError::http(503, "Service Unavailable", None).into();
        assert_eq!(err.to_string(), "Backend error: HTTP 503 Service Unavailable");
    }

    #[test]
    fn test_config_error() {
        let err = Error::config("invalid tool manifest");
        assert_eq!(err.to_string(), "Configuration error: invalid tool manifest");
    }
}
