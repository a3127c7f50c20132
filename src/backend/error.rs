//! Errors raised by the wrapped OPNsense client.

use thiserror::Error;

/// Maximum number of characters of a response body kept in error messages.
const BODY_EXCERPT_LEN: usize = 500;

/// Errors that can occur while talking to the appliance.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The appliance answered with a non-success HTTP status.
    #[error("HTTP {status} {status_text}")]
    Http {
        status: u16,
        status_text: String,
        body: Option<String>,
    },

    /// The request could not be sent or the connection failed.
    #[error("{0}")]
    Request(String),

    /// The arguments could not be mapped onto the endpoint.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The response body could not be decoded.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    /// The client panicked while handling the call.
    #[error("Backend panicked")]
    Panicked(Option<String>),

    /// The client failed without saying why.
    #[error("Unknown error")]
    Unknown,
}

impl BackendError {
    /// Create an HTTP status error.
    pub fn http(status: u16, status_text: impl Into<String>, body: Option<String>) -> Self {
        Self::Http {
            status,
            status_text: status_text.into(),
            body,
        }
    }

    /// Create a request error.
    pub fn request(msg: impl Into<String>) -> Self {
        Self::Request(msg.into())
    }

    /// Create an invalid argument error.
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    /// Create a decode error.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// The most specific human-readable message this error carries.
    ///
    /// HTTP failures report status, status text and a body excerpt. Other
    /// failures report their own message, and anything without one falls
    /// back to `"Unknown error"`.
    pub fn describe(&self) -> String {
        match self {
            Self::Http {
                status,
                status_text,
                body,
            } => {
                let mut message = format!("HTTP {}", status);
                if !status_text.trim().is_empty() {
                    message.push(' ');
                    message.push_str(status_text.trim());
                }
                if let Some(body) = body.as_deref().map(str::trim).filter(|b| !b.is_empty()) {
                    message.push_str(": ");
                    message.push_str(&excerpt(body));
                }
                message
            }
            Self::Request(msg) | Self::InvalidArgument(msg) | Self::Decode(msg)
                if msg.trim().is_empty() =>
            {
                "Unknown error".to_string()
            }
            Self::Panicked(Some(msg)) if !msg.trim().is_empty() => {
                format!("Backend panicked: {}", msg)
            }
            Self::Panicked(_) | Self::Unknown => "Unknown error".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Request(err.to_string())
        }
    }
}

fn excerpt(body: &str) -> String {
    if body.chars().count() <= BODY_EXCERPT_LEN {
        return body.to_string();
    }
    let cut: String = body.chars().take(BODY_EXCERPT_LEN).collect();
    format!("{}...", cut)
}
