//! Tool-specific error types.

use thiserror::Error;

use super::naming::{CapabilityGroup, ToolKey};

/// Errors that can occur during tool operations.
///
/// Only [`ToolError::UnknownTool`] and malformed request arguments reach the
/// protocol layer as errors; every other variant is rendered into a text
/// response.
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool is not in the catalog.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// A tool was called before `configure_connection`.
    #[error(
        "OPNsense connection is not configured. Call 'configure_connection' with url, apiKey \
         and apiSecret before using '{0}'."
    )]
    ClientNotConfigured(String),

    /// The tool belongs to a capability group that is switched off.
    #[error("Tool '{tool}' belongs to the {group} capability group, which is disabled.")]
    CapabilityUnavailable {
        tool: String,
        group: CapabilityGroup,
    },

    /// The plugin backing the tool is not installed on the appliance.
    #[error(
        "Plugin '{0}' is not installed or not available. Install the plugin first to use this \
         functionality."
    )]
    PluginNotInstalled(String),

    /// The wrapped client failed.
    #[error("Error calling {tool} ({key}): {message}")]
    BackendOperationFailed {
        tool: String,
        key: ToolKey,
        message: String,
    },

    /// Invalid arguments were provided to the tool.
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    /// Two methods map to the same tool name.
    #[error("Tool name collision: {0}")]
    NameCollision(String),

    /// An internal error occurred.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ToolError {
    /// Create a new "unknown tool" error.
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self::UnknownTool(name.into())
    }

    /// Create a new "client not configured" error.
    pub fn not_configured(tool: impl Into<String>) -> Self {
        Self::ClientNotConfigured(tool.into())
    }

    /// Create a new "capability unavailable" error.
    pub fn capability_unavailable(tool: impl Into<String>, group: CapabilityGroup) -> Self {
        Self::CapabilityUnavailable {
            tool: tool.into(),
            group,
        }
    }

    /// Create a new "plugin not installed" error.
    pub fn plugin_not_installed(plugin: impl Into<String>) -> Self {
        Self::PluginNotInstalled(plugin.into())
    }

    /// Create a new "backend operation failed" error.
    pub fn backend_failed(tool: impl Into<String>, key: ToolKey, message: impl Into<String>) -> Self {
        Self::BackendOperationFailed {
            tool: tool.into(),
            key,
            message: message.into(),
        }
    }

    /// Create a new "invalid arguments" error.
    pub fn invalid_arguments(msg: impl Into<String>) -> Self {
        Self::InvalidArguments(msg.into())
    }

    /// Create a new "name collision" error.
    pub fn name_collision(msg: impl Into<String>) -> Self {
        Self::NameCollision(msg.into())
    }

    /// Create a new "internal" error.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error surfaces as a protocol-level "invalid params" error.
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, Self::UnknownTool(_) | Self::InvalidArguments(_))
    }
}
