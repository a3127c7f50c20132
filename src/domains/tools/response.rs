//! Normalization of tool outcomes into text content.
//!
//! Every call produces exactly one text block: pretty-printed JSON for
//! backend payloads, a sentence for everything else.

use rmcp::model::{CallToolResult, Content, RawContent};
use serde_json::Value;
use tracing::warn;

use super::error::ToolError;

/// Wrap a backend payload.
pub fn success(payload: &Value) -> CallToolResult {
    let text = match payload {
        Value::String(s) => s.clone(),
        other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
    };
    CallToolResult::success(vec![Content::text(text)])
}

/// A plain informational message.
pub fn message(text: impl Into<String>) -> CallToolResult {
    CallToolResult::success(vec![Content::text(text.into())])
}

/// Render a handled failure.
///
/// A plugin that is not installed is informational rather than an error:
/// the tool was advertised and the caller did nothing wrong.
pub fn from_error(err: &ToolError) -> CallToolResult {
    match err {
        ToolError::PluginNotInstalled(_) => message(err.to_string()),
        _ => {
            warn!("{}", err);
            CallToolResult::error(vec![Content::text(err.to_string())])
        }
    }
}

/// First text block of a result.
#[cfg(test)]
pub fn text_of(result: &CallToolResult) -> Option<&str> {
    result
        .content
        .iter()
        .find_map(|c| match &c.raw {
            RawContent::Text(text) => Some(text.text.as_str()),
            _ => None,
        })
}
