//! MCP Server implementation and lifecycle management.
//!
//! This module contains the main server handler that implements the MCP
//! protocol by delegating to the tool registry.
//!
//! ## Tool Architecture
//!
//! Tools are not declared one by one: the registry generates them from the
//! OPNsense manifest in `domains/tools/manifest/`. This handler only lists
//! and dispatches, so **adding an endpoint does NOT require modifying this
//! file!**

use rmcp::{
    ErrorData as McpError, RoleServer, ServerHandler, model::*, service::RequestContext,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::config::Config;
use crate::domains::tools::{CONFIGURE_CONNECTION, ToolError, ToolRegistry};

const INSTRUCTIONS: &str = "Manage an OPNsense firewall through its REST API. Call \
    'configure_connection' first with the appliance URL and an API key/secret; the full tool \
    list becomes available afterwards. Tool names follow '<module>_<method>', and plugin tools \
    are prefixed with 'plugin_'.";

/// The main MCP server handler.
///
/// This struct implements the `ServerHandler` trait from rmcp. Clones share
/// the same registry, so a connection configured on one transport session is
/// visible to every other.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Tool catalog, connection state and dispatcher.
    registry: Arc<ToolRegistry>,
}

impl McpServer {
    /// Create a new MCP server with the given configuration.
    pub fn new(config: Config) -> super::Result<Self> {
        let registry = ToolRegistry::from_config(&config)?;
        Ok(Self::with_registry(config, registry))
    }

    /// Create a server around an existing registry.
    pub fn with_registry(config: Config, registry: ToolRegistry) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Usage instructions reported at initialization.
    pub fn instructions(&self) -> &'static str {
        INSTRUCTIONS
    }

    // ========================================================================
    // HTTP Transport Support Methods
    // ========================================================================

    /// List the advertised tools (for HTTP transport).
    pub fn list_tools(&self) -> Vec<serde_json::Value> {
        self.registry
            .list_tools()
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect()
    }

    /// Call a tool by name (for HTTP transport).
    ///
    /// Only an unknown tool name or a non-object argument value is an
    /// error; every other outcome is a tool result.
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: serde_json::Value,
    ) -> Result<CallToolResult, ToolError> {
        let args = match arguments {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Null => JsonObject::new(),
            _ => return Err(ToolError::invalid_arguments("arguments must be an object")),
        };
        self.registry.call_tool(name, args).await
    }
}

impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities::builder()
                .enable_tools()
                .enable_tool_list_changed()
                .build(),
            server_info: Implementation {
                name: self.config.server.name.clone(),
                version: self.config.server.version.clone(),
                ..Implementation::from_build_env()
            },
            ..Default::default()
        }
    }

    #[instrument(skip(self, _context))]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let tools = self.registry.list_tools();
        info!("Listing {} tools", tools.len());
        Ok(ListToolsResult {
            tools,
            next_cursor: None,
            meta: None,
        })
    }

    #[instrument(skip(self, request, context), fields(tool = %request.name))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let was_configured = self.registry.is_configured();
        let args = request.arguments.unwrap_or_default();

        let result = self
            .registry
            .call_tool(&request.name, args)
            .await
            .map_err(|e| {
                if e.is_protocol_error() {
                    McpError::invalid_params(e.to_string(), None)
                } else {
                    McpError::internal_error(e.to_string(), None)
                }
            })?;

        if request.name == CONFIGURE_CONNECTION
            && result.is_error != Some(true)
            && !was_configured
        {
            debug!("Catalog expanded, notifying client");
            if let Err(e) = context.peer.notify_tool_list_changed().await {
                warn!("Failed to send tools/list_changed notification: {}", e);
            }
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{MockBackend, MockFactory};
    use crate::domains::tools::manifest::Manifest;
    use serde_json::json;

    fn server() -> McpServer {
        let factory = Arc::new(MockFactory::new(MockBackend::new()));
        let registry = ToolRegistry::new(Arc::new(Manifest::builtin()), factory, false).unwrap();
        McpServer::with_registry(Config::default(), registry)
    }

    #[test]
    fn test_info_advertises_list_changed() {
        let info = server().get_info();
        let tools = info.capabilities.tools.unwrap();
        assert_eq!(tools.list_changed, Some(true));
        assert_eq!(info.server_info.name, "opnsense-mcp-server");
    }

    #[tokio::test]
    async fn test_http_call_flow() {
        let server = server();
        assert_eq!(server.list_tools().len(), 1);

        let result = server
            .call_tool(
                CONFIGURE_CONNECTION,
                json!({ "url": "https://fw", "apiKey": "k", "apiSecret": "s" }),
            )
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(false));
        assert!(server.list_tools().len() > 1);

        let result = server
            .call_tool("system_getStatus", serde_json::Value::Null)
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(false));
    }

    #[tokio::test]
    async fn test_http_call_rejects_non_object_arguments() {
        let err = server()
            .call_tool("system_getStatus", json!([1, 2]))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[tokio::test]
    async fn test_clones_share_connection() {
        let server = server();
        let other = server.clone();
        server
            .call_tool(
                CONFIGURE_CONNECTION,
                json!({ "url": "https://fw", "apiKey": "k", "apiSecret": "s" }),
            )
            .await
            .unwrap();
        assert!(other.registry().is_configured());
    }
}
