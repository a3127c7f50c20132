//! STDIO transport: one MCP session over stdin/stdout, the mode desktop
//! MCP clients spawn the server in.

use rmcp::ServiceExt;
use tracing::info;

use super::{TransportError, TransportResult};
use crate::core::McpServer;

/// STDIO transport handler.
pub struct StdioTransport;

impl StdioTransport {
    /// Serve a single session until the client closes stdin.
    pub async fn run(server: McpServer) -> TransportResult<()> {
        let registry = server.registry().clone();
        info!(
            "Ready on stdin/stdout ({} tools advertised, connection {})",
            registry.list_tools().len(),
            if registry.is_configured() { "configured" } else { "pending" }
        );

        let service = server
            .serve(rmcp::transport::stdio())
            .await
            .map_err(|e| TransportError::init(e.to_string()))?;

        let reason = service
            .waiting()
            .await
            .map_err(|e| TransportError::ServiceError(e.to_string()))?;

        info!(
            "STDIO session ended ({:?}), connection {}",
            reason,
            if registry.is_configured() { "was configured" } else { "never configured" }
        );
        Ok(())
    }
}
