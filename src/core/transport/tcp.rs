//! TCP transport: line-delimited JSON-RPC, one rmcp session per socket.
//!
//! Sessions share the server's registry, so `configure_connection` on one
//! socket configures the appliance connection for all of them.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rmcp::ServiceExt;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use super::{TransportError, TransportResult, config::TcpConfig};
use crate::core::McpServer;

/// Pause after a failed `accept` before trying again.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

/// TCP transport handler.
pub struct TcpTransport {
    config: TcpConfig,
    sessions: Arc<AtomicUsize>,
}

impl TcpTransport {
    pub fn new(config: TcpConfig) -> Self {
        Self {
            config,
            sessions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Bind address, `host:port`.
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.host, self.config.port)
    }

    /// Number of sessions currently being served.
    pub fn active_sessions(&self) -> usize {
        self.sessions.load(Ordering::SeqCst)
    }

    /// Bind and serve connections. Returns only if binding fails.
    pub async fn run(self, server: McpServer) -> TransportResult<()> {
        let addr = self.address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| TransportError::bind(&addr, e))?;

        info!(
            "Ready - listening on {} (connection {})",
            addr,
            if server.registry().is_configured() { "configured" } else { "pending" }
        );

        loop {
            match listener.accept().await {
                Ok((stream, peer)) => {
                    if let Err(e) = stream.set_nodelay(true) {
                        warn!("Failed to set TCP_NODELAY for {}: {}", peer, e);
                    }
                    let server = server.clone();
                    let sessions = self.sessions.clone();
                    tokio::spawn(async move {
                        let active = sessions.fetch_add(1, Ordering::SeqCst) + 1;
                        debug!("Session opened for {} ({} active)", peer, active);
                        serve_session(server, stream, peer).await;
                        sessions.fetch_sub(1, Ordering::SeqCst);
                    });
                }
                Err(e) => {
                    warn!("Failed to accept connection: {}", e);
                    tokio::time::sleep(ACCEPT_BACKOFF).await;
                }
            }
        }
    }
}

async fn serve_session(server: McpServer, stream: TcpStream, peer: SocketAddr) {
    let service = match server.serve(stream).await {
        Ok(service) => service,
        Err(e) => {
            warn!("MCP handshake with {} failed: {}", peer, e);
            return;
        }
    };
    info!("Client {} connected", peer);

    match service.waiting().await {
        Ok(reason) => info!("Client {} disconnected ({:?})", peer, reason),
        Err(e) => warn!("Session with {} aborted: {}", peer, e),
    }
}
