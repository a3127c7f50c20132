//! Transports that carry MCP traffic to the shared [`McpServer`].
//!
//! Every transport serves clones of one server, so they all see the same
//! tool registry and the same OPNsense connection:
//! - `stdio` (default feature): a single rmcp session on stdin/stdout
//! - `tcp`: one rmcp session per accepted socket
//! - `http`: plain JSON-RPC over POST (`initialize`, `tools/list`,
//!   `tools/call`) plus a `/health` probe for the connection state
//!
//! [`McpServer`]: crate::core::McpServer

mod config;
mod error;
mod service;

#[cfg(feature = "http")]
pub mod http;

#[cfg(feature = "tcp")]
pub mod tcp;

#[cfg(feature = "stdio")]
pub mod stdio;

pub use config::TransportConfig;
pub use error::{TransportError, TransportResult};
pub use service::TransportService;

#[cfg(feature = "tcp")]
pub use config::TcpConfig;

#[cfg(feature = "http")]
pub use config::HttpConfig;
