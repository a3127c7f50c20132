//! OPNsense MCP Server Library
//!
//! This crate exposes the OPNsense management API as a set of Model Context
//! Protocol tools, one per API method.
//!
//! # Architecture
//!
//! - **core**: Configuration, error handling, the MCP server handler and transports
//! - **backend**: The OPNsense REST client behind the tools
//! - **domains**: Business logic organized by bounded contexts
//!   - **tools**: Manifest, naming, schema inference, catalog and dispatch
//!
//! # Example
//!
//! ```rust,no_run
//! use opnsense_mcp_server::{core::Config, core::McpServer};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::new(config)?;
//!     // Start the server...
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
