//! Tools domain module.
//!
//! Every OPNsense API method is exposed as its own MCP tool. The tool list
//! is generated from a static manifest rather than written by hand.
//!
//! ## Architecture
//!
//! - `manifest/` - Module/method/endpoint tables (core and plugin)
//! - `naming.rs` - Tool name encoding and decoding
//! - `schema.rs` - Input schema inference from method names
//! - `availability.rs` - Capability groups and plugin installation checks
//! - `catalog.rs` - Tool descriptor list built from the manifest
//! - `context.rs` - Shared connection state
//! - `connection.rs` - The `configure_connection` bootstrap tool
//! - `dispatch.rs` - Tool call routing and result normalization
//! - `registry.rs` - Facade used by the server and transports
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding an Endpoint
//!
//! Add a `MethodSpec` to the module in `manifest/base.rs` or
//! `manifest/plugins.rs`. The schema is inferred from the method name
//! unless one is given explicitly.

mod availability;
mod catalog;
mod connection;
mod context;
mod dispatch;
mod error;
pub mod manifest;
mod naming;
mod registry;
mod response;
mod schema;

pub use availability::Availability;
pub use catalog::{Catalog, ToolDescriptor};
pub use connection::{CONFIGURE_CONNECTION, ConfigureConnectionParams};
pub use error::ToolError;
pub use naming::{CapabilityGroup, NameResolver, ToolKey};
pub use registry::ToolRegistry;
pub use schema::{InputShape, SchemaSource};
