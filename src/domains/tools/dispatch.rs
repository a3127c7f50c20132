//! Tool call dispatch.
//!
//! A call runs these steps in order and stops at the first that produces a
//! result:
//!
//! 1. `configure_connection` is handled by the connection manager.
//! 2. Without a client, every other name yields a "not configured" message.
//! 3. The name is decoded; an unknown name is the only protocol-level error.
//! 4. The module's capability group must be active and, for plugins, the
//!    plugin must be installed on the appliance.
//! 5. The backend method is invoked.
//! 6. Success or failure is normalized into a text block.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use rmcp::model::{CallToolResult, JsonObject};
use tracing::{debug, info, instrument, warn};

use super::availability::Availability;
use super::catalog::Catalog;
use super::connection::{CONFIGURE_CONNECTION, ConnectionManager};
use super::error::ToolError;
use super::naming::CapabilityGroup;
use super::response;
use crate::backend::BackendError;

/// Routes tool calls to the backend.
#[derive(Clone)]
pub struct Dispatcher {
    catalog: Arc<Catalog>,
    availability: Arc<Availability>,
    connection: ConnectionManager,
}

impl Dispatcher {
    pub fn new(
        catalog: Arc<Catalog>,
        availability: Arc<Availability>,
        connection: ConnectionManager,
    ) -> Self {
        Self {
            catalog,
            availability,
            connection,
        }
    }

    pub fn availability(&self) -> &Arc<Availability> {
        &self.availability
    }

    /// Execute one tool call.
    ///
    /// Returns `Err` only for [`ToolError::UnknownTool`].
    #[instrument(skip(self, args), fields(tool = %name))]
    pub async fn call_tool(&self, name: &str, args: JsonObject) -> Result<CallToolResult, ToolError> {
        if name == CONFIGURE_CONNECTION {
            return Ok(self.connection.configure(args));
        }

        let client = match self.connection.client(name) {
            Ok(client) => client,
            Err(e) => return Ok(response::from_error(&e)),
        };

        let key = self.catalog.resolver().decode(name).inspect_err(|_| {
            warn!("Unknown tool requested: {}", name);
        })?;

        if !self.availability.is_available(key.group, &key.module) {
            return Ok(response::from_error(&ToolError::capability_unavailable(
                name, key.group,
            )));
        }

        if key.group == CapabilityGroup::Plugin
            && !self
                .connection
                .is_plugin_installed(&client, &key.module)
                .await
        {
            return Ok(response::from_error(&ToolError::plugin_not_installed(
                &key.module,
            )));
        }

        debug!("Invoking {}", key);
        let outcome = AssertUnwindSafe(client.backend.call(&key.module, &key.method, args))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(BackendError::Panicked(panic_message(panic))));

        match outcome {
            Ok(payload) => {
                info!("{} succeeded", key);
                Ok(response::success(&payload))
            }
            Err(e) => Ok(response::from_error(&ToolError::backend_failed(
                name,
                key,
                e.describe(),
            ))),
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> Option<String> {
    panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
}
