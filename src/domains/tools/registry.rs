//! Tool Registry - central listing and dispatch for all tools.
//!
//! The registry ties the manifest, the capability flags, the shared
//! connection context and the dispatcher together. Both the rmcp handler
//! (STDIO/TCP) and the HTTP transport go through it.

use std::sync::Arc;
use std::time::Duration;

use rmcp::model::{CallToolResult, JsonObject, Tool};
use tracing::{info, warn};

use super::availability::Availability;
use super::catalog::{Catalog, ToolDescriptor};
use super::connection::ConnectionManager;
use super::context::SharedContext;
use super::dispatch::Dispatcher;
use super::error::ToolError;
use super::manifest::Manifest;
use crate::backend::{BackendFactory, ConnectionSettings, OpnsenseFactory};
use crate::core::config::Config;

/// Tool registry - owns the catalog and the connection state.
#[derive(Clone)]
pub struct ToolRegistry {
    manifest: Arc<Manifest>,
    catalog: Arc<Catalog>,
    connection: ConnectionManager,
    dispatcher: Dispatcher,
}

impl ToolRegistry {
    /// Create a registry over `manifest`, building clients with `factory`.
    pub fn new(
        manifest: Arc<Manifest>,
        factory: Arc<dyn BackendFactory>,
        plugins_enabled: bool,
    ) -> Result<Self, ToolError> {
        let availability = Arc::new(Availability::new(&manifest, plugins_enabled));
        let catalog = Arc::new(Catalog::build(&manifest, &availability)?);
        let connection = ConnectionManager::new(
            SharedContext::new(),
            factory,
            manifest.clone(),
            availability.clone(),
        );
        let dispatcher = Dispatcher::new(catalog.clone(), availability, connection.clone());

        info!(
            "Tool catalog built: {} tools (manifest {}, plugins {})",
            catalog.len(),
            manifest.version,
            if plugins_enabled { "enabled" } else { "disabled" }
        );

        Ok(Self {
            manifest,
            catalog,
            connection,
            dispatcher,
        })
    }

    /// Create the production registry from server configuration.
    ///
    /// When the configuration carries complete connection settings the
    /// registry starts out configured.
    pub fn from_config(config: &Config) -> crate::core::Result<Self> {
        let manifest = Manifest::builtin();
        let issues = manifest.validate();
        if !issues.is_empty() {
            let details: Vec<String> = issues.iter().map(ToString::to_string).collect();
            return Err(crate::core::Error::config(format!(
                "invalid tool manifest: {}",
                details.join("; ")
            )));
        }

        let manifest = Arc::new(manifest);
        let factory = Arc::new(OpnsenseFactory::new(manifest.clone()));
        let registry = Self::new(manifest, factory, config.plugins.enabled)?
            .with_timeout(config.connection.timeout);

        match config.connection.settings() {
            Some(settings) => registry.connect(settings)?,
            None => warn!(
                "No OPNsense connection configured - only configure_connection is available \
                 until it is called"
            ),
        }

        Ok(registry)
    }

    /// Request timeout for clients configured through the bootstrap tool.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connection = self.connection.with_timeout(timeout);
        self.dispatcher = Dispatcher::new(
            self.catalog.clone(),
            self.dispatcher.availability().clone(),
            self.connection.clone(),
        );
        self
    }

    /// Configure the connection directly, as `configure_connection` would.
    pub fn connect(&self, settings: ConnectionSettings) -> Result<(), ToolError> {
        self.connection.connect(settings)
    }

    pub fn is_configured(&self) -> bool {
        self.connection.context().is_configured()
    }

    /// Whether plugin tools are part of the catalog.
    pub fn plugins_enabled(&self) -> bool {
        self.dispatcher.availability().plugins_enabled()
    }

    pub fn manifest(&self) -> &Manifest {
        &self.manifest
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Descriptors advertised right now.
    pub fn descriptors(&self) -> &[ToolDescriptor] {
        self.catalog.advertised(self.is_configured())
    }

    /// Names of the advertised tools.
    pub fn tool_names(&self) -> Vec<&str> {
        self.descriptors().iter().map(|t| t.name.as_str()).collect()
    }

    /// Advertised tools as Tool models.
    ///
    /// This is the single source of truth for tool metadata; every
    /// transport lists tools through it.
    pub fn list_tools(&self) -> Vec<Tool> {
        self.descriptors().iter().map(ToolDescriptor::to_tool).collect()
    }

    /// Dispatch a tool call.
    pub async fn call_tool(&self, name: &str, args: JsonObject) -> Result<CallToolResult, ToolError> {
        self.dispatcher.call_tool(name, args).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{MockBackend, MockFactory};
    use crate::domains::tools::connection::CONFIGURE_CONNECTION;
    use crate::domains::tools::response;
    use serde_json::json;

    fn registry(plugins_enabled: bool) -> (ToolRegistry, Arc<MockFactory>) {
        let factory = Arc::new(MockFactory::new(
            MockBackend::new().with_reply("system", "getStatus", json!({ "status": "ok" })),
        ));
        let registry =
            ToolRegistry::new(Arc::new(Manifest::builtin()), factory.clone(), plugins_enabled)
                .unwrap();
        (registry, factory)
    }

    fn credentials(url: &str) -> JsonObject {
        match json!({ "url": url, "apiKey": "k", "apiSecret": "s", "verifySsl": false }) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[tokio::test]
    async fn test_cold_start_then_configure() {
        let (registry, _) = registry(false);
        assert_eq!(registry.tool_names(), vec![CONFIGURE_CONNECTION]);

        let result = registry
            .call_tool("system_getStatus", JsonObject::new())
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));

        registry
            .call_tool(CONFIGURE_CONNECTION, credentials("https://fw.lan"))
            .await
            .unwrap();
        assert!(registry.is_configured());
        assert_eq!(registry.tool_names()[0], CONFIGURE_CONNECTION);
        assert!(registry.tool_names().contains(&"system_getStatus"));

        let result = registry
            .call_tool("system_getStatus", JsonObject::new())
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(false));
        assert!(response::text_of(&result).unwrap().contains("\"ok\""));
    }

    #[tokio::test]
    async fn test_listing_is_stable() {
        let (registry, _) = registry(true);
        registry
            .call_tool(CONFIGURE_CONNECTION, credentials("https://fw.lan"))
            .await
            .unwrap();
        let first: Vec<_> = registry.list_tools().into_iter().map(|t| t.name).collect();
        let second: Vec<_> = registry.list_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), registry.catalog().len());
    }

    #[tokio::test]
    async fn test_reconfigure_resets_plugin_probe() {
        let factory = Arc::new(MockFactory::new(MockBackend::new().with_plugins(&["os-nginx"])));
        let registry =
            ToolRegistry::new(Arc::new(Manifest::builtin()), factory.clone(), true).unwrap();

        for url in ["https://a.lan", "https://b.lan"] {
            registry
                .call_tool(CONFIGURE_CONNECTION, credentials(url))
                .await
                .unwrap();
            for _ in 0..2 {
                let result = registry
                    .call_tool("plugin_nginx_getStatus", JsonObject::new())
                    .await
                    .unwrap();
                assert_eq!(result.is_error, Some(false));
            }
        }
        assert_eq!(factory.backend().probe_count(), 2);
        assert_eq!(factory.backend().calls().len(), 4);
    }

    #[test]
    fn test_reports_plugin_flag() {
        assert!(registry(true).0.plugins_enabled());
        assert!(!registry(false).0.plugins_enabled());
    }

    #[test]
    fn test_connect_directly() {
        let (registry, factory) = registry(false);
        registry
            .connect(ConnectionSettings::new("https://fw", "k", "s", true))
            .unwrap();
        assert!(registry.is_configured());
        assert_eq!(factory.connections()[0].url, "https://fw");
    }

    #[test]
    fn test_timeout_reaches_settings() {
        let (registry, factory) = registry(false);
        let registry = registry.with_timeout(Duration::from_secs(7));
        let result = tokio_test::block_on(
            registry.call_tool(CONFIGURE_CONNECTION, credentials("https://fw")),
        )
        .unwrap();
        assert_eq!(result.is_error, Some(false));
        assert_eq!(factory.connections()[0].timeout, Duration::from_secs(7));
    }
}
