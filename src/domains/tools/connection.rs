//! Connection lifecycle: the `configure_connection` bootstrap tool and
//! access to the current client.
//!
//! Configuring never contacts the appliance. Credentials are first exercised
//! by the next real tool call, and reconfiguring simply replaces the client.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use rmcp::model::{CallToolResult, JsonObject};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{debug, info, warn};

use super::availability::Availability;
use super::context::{ClientHandle, SharedContext};
use super::error::ToolError;
use super::manifest::Manifest;
use super::naming::CapabilityGroup;
use super::response;
use crate::backend::{Backend, BackendFactory, ConnectionSettings, DEFAULT_TIMEOUT};

/// Name of the bootstrap tool.
pub const CONFIGURE_CONNECTION: &str = "configure_connection";

/// Description of the bootstrap tool.
pub const CONFIGURE_CONNECTION_DESCRIPTION: &str = "Configure the connection to an OPNsense \
    appliance. Must be called before any other tool; may be called again to switch appliance or \
    rotate credentials.";

fn default_verify_ssl() -> bool {
    true
}

/// Parameters of `configure_connection`.
#[derive(Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConfigureConnectionParams {
    /// Base URL of the appliance, e.g. "https://192.168.1.1".
    pub url: String,

    /// API key created under System > Access > Users.
    pub api_key: String,

    /// API secret belonging to the key.
    pub api_secret: String,

    /// Verify the TLS certificate (default: true). Disable for self-signed certificates.
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for ConfigureConnectionParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigureConnectionParams")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .field("verify_ssl", &self.verify_ssl)
            .finish()
    }
}

impl ConfigureConnectionParams {
    /// Check the argument shape and build connection settings.
    pub fn into_settings(self, timeout: Duration) -> Result<ConnectionSettings, ToolError> {
        let url = self.url.trim().trim_end_matches('/').to_string();
        let host = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .ok_or_else(|| {
                ToolError::invalid_arguments("url must start with http:// or https://")
            })?;
        if host.is_empty() {
            return Err(ToolError::invalid_arguments("url has no host"));
        }
        if self.api_key.trim().is_empty() {
            return Err(ToolError::invalid_arguments("apiKey must not be empty"));
        }
        if self.api_secret.trim().is_empty() {
            return Err(ToolError::invalid_arguments("apiSecret must not be empty"));
        }

        Ok(
            ConnectionSettings::new(url, self.api_key, self.api_secret, self.verify_ssl)
                .with_timeout(timeout),
        )
    }
}

/// Owns the client slot of the shared context.
#[derive(Clone)]
pub struct ConnectionManager {
    context: SharedContext,
    factory: Arc<dyn BackendFactory>,
    manifest: Arc<Manifest>,
    availability: Arc<Availability>,
    timeout: Duration,
}

impl ConnectionManager {
    pub fn new(
        context: SharedContext,
        factory: Arc<dyn BackendFactory>,
        manifest: Arc<Manifest>,
        availability: Arc<Availability>,
    ) -> Self {
        Self {
            context,
            factory,
            manifest,
            availability,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Request timeout applied to clients built from tool arguments.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn context(&self) -> &SharedContext {
        &self.context
    }

    /// Handle a `configure_connection` call.
    pub fn configure(&self, args: JsonObject) -> CallToolResult {
        let params: ConfigureConnectionParams =
            match serde_json::from_value(serde_json::Value::Object(args)) {
                Ok(params) => params,
                Err(e) => return response::from_error(&ToolError::invalid_arguments(e.to_string())),
            };
        debug!("configure_connection called with {:?}", params);

        let settings = match params.into_settings(self.timeout) {
            Ok(settings) => settings,
            Err(e) => return response::from_error(&e),
        };

        let url = settings.url.clone();
        let verify_ssl = settings.verify_ssl;
        match self.connect(settings) {
            Ok(()) => response::message(format!(
                "Successfully configured OPNsense connection to {} (SSL verification {}). \
                 Credentials will be verified on the first API call.",
                url,
                if verify_ssl { "enabled" } else { "disabled" }
            )),
            Err(e) => response::from_error(&e),
        }
    }

    /// Build a client and make it current, replacing any previous one.
    pub fn connect(&self, settings: ConnectionSettings) -> Result<(), ToolError> {
        let backend = self
            .factory
            .connect(&settings)
            .map_err(|e| ToolError::internal(format!("Failed to create client: {}", e.describe())))?;

        for (module, method) in self.unreported_methods(backend.as_ref()) {
            warn!("{}.{} is not reported by the connected client", module, method);
        }

        info!("Connection configured for {}", settings.url);
        self.context.replace_client(backend, settings);
        Ok(())
    }

    /// Active manifest methods missing from the surface a backend reports.
    fn unreported_methods(&self, backend: &dyn Backend) -> Vec<(String, String)> {
        let Some(surface) = backend.surface() else {
            return Vec::new();
        };
        let modules = self
            .availability
            .active_groups()
            .into_iter()
            .flat_map(|group| self.manifest.modules(group));
        self.manifest
            .missing_from(&surface, modules)
            .into_iter()
            .map(|(module, method)| (module.to_string(), method.to_string()))
            .collect()
    }

    /// The current client.
    pub fn client(&self, tool: &str) -> Result<ClientHandle, ToolError> {
        self.context
            .client()
            .ok_or_else(|| ToolError::not_configured(tool))
    }

    /// Whether `plugin` is installed on the appliance behind `client`.
    ///
    /// The installed set is probed once per client and cached; a failed
    /// probe leaves it unknown, which counts as not installed.
    pub async fn is_plugin_installed(&self, client: &ClientHandle, plugin: &str) -> bool {
        let installed = match self.context.installed_plugins() {
            Some(installed) => Some(installed),
            None => self.probe_plugins(client).await,
        };
        self.availability
            .is_plugin_installed(plugin, installed.as_ref())
    }

    async fn probe_plugins(&self, client: &ClientHandle) -> Option<BTreeSet<String>> {
        match client.backend.installed_plugins().await {
            Ok(packages) => {
                let installed: BTreeSet<String> = packages.into_iter().collect();
                info!("Appliance reports {} installed plugin(s)", installed.len());
                self.context
                    .record_installed_plugins(client.generation, installed.clone());
                Some(installed)
            }
            Err(e) => {
                warn!(
                    "Could not determine installed {} modules: {}",
                    CapabilityGroup::Plugin,
                    e.describe()
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ModuleSurface;
    use crate::backend::mock::{MockBackend, MockFactory};
    use serde_json::json;

    fn manager(factory: Arc<MockFactory>, plugins_enabled: bool) -> ConnectionManager {
        let manifest = Arc::new(Manifest::builtin());
        let availability = Arc::new(Availability::new(&manifest, plugins_enabled));
        ConnectionManager::new(SharedContext::new(), factory, manifest, availability)
    }

    fn args(value: serde_json::Value) -> JsonObject {
        match value {
            serde_json::Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn test_connect_compares_reported_surface() {
        let mut surface = ModuleSurface::new();
        surface.insert(
            "system".to_string(),
            BTreeSet::from(["getStatus".to_string(), "reboot".to_string()]),
        );
        let backend = MockBackend::new().with_surface(surface);
        let factory = Arc::new(MockFactory::new(backend));
        let manager = manager(factory.clone(), false);

        let missing = manager.unreported_methods(factory.backend().as_ref());
        assert!(missing.contains(&("system".to_string(), "halt".to_string())));
        assert!(missing.contains(&("firewall_alias".to_string(), "searchAliases".to_string())));
        assert!(!missing.contains(&("system".to_string(), "getStatus".to_string())));
        assert!(!missing.iter().any(|(module, _)| module == "nginx"));

        manager
            .connect(ConnectionSettings::new("https://fw", "k", "s", true))
            .unwrap();
        assert!(manager.context().is_configured());
    }

    #[test]
    fn test_no_surface_means_nothing_to_compare() {
        let factory = Arc::new(MockFactory::new(MockBackend::new()));
        let manager = manager(factory.clone(), true);
        assert!(manager.unreported_methods(factory.backend().as_ref()).is_empty());
    }

    #[test]
    fn test_configure_stores_client() {
        let factory = Arc::new(MockFactory::new(MockBackend::new()));
        let manager = manager(factory.clone(), false);

        let result = manager.configure(args(json!({
            "url": "https://10.0.0.1/",
            "apiKey": "k",
            "apiSecret": "s"
        })));

        assert_eq!(result.is_error, Some(false));
        let text = response::text_of(&result).unwrap();
        assert!(text.contains("https://10.0.0.1"));
        assert!(manager.context().is_configured());

        let connections = factory.connections();
        assert_eq!(connections.len(), 1);
        assert_eq!(connections[0].url, "https://10.0.0.1");
        assert!(connections[0].verify_ssl);
    }

    #[test]
    fn test_configure_does_not_contact_backend() {
        let factory = Arc::new(MockFactory::new(MockBackend::new()));
        let manager = manager(factory.clone(), true);
        manager.configure(args(json!({
            "url": "https://10.0.0.1",
            "apiKey": "k",
            "apiSecret": "s"
        })));
        assert!(factory.backend().calls().is_empty());
        assert_eq!(factory.backend().probe_count(), 0);
    }

    #[test]
    fn test_reconfigure_replaces() {
        let factory = Arc::new(MockFactory::new(MockBackend::new()));
        let manager = manager(factory.clone(), false);
        for url in ["https://a.example", "https://b.example"] {
            let result = manager.configure(args(json!({
                "url": url,
                "apiKey": "k",
                "apiSecret": "s",
                "verifySsl": false
            })));
            assert_eq!(result.is_error, Some(false));
        }
        assert_eq!(factory.connections().len(), 2);
        assert_eq!(manager.context().settings().unwrap().url, "https://b.example");
        assert!(!manager.context().settings().unwrap().verify_ssl);
    }

    #[test]
    fn test_configure_rejects_bad_shape() {
        let factory = Arc::new(MockFactory::new(MockBackend::new()));
        let manager = manager(factory, false);

        let missing = manager.configure(args(json!({ "url": "https://10.0.0.1" })));
        assert_eq!(missing.is_error, Some(true));

        let bad_url = manager.configure(args(json!({
            "url": "10.0.0.1",
            "apiKey": "k",
            "apiSecret": "s"
        })));
        assert_eq!(bad_url.is_error, Some(true));
        assert!(response::text_of(&bad_url).unwrap().contains("http"));

        let empty_key = manager.configure(args(json!({
            "url": "https://10.0.0.1",
            "apiKey": " ",
            "apiSecret": "s"
        })));
        assert_eq!(empty_key.is_error, Some(true));
        assert!(!manager.context().is_configured());
    }

    #[test]
    fn test_factory_failure_is_normalized() {
        let manager = manager(Arc::new(MockFactory::failing()), false);
        let result = manager.configure(args(json!({
            "url": "https://10.0.0.1",
            "apiKey": "k",
            "apiSecret": "s"
        })));
        assert_eq!(result.is_error, Some(true));
        assert!(response::text_of(&result).unwrap().contains("invalid TLS configuration"));
        assert!(!manager.context().is_configured());
    }

    #[test]
    fn test_client_requires_configuration() {
        let manager = manager(Arc::new(MockFactory::new(MockBackend::new())), false);
        assert!(matches!(
            manager.client("system_getStatus"),
            Err(ToolError::ClientNotConfigured(_))
        ));
    }

    #[tokio::test]
    async fn test_plugin_probe_is_cached() {
        let factory = Arc::new(MockFactory::new(MockBackend::new().with_plugins(&["os-nginx"])));
        let manager = manager(factory.clone(), true);
        manager
            .connect(ConnectionSettings::new("https://fw", "k", "s", true))
            .unwrap();
        let client = manager.client("x").unwrap();

        assert!(manager.is_plugin_installed(&client, "nginx").await);
        assert!(!manager.is_plugin_installed(&client, "haproxy").await);
        assert_eq!(factory.backend().probe_count(), 1);
    }

    #[tokio::test]
    async fn test_failed_probe_counts_as_not_installed() {
        let factory = Arc::new(MockFactory::new(MockBackend::new()));
        let manager = manager(factory.clone(), true);
        manager
            .connect(ConnectionSettings::new("https://fw", "k", "s", true))
            .unwrap();
        let client = manager.client("x").unwrap();

        assert!(!manager.is_plugin_installed(&client, "nginx").await);
        assert!(!manager.is_plugin_installed(&client, "nginx").await);
        assert_eq!(factory.backend().probe_count(), 2);
    }

    #[test]
    fn test_params_debug_redacts_secrets() {
        let params = ConfigureConnectionParams {
            url: "https://fw".to_string(),
            api_key: "key123".to_string(),
            api_secret: "secret456".to_string(),
            verify_ssl: true,
        };
        let debug_str = format!("{:?}", params);
        assert!(!debug_str.contains("key123"));
        assert!(!debug_str.contains("secret456"));
    }
}
