//! Boundary to the wrapped OPNsense management API.
//!
//! The tool engine only depends on the [`Backend`] trait: a module/method
//! call taking a JSON argument object and returning a JSON payload or an
//! error. [`OpnsenseClient`] is the production implementation over HTTPS;
//! tests inject scripted backends through [`BackendFactory`].

mod client;
mod error;

#[cfg(test)]
pub mod mock;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rmcp::model::JsonObject;
use serde_json::Value;

use crate::domains::tools::manifest::Manifest;

pub use client::OpnsenseClient;
pub use error::BackendError;

/// Default per-request timeout for appliance calls.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Modules and methods reported by a live backend, keyed by module name.
pub type ModuleSurface = BTreeMap<String, BTreeSet<String>>;

/// A connected management API client.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Invoke `module.method(args)`.
    async fn call(&self, module: &str, method: &str, args: JsonObject)
    -> Result<Value, BackendError>;

    /// Names of the plugins installed on the appliance.
    async fn installed_plugins(&self) -> Result<Vec<String>, BackendError>;

    /// Runtime view of the callable surface, when the client can report one.
    fn surface(&self) -> Option<ModuleSurface> {
        None
    }
}

/// Builds backends from connection settings.
pub trait BackendFactory: Send + Sync {
    /// Construct a client. Must not contact the appliance.
    fn connect(&self, settings: &ConnectionSettings) -> Result<Arc<dyn Backend>, BackendError>;
}

/// Everything needed to reach one appliance.
#[derive(Clone)]
pub struct ConnectionSettings {
    /// Base URL, e.g. `https://10.0.0.1`.
    pub url: String,
    pub api_key: String,
    pub api_secret: String,
    /// Reject self-signed or otherwise invalid certificates.
    pub verify_ssl: bool,
    pub timeout: Duration,
}

impl ConnectionSettings {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        verify_ssl: bool,
    ) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            verify_ssl,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Custom Debug implementation to redact secrets from logs.
impl std::fmt::Debug for ConnectionSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSettings")
            .field("url", &self.url)
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .field("verify_ssl", &self.verify_ssl)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Factory producing [`OpnsenseClient`] instances.
pub struct OpnsenseFactory {
    manifest: Arc<Manifest>,
}

impl OpnsenseFactory {
    pub fn new(manifest: Arc<Manifest>) -> Self {
        Self { manifest }
    }
}

impl BackendFactory for OpnsenseFactory {
    fn connect(&self, settings: &ConnectionSettings) -> Result<Arc<dyn Backend>, BackendError> {
        let client = OpnsenseClient::new(settings, self.manifest.clone())?;
        Ok(Arc::new(client))
    }
}
