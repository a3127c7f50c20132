//! Process-wide connection state shared by every tool call.
//!
//! The context is passed around explicitly rather than living in a global,
//! so independent servers (and tests) never share a client. The lock is
//! only held for field reads and single-field replacements; it is never held
//! across an await. A call that captured a client keeps using it even if
//! `configure_connection` swaps in a new one meanwhile.

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::backend::{Backend, ConnectionSettings};

/// Mutable server state.
#[derive(Default)]
pub struct ServerContext {
    client: Option<Arc<dyn Backend>>,
    settings: Option<ConnectionSettings>,
    /// Packages confirmed installed on the current appliance; `None` until probed.
    installed_plugins: Option<BTreeSet<String>>,
    /// Bumped on every reconfiguration.
    generation: u64,
}

impl std::fmt::Debug for ServerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerContext")
            .field("configured", &self.client.is_some())
            .field("settings", &self.settings)
            .field("installed_plugins", &self.installed_plugins)
            .field("generation", &self.generation)
            .finish()
    }
}

/// A client captured for the duration of one call.
#[derive(Clone)]
pub struct ClientHandle {
    pub backend: Arc<dyn Backend>,
    pub generation: u64,
}

/// Cheaply clonable handle to the shared [`ServerContext`].
#[derive(Clone, Default, Debug)]
pub struct SharedContext(Arc<RwLock<ServerContext>>);

impl SharedContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, ServerContext> {
        self.0.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, ServerContext> {
        self.0.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_configured(&self) -> bool {
        self.read().client.is_some()
    }

    /// Capture the current client, if any.
    pub fn client(&self) -> Option<ClientHandle> {
        let ctx = self.read();
        ctx.client.as_ref().map(|backend| ClientHandle {
            backend: backend.clone(),
            generation: ctx.generation,
        })
    }

    #[cfg(test)]
    pub fn settings(&self) -> Option<ConnectionSettings> {
        self.read().settings.clone()
    }

    /// Replace the client. Forgets everything learned about the previous appliance.
    pub fn replace_client(&self, backend: Arc<dyn Backend>, settings: ConnectionSettings) -> u64 {
        let mut ctx = self.write();
        ctx.client = Some(backend);
        ctx.settings = Some(settings);
        ctx.installed_plugins = None;
        ctx.generation += 1;
        ctx.generation
    }

    pub fn installed_plugins(&self) -> Option<BTreeSet<String>> {
        self.read().installed_plugins.clone()
    }

    /// Store probe results, unless the client was replaced since `generation`.
    pub fn record_installed_plugins(&self, generation: u64, installed: BTreeSet<String>) -> bool {
        let mut ctx = self.write();
        if ctx.generation != generation {
            return false;
        }
        ctx.installed_plugins = Some(installed);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::MockBackend;

    fn settings() -> ConnectionSettings {
        ConnectionSettings::new("https://10.0.0.1", "k", "s", true)
    }

    #[test]
    fn test_starts_unconfigured() {
        let ctx = SharedContext::new();
        assert!(!ctx.is_configured());
        assert!(ctx.client().is_none());
        assert!(ctx.settings().is_none());
        assert!(ctx.installed_plugins().is_none());
    }

    #[test]
    fn test_replace_resets_plugins() {
        let ctx = SharedContext::new();
        let generation = ctx.replace_client(Arc::new(MockBackend::new()), settings());
        assert!(ctx.record_installed_plugins(generation, BTreeSet::from(["os-nginx".to_string()])));
        assert!(ctx.installed_plugins().is_some());

        ctx.replace_client(Arc::new(MockBackend::new()), settings());
        assert!(ctx.installed_plugins().is_none());
    }

    #[test]
    fn test_stale_probe_is_discarded() {
        let ctx = SharedContext::new();
        let old = ctx.replace_client(Arc::new(MockBackend::new()), settings());
        ctx.replace_client(Arc::new(MockBackend::new()), settings());
        assert!(!ctx.record_installed_plugins(old, BTreeSet::new()));
        assert!(ctx.installed_plugins().is_none());
    }

    #[test]
    fn test_captured_client_survives_replacement() {
        let ctx = SharedContext::new();
        let first = Arc::new(MockBackend::new());
        ctx.replace_client(first.clone(), settings());
        let handle = ctx.client().unwrap();

        ctx.replace_client(Arc::new(MockBackend::new()), settings());
        let current = ctx.client().unwrap();
        assert_ne!(handle.generation, current.generation);
        assert_eq!(Arc::strong_count(&first), 2);
    }
}
