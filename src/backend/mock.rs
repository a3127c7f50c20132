//! Scripted in-memory backend for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rmcp::model::JsonObject;
use serde_json::{Value, json};

use super::{Backend, BackendError, BackendFactory, ConnectionSettings, ModuleSurface};

type Reply = Box<dyn Fn() -> Result<Value, BackendError> + Send + Sync>;

enum Scripted {
    Reply(Reply),
    Panic(String),
}

/// A recorded invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub module: String,
    pub method: String,
    pub args: JsonObject,
}

/// Backend returning canned results and recording every call.
///
/// Unscripted methods echo their identity and arguments back.
#[derive(Default)]
pub struct MockBackend {
    scripted: HashMap<(String, String), Scripted>,
    plugins: Option<Vec<String>>,
    surface: Option<ModuleSurface>,
    calls: Mutex<Vec<Invocation>>,
    probes: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reply(mut self, module: &str, method: &str, value: Value) -> Self {
        self.scripted.insert(
            (module.to_string(), method.to_string()),
            Scripted::Reply(Box::new(move || Ok(value.clone()))),
        );
        self
    }

    pub fn with_error(
        mut self,
        module: &str,
        method: &str,
        error: impl Fn() -> BackendError + Send + Sync + 'static,
    ) -> Self {
        self.scripted.insert(
            (module.to_string(), method.to_string()),
            Scripted::Reply(Box::new(move || Err(error()))),
        );
        self
    }

    pub fn with_panic(mut self, module: &str, method: &str, message: &str) -> Self {
        self.scripted.insert(
            (module.to_string(), method.to_string()),
            Scripted::Panic(message.to_string()),
        );
        self
    }

    /// Report these packages as installed.
    pub fn with_plugins(mut self, packages: &[&str]) -> Self {
        self.plugins = Some(packages.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn with_surface(mut self, surface: ModuleSurface) -> Self {
        self.surface = Some(surface);
        self
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn call(
        &self,
        module: &str,
        method: &str,
        args: JsonObject,
    ) -> Result<Value, BackendError> {
        self.calls.lock().unwrap().push(Invocation {
            module: module.to_string(),
            method: method.to_string(),
            args: args.clone(),
        });

        match self.scripted.get(&(module.to_string(), method.to_string())) {
            Some(Scripted::Reply(reply)) => reply(),
            Some(Scripted::Panic(message)) => panic!("{}", message),
            None => Ok(json!({ "module": module, "method": method, "args": args })),
        }
    }

    async fn installed_plugins(&self) -> Result<Vec<String>, BackendError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        self.plugins
            .clone()
            .ok_or_else(|| BackendError::http(403, "Forbidden", None))
    }

    fn surface(&self) -> Option<ModuleSurface> {
        self.surface.clone()
    }
}

/// Factory handing out one shared [`MockBackend`].
pub struct MockFactory {
    backend: Arc<MockBackend>,
    connections: Mutex<Vec<ConnectionSettings>>,
    fail: bool,
}

impl MockFactory {
    pub fn new(backend: MockBackend) -> Self {
        Self {
            backend: Arc::new(backend),
            connections: Mutex::new(Vec::new()),
            fail: false,
        }
    }

    /// A factory whose `connect` always fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(MockBackend::new())
        }
    }

    pub fn backend(&self) -> Arc<MockBackend> {
        self.backend.clone()
    }

    pub fn connections(&self) -> Vec<ConnectionSettings> {
        self.connections.lock().unwrap().clone()
    }
}

impl BackendFactory for MockFactory {
    fn connect(&self, settings: &ConnectionSettings) -> Result<Arc<dyn Backend>, BackendError> {
        if self.fail {
            return Err(BackendError::request("invalid TLS configuration"));
        }
        self.connections.lock().unwrap().push(settings.clone());
        Ok(self.backend.clone())
    }
}
