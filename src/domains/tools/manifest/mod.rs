//! Static manifest of the OPNsense API surface.
//!
//! The manifest is the versioned source of truth for which modules and
//! methods exist, which capability group they belong to, and which REST
//! endpoint each method maps to. Catalog construction and name decoding are
//! both driven from it, so the tool list is deterministic and does not need a
//! live appliance.
//!
//! - `base.rs` - modules shipped with every OPNsense installation
//! - `plugins.rs` - modules provided by optional `os-*` packages
//! - `params.rs` - hand-authored parameter schemas

mod base;
pub mod params;
mod plugins;

use std::collections::HashSet;

use thiserror::Error;

use super::naming::{CapabilityGroup, NameResolver, ToolKey};
use super::schema::{InputShape, SchemaSource};
use crate::backend::ModuleSurface;

/// Manifest format version, bumped whenever the built-in tables change.
pub const MANIFEST_VERSION: &str = "2024.7";

/// HTTP verb used by an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
}

/// One backend method.
#[derive(Debug, Clone)]
pub struct MethodSpec {
    /// Client-side method name, e.g. `searchAliases`.
    pub name: String,
    pub verb: Verb,
    /// Endpoint relative to `/api/`, with `{placeholder}` segments.
    pub path: String,
    pub schema: SchemaSource,
    pub description: Option<String>,
}

impl MethodSpec {
    pub fn get(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, Verb::Get, path)
    }

    pub fn post(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self::new(name, Verb::Post, path)
    }

    fn new(name: impl Into<String>, verb: Verb, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            verb,
            path: path.into(),
            schema: SchemaSource::Inferred,
            description: None,
        }
    }

    /// Override the inferred shape.
    pub fn shape(mut self, shape: InputShape) -> Self {
        self.schema = SchemaSource::Shape(shape);
        self
    }

    /// Override the inferred schema with a hand-authored one.
    pub fn schema(mut self, schema: SchemaSource) -> Self {
        self.schema = schema;
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Shortcut for methods taking no arguments.
    pub fn no_args(self) -> Self {
        self.shape(InputShape::NoArguments)
    }

    /// Names of the `{placeholder}` segments in the path, optional
    /// `{name?}` segments included.
    pub fn placeholders(&self) -> Vec<&str> {
        self.path
            .split('/')
            .filter_map(|segment| Placeholder::parse(segment).map(|p| p.name))
            .collect()
    }

    fn has_trailing_optionals(&self) -> bool {
        let mut optional_seen = false;
        for segment in self.path.split('/') {
            let optional = Placeholder::parse(segment).is_some_and(|p| p.optional);
            if optional_seen && !optional {
                return false;
            }
            optional_seen |= optional;
        }
        true
    }
}

/// A `{name}` or trailing `{name?}` path segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placeholder<'a> {
    pub name: &'a str,
    pub optional: bool,
}

impl<'a> Placeholder<'a> {
    pub fn parse(segment: &'a str) -> Option<Self> {
        let inner = segment.strip_prefix('{')?.strip_suffix('}')?;
        Some(match inner.strip_suffix('?') {
            Some(name) => Self { name, optional: true },
            None => Self { name: inner, optional: false },
        })
    }
}

/// One backend module.
#[derive(Debug, Clone)]
pub struct ModuleSpec {
    /// Module name as used in tool names, e.g. `firewall_alias`.
    pub name: String,
    /// Human-readable title used in descriptions.
    pub title: String,
    /// Firmware package providing the module (plugins only), e.g. `os-nginx`.
    pub package: Option<String>,
    pub methods: Vec<MethodSpec>,
}

impl ModuleSpec {
    pub fn new(name: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: title.into(),
            package: None,
            methods: Vec::new(),
        }
    }

    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    pub fn method(mut self, method: MethodSpec) -> Self {
        self.methods.push(method);
        self
    }

    pub fn methods(mut self, methods: impl IntoIterator<Item = MethodSpec>) -> Self {
        self.methods.extend(methods);
        self
    }

    pub fn find_method(&self, name: &str) -> Option<&MethodSpec> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Standard search/get/add/update/delete/toggle method set of an OPNsense
/// model controller.
///
/// `suffix` is the controller's command suffix: `Item` yields
/// `searchItem`, `getItem/{uuid}`, `setItem/{uuid}`, and so on.
pub fn crud(singular: &str, plural: &str, base: &str, suffix: &str) -> Vec<MethodSpec> {
    let mut methods = crud_without_toggle(singular, plural, base, suffix);
    methods.push(MethodSpec::post(
        format!("toggle{singular}"),
        format!("{base}/toggle{suffix}/{{uuid}}/{{enabled}}"),
    ));
    methods
}

/// [`crud`] for controllers without a toggle command.
pub fn crud_without_toggle(singular: &str, plural: &str, base: &str, suffix: &str) -> Vec<MethodSpec> {
    vec![
        MethodSpec::post(format!("search{plural}"), format!("{base}/search{suffix}")),
        MethodSpec::get(format!("get{singular}"), format!("{base}/get{suffix}/{{uuid}}")),
        MethodSpec::post(format!("add{singular}"), format!("{base}/add{suffix}")),
        MethodSpec::post(
            format!("update{singular}"),
            format!("{base}/set{suffix}/{{uuid}}"),
        ),
        MethodSpec::post(
            format!("delete{singular}"),
            format!("{base}/del{suffix}/{{uuid}}"),
        ),
    ]
}

/// Problems found by [`Manifest::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ManifestIssue {
    #[error("module '{0}' is declared more than once")]
    DuplicateModule(String),

    #[error("method '{1}' is declared more than once in module '{0}'")]
    DuplicateMethod(String, String),

    #[error("plugin module '{0}' has no package")]
    MissingPackage(String),

    #[error("{0}")]
    NameCollision(String),

    #[error("optional placeholder in '{0}' is not the last path segment")]
    MisplacedOptional(String),
}

/// The full module/method table.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub version: String,
    pub core: Vec<ModuleSpec>,
    pub plugins: Vec<ModuleSpec>,
}

impl Manifest {
    pub fn new(core: Vec<ModuleSpec>, plugins: Vec<ModuleSpec>) -> Self {
        Self {
            version: MANIFEST_VERSION.to_string(),
            core,
            plugins,
        }
    }

    /// The manifest shipped with this build.
    pub fn builtin() -> Self {
        Self::new(base::modules(), plugins::modules())
    }

    /// Modules of one capability group, in declaration order.
    pub fn modules(&self, group: CapabilityGroup) -> &[ModuleSpec] {
        match group {
            CapabilityGroup::Core => &self.core,
            CapabilityGroup::Plugin => &self.plugins,
        }
    }

    pub fn module(&self, group: CapabilityGroup, name: &str) -> Option<&ModuleSpec> {
        self.modules(group).iter().find(|m| m.name == name)
    }

    /// Look a method up by module name regardless of group.
    pub fn find(&self, module: &str, method: &str) -> Option<(&ModuleSpec, &MethodSpec)> {
        self.core
            .iter()
            .chain(&self.plugins)
            .find(|m| m.name == module)
            .and_then(|m| m.find_method(method).map(|spec| (m, spec)))
    }

    /// Check module uniqueness, method uniqueness and tool name injectivity.
    pub fn validate(&self) -> Vec<ManifestIssue> {
        let mut issues = Vec::new();
        let mut modules = HashSet::new();
        let mut resolver = NameResolver::new();

        for group in [CapabilityGroup::Core, CapabilityGroup::Plugin] {
            for module in self.modules(group) {
                if !modules.insert(module.name.as_str()) {
                    issues.push(ManifestIssue::DuplicateModule(module.name.clone()));
                }
                if group == CapabilityGroup::Plugin && module.package.is_none() {
                    issues.push(ManifestIssue::MissingPackage(module.name.clone()));
                }

                let mut methods = HashSet::new();
                for method in &module.methods {
                    if !methods.insert(method.name.as_str()) {
                        issues.push(ManifestIssue::DuplicateMethod(
                            module.name.clone(),
                            method.name.clone(),
                        ));
                        continue;
                    }
                    if !method.has_trailing_optionals() {
                        issues.push(ManifestIssue::MisplacedOptional(method.path.clone()));
                    }
                    let key = ToolKey::new(group, module.name.as_str(), method.name.as_str());
                    if let Err(e) = resolver.register(key) {
                        issues.push(ManifestIssue::NameCollision(e.to_string()));
                    }
                }
            }
        }

        issues
    }

    /// Manifest methods of the given modules that a runtime surface does not report.
    pub fn missing_from<'a>(
        &'a self,
        surface: &ModuleSurface,
        modules: impl IntoIterator<Item = &'a ModuleSpec>,
    ) -> Vec<(&'a str, &'a str)> {
        modules
            .into_iter()
            .flat_map(|module| {
                let reported = surface.get(&module.name);
                module
                    .methods
                    .iter()
                    .filter(move |m| !reported.is_some_and(|set| set.contains(&m.name)))
                    .map(move |m| (module.name.as_str(), m.name.as_str()))
            })
            .collect()
    }
}
