//! Tool naming: `(group, module, method)` to tool name and back.
//!
//! Names are `{module}_{method}` for core tools and `plugin_{module}_{method}`
//! for plugin tools. Module names may contain underscores themselves, so
//! decoding never splits naively: it first consults the exact table of
//! registered names, then falls back to longest-prefix matching against the
//! registered module names.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::ToolError;

/// Separator between name segments.
pub const SEPARATOR: char = '_';

/// Prefix carried by every plugin tool name.
pub const PLUGIN_PREFIX: &str = "plugin";

/// Capability group a module belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityGroup {
    /// Always active.
    Core,
    /// Active only when plugins are enabled.
    Plugin,
}

impl CapabilityGroup {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Core => "core",
            Self::Plugin => "plugin",
        }
    }

    /// Name prefix for this group, if any.
    pub fn prefix(self) -> Option<&'static str> {
        match self {
            Self::Core => None,
            Self::Plugin => Some(PLUGIN_PREFIX),
        }
    }
}

impl fmt::Display for CapabilityGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully qualified identity of a backend method.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToolKey {
    pub group: CapabilityGroup,
    pub module: String,
    pub method: String,
}

impl ToolKey {
    pub fn new(group: CapabilityGroup, module: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            group,
            module: module.into(),
            method: method.into(),
        }
    }

    /// The tool name for this key.
    pub fn tool_name(&self) -> String {
        encode(self.group, &self.module, &self.method)
    }
}

impl fmt::Display for ToolKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.module, self.method)
    }
}

/// Encode a tool name.
pub fn encode(group: CapabilityGroup, module: &str, method: &str) -> String {
    match group.prefix() {
        Some(prefix) => format!("{prefix}{SEPARATOR}{module}{SEPARATOR}{method}"),
        None => format!("{module}{SEPARATOR}{method}"),
    }
}

/// Decodes tool names registered from the active catalog.
#[derive(Debug, Default)]
pub struct NameResolver {
    exact: HashMap<String, ToolKey>,
    keys: HashSet<ToolKey>,
    /// Registered modules, longest name first.
    modules: Vec<(CapabilityGroup, String)>,
}

impl NameResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key. Fails if its name is already taken by another key.
    pub fn register(&mut self, key: ToolKey) -> Result<String, ToolError> {
        let name = key.tool_name();
        if let Some(existing) = self.exact.get(&name) {
            if existing != &key {
                return Err(ToolError::name_collision(format!(
                    "'{}' is produced by both {} ({}) and {} ({})",
                    name, existing, existing.group, key, key.group
                )));
            }
            return Ok(name);
        }

        let module = (key.group, key.module.clone());
        if !self.modules.contains(&module) {
            self.modules.push(module);
            self.modules
                .sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.cmp(b)));
        }

        self.keys.insert(key.clone());
        self.exact.insert(name.clone(), key);
        Ok(name)
    }

    /// Number of registered names.
    pub fn len(&self) -> usize {
        self.exact.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty()
    }

    /// Resolve a tool name to its key.
    pub fn decode(&self, name: &str) -> Result<ToolKey, ToolError> {
        if let Some(key) = self.exact.get(name) {
            return Ok(key.clone());
        }

        self.decompose(name)
            .filter(|key| self.keys.contains(key))
            .ok_or_else(|| ToolError::unknown_tool(name))
    }

    /// Split a name by longest registered module prefix.
    pub(crate) fn decompose(&self, name: &str) -> Option<ToolKey> {
        let plugin_rest = name
            .strip_prefix(PLUGIN_PREFIX)
            .and_then(|rest| rest.strip_prefix(SEPARATOR));

        self.modules.iter().find_map(|(group, module)| {
            let rest = match group {
                CapabilityGroup::Plugin => plugin_rest?,
                CapabilityGroup::Core => name,
            };
            let method = rest.strip_prefix(module.as_str())?.strip_prefix(SEPARATOR)?;
            (!method.is_empty()).then(|| ToolKey::new(*group, module.clone(), method))
        })
    }
}
