//! Tool catalog construction.
//!
//! The catalog is the bootstrap tool followed by one descriptor per method of
//! every available module, core modules first, both in manifest order. It is
//! a pure function of the manifest and the availability flags, so building
//! it twice yields the same list.

use std::sync::Arc;

use rmcp::handler::server::tool::cached_schema_for_type;
use rmcp::model::{JsonObject, Tool};

use super::availability::Availability;
use super::connection::{CONFIGURE_CONNECTION, CONFIGURE_CONNECTION_DESCRIPTION, ConfigureConnectionParams};
use super::error::ToolError;
use super::manifest::{Manifest, MethodSpec, ModuleSpec};
use super::naming::{CapabilityGroup, NameResolver, ToolKey};

/// A tool as advertised to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Arc<JsonObject>,
    /// Backend method behind the tool; `None` for the bootstrap tool.
    pub key: Option<ToolKey>,
}

impl ToolDescriptor {
    /// Create a Tool model for this descriptor.
    pub fn to_tool(&self) -> Tool {
        Tool {
            name: self.name.clone().into(),
            description: Some(self.description.clone().into()),
            input_schema: self.input_schema.clone(),
            annotations: None,
            output_schema: None,
            icons: None,
            meta: None,
            title: None,
        }
    }
}

/// Descriptor of `configure_connection`.
pub fn bootstrap_descriptor() -> ToolDescriptor {
    ToolDescriptor {
        name: CONFIGURE_CONNECTION.to_string(),
        description: CONFIGURE_CONNECTION_DESCRIPTION.to_string(),
        input_schema: cached_schema_for_type::<ConfigureConnectionParams>(),
        key: None,
    }
}

/// The full catalog for a configured connection, plus the resolver for its names.
#[derive(Debug)]
pub struct Catalog {
    tools: Vec<ToolDescriptor>,
    resolver: NameResolver,
}

impl Catalog {
    /// Build the catalog for the given availability.
    pub fn build(manifest: &Manifest, availability: &Availability) -> Result<Self, ToolError> {
        let mut tools = vec![bootstrap_descriptor()];
        let mut resolver = NameResolver::new();

        for group in availability.active_groups() {
            for module in manifest.modules(group) {
                if !availability.is_available(group, &module.name) {
                    continue;
                }
                for method in &module.methods {
                    let key = ToolKey::new(group, module.name.as_str(), method.name.as_str());
                    let name = resolver.register(key.clone())?;
                    if name == CONFIGURE_CONNECTION {
                        return Err(ToolError::name_collision(format!(
                            "{} shadows the bootstrap tool",
                            key
                        )));
                    }
                    tools.push(ToolDescriptor {
                        name,
                        description: describe(group, module, method),
                        input_schema: method.schema.resolve(&method.name),
                        key: Some(key),
                    });
                }
            }
        }

        Ok(Self { tools, resolver })
    }

    /// Every descriptor, bootstrap first.
    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    /// Descriptors advertised for the current connection state.
    ///
    /// Without a client only the bootstrap tool is listed.
    pub fn advertised(&self, configured: bool) -> &[ToolDescriptor] {
        if configured {
            &self.tools
        } else {
            &self.tools[..1]
        }
    }

    pub fn resolver(&self) -> &NameResolver {
        &self.resolver
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

fn describe(group: CapabilityGroup, module: &ModuleSpec, method: &MethodSpec) -> String {
    let summary = method
        .description
        .clone()
        .unwrap_or_else(|| humanize(&method.name));
    match group {
        CapabilityGroup::Core => format!("{}: {}", module.title, summary),
        CapabilityGroup::Plugin => format!(
            "{} (plugin {}): {}",
            module.title,
            module.package.as_deref().unwrap_or(&module.name),
            summary
        ),
    }
}

/// `searchHostOverrides` -> `Search host overrides`.
fn humanize(method: &str) -> String {
    let mut out = String::with_capacity(method.len() + 4);
    for (i, c) in method.chars().enumerate() {
        if i == 0 {
            out.extend(c.to_uppercase());
        } else if c.is_uppercase() {
            out.push(' ');
            out.extend(c.to_lowercase());
        } else if c == '_' {
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domains::tools::manifest::Verb;
    use serde_json::Value;

    fn catalog(plugins_enabled: bool) -> Catalog {
        let manifest = Manifest::builtin();
        Catalog::build(&manifest, &Availability::new(&manifest, plugins_enabled)).unwrap()
    }

    #[test]
    fn test_bootstrap_first_and_unique() {
        let catalog = catalog(true);
        assert_eq!(catalog.tools()[0].name, CONFIGURE_CONNECTION);
        let count = catalog
            .tools()
            .iter()
            .filter(|t| t.name == CONFIGURE_CONNECTION)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_unconfigured_lists_only_bootstrap() {
        let catalog = catalog(true);
        let advertised = catalog.advertised(false);
        assert_eq!(advertised.len(), 1);
        assert_eq!(advertised[0].name, CONFIGURE_CONNECTION);
        assert!(catalog.advertised(true).len() > 1);
    }

    #[test]
    fn test_bootstrap_schema() {
        let schema = bootstrap_descriptor().input_schema;
        let required: Vec<_> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert!(required.contains(&"url"));
        assert!(required.contains(&"apiKey"));
        assert!(required.contains(&"apiSecret"));
        assert!(!required.contains(&"verifySsl"));
        assert!(schema["properties"].get("verifySsl").is_some());
    }

    #[test]
    fn test_plugins_hidden_when_disabled() {
        let catalog = catalog(false);
        assert!(
            catalog
                .tools()
                .iter()
                .all(|t| !t.name.starts_with("plugin_"))
        );
        assert!(catalog.get("plugin_nginx_getStatus").is_none());
        assert!(catalog.get("system_getStatus").is_some());
    }

    #[test]
    fn test_plugins_listed_when_enabled() {
        let catalog = catalog(true);
        let nginx = catalog.get("plugin_nginx_getStatus").unwrap();
        assert_eq!(nginx.key.as_ref().unwrap().group, CapabilityGroup::Plugin);
        assert!(nginx.description.contains("os-nginx"));
        assert!(catalog.get("plugin_zabbix_agent_get").is_some());
    }

    #[test]
    fn test_build_is_idempotent() {
        let manifest = Manifest::builtin();
        let availability = Availability::new(&manifest, true);
        let first = Catalog::build(&manifest, &availability).unwrap();
        let second = Catalog::build(&manifest, &availability).unwrap();
        assert_eq!(first.tools(), second.tools());
    }

    #[test]
    fn test_every_tool_round_trips() {
        let catalog = catalog(true);
        for tool in &catalog.tools()[1..] {
            let key = tool.key.as_ref().unwrap();
            assert_eq!(&catalog.resolver().decode(&tool.name).unwrap(), key);
            assert_eq!(key.tool_name(), tool.name);
        }
        assert_eq!(catalog.resolver().len(), catalog.len() - 1);
    }

    #[test]
    fn test_placeholders_are_declared_in_schema() {
        let manifest = Manifest::builtin();
        let catalog = catalog(true);
        for tool in &catalog.tools()[1..] {
            let key = tool.key.as_ref().unwrap();
            let (_, method) = manifest.find(&key.module, &key.method).unwrap();
            let properties = tool.input_schema["properties"].as_object().unwrap();
            for placeholder in method.placeholders() {
                assert!(
                    properties.contains_key(placeholder),
                    "{} does not declare '{}'",
                    tool.name,
                    placeholder
                );
            }
        }
    }

    #[test]
    fn test_data_body_leaves_no_stray_arguments() {
        let manifest = Manifest::builtin();
        let catalog = catalog(true);
        let mut stray = Vec::new();
        for tool in &catalog.tools()[1..] {
            let key = tool.key.as_ref().unwrap();
            let (_, method) = manifest.find(&key.module, &key.method).unwrap();
            let Some(properties) = tool.input_schema["properties"].as_object() else {
                continue;
            };
            if method.verb != Verb::Post || !properties.contains_key("data") {
                continue;
            }
            let placeholders = method.placeholders();
            for property in properties.keys() {
                if property != "data" && !placeholders.contains(&property.as_str()) {
                    stray.push(format!("{} '{}'", tool.name, property));
                }
            }
        }
        assert!(stray.is_empty(), "arguments dropped by a data body: {:?}", stray);
    }

    #[test]
    fn test_firmware_update_takes_no_arguments() {
        let tools = catalog(false);
        let update = tools.get("firmware_update").unwrap();
        assert!(update.input_schema.get("required").is_none());
        assert!(
            update.input_schema["properties"]
                .as_object()
                .is_none_or(|p| p.is_empty())
        );
    }

    #[test]
    fn test_explicit_schema_wins() {
        let catalog = catalog(false);
        let status = catalog.get("system_getStatus").unwrap();
        assert!(status.input_schema.get("required").is_none());

        let lookup = catalog.get("firewall_alias_getAlias").unwrap();
        assert_eq!(lookup.input_schema["required"][0], "uuid");

        let restart = catalog.get("system_restartService").unwrap();
        assert!(restart.input_schema["properties"].get("name").is_some());
    }

    #[test]
    fn test_humanize() {
        assert_eq!(humanize("searchHostOverrides"), "Search host overrides");
        assert_eq!(humanize("get"), "Get");
        assert_eq!(humanize("reconfigure"), "Reconfigure");
    }

    #[test]
    fn test_to_tool() {
        let tool = catalog(false).get("system_getStatus").unwrap().to_tool();
        assert_eq!(tool.name, "system_getStatus");
        assert!(tool.description.unwrap().starts_with("System: "));
    }
}
