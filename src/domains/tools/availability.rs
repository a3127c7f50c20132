//! Which modules the current configuration may reach.

use std::collections::{BTreeMap, BTreeSet};

use super::manifest::Manifest;
use super::naming::CapabilityGroup;

/// Known module identifiers partitioned by capability group, plus the
/// runtime switch for the plugin group.
#[derive(Debug, Clone)]
pub struct Availability {
    plugins_enabled: bool,
    core: BTreeSet<String>,
    /// Plugin module name to firmware package name.
    plugins: BTreeMap<String, String>,
}

impl Availability {
    /// Derive availability from the manifest.
    pub fn new(manifest: &Manifest, plugins_enabled: bool) -> Self {
        Self {
            plugins_enabled,
            core: manifest.core.iter().map(|m| m.name.clone()).collect(),
            plugins: manifest
                .plugins
                .iter()
                .map(|m| {
                    let package = m.package.clone().unwrap_or_else(|| m.name.clone());
                    (m.name.clone(), package)
                })
                .collect(),
        }
    }

    pub fn plugins_enabled(&self) -> bool {
        self.plugins_enabled
    }

    /// Groups whose modules are advertised, in catalog order.
    pub fn active_groups(&self) -> Vec<CapabilityGroup> {
        if self.plugins_enabled {
            vec![CapabilityGroup::Core, CapabilityGroup::Plugin]
        } else {
            vec![CapabilityGroup::Core]
        }
    }

    /// Whether `module` of `group` may be advertised and called.
    pub fn is_available(&self, group: CapabilityGroup, module: &str) -> bool {
        match group {
            CapabilityGroup::Core => self.core.contains(module),
            CapabilityGroup::Plugin => self.plugins_enabled && self.plugins.contains_key(module),
        }
    }

    /// Firmware package providing a plugin module.
    pub fn package(&self, plugin: &str) -> Option<&str> {
        self.plugins.get(plugin).map(String::as_str)
    }

    /// Whether a plugin is confirmed installed.
    ///
    /// `installed` holds the package names reported by the appliance; `None`
    /// means the set is not known yet, which counts as not installed.
    pub fn is_plugin_installed(&self, plugin: &str, installed: Option<&BTreeSet<String>>) -> bool {
        let (Some(package), Some(installed)) = (self.package(plugin), installed) else {
            return false;
        };
        installed.contains(package) || installed.contains(plugin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn installed(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_core_always_available() {
        let availability = Availability::new(&Manifest::builtin(), false);
        assert!(availability.is_available(CapabilityGroup::Core, "system"));
        assert!(!availability.is_available(CapabilityGroup::Core, "nginx"));
        assert!(!availability.is_available(CapabilityGroup::Core, "unknown"));
    }

    #[test]
    fn test_plugins_follow_flag() {
        let manifest = Manifest::builtin();
        let off = Availability::new(&manifest, false);
        let on = Availability::new(&manifest, true);

        assert!(!off.is_available(CapabilityGroup::Plugin, "nginx"));
        assert!(on.is_available(CapabilityGroup::Plugin, "nginx"));
        assert!(!on.is_available(CapabilityGroup::Plugin, "system"));
        assert_eq!(off.active_groups(), vec![CapabilityGroup::Core]);
        assert_eq!(
            on.active_groups(),
            vec![CapabilityGroup::Core, CapabilityGroup::Plugin]
        );
    }

    #[test]
    fn test_plugin_installed_by_package() {
        let availability = Availability::new(&Manifest::builtin(), true);
        let set = installed(&["os-nginx", "os-acme-client"]);

        assert!(availability.is_plugin_installed("nginx", Some(&set)));
        assert!(availability.is_plugin_installed("acmeclient", Some(&set)));
        assert!(!availability.is_plugin_installed("haproxy", Some(&set)));
        assert!(!availability.is_plugin_installed("nginx", None));
        assert!(!availability.is_plugin_installed("not_a_plugin", Some(&set)));
    }
}
