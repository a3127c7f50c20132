//! Hand-authored parameter schemas for methods whose names do not follow
//! the verb conventions.

use schemars::JsonSchema;
use serde::Deserialize;

/// Parameters for service control endpoints.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ServiceParams {
    /// Service name as listed by `system_searchServices` (e.g. "unbound").
    pub name: String,

    /// Service instance id, for services running more than once. Appended
    /// to the path when given.
    #[serde(default)]
    pub id: Option<String>,
}

/// Parameters for firmware package operations.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct PackageParams {
    /// Package name, e.g. "os-nginx".
    pub package: String,
}

/// Parameters for reading the live firewall log.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct FirewallLogParams {
    /// Maximum number of log lines to return.
    #[serde(default)]
    pub limit: Option<u32>,

    /// Only return entries newer than this digest.
    #[serde(default)]
    pub digest: Option<String>,
}

/// Parameters for reverse DNS lookups.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ReverseLookupParams {
    /// IPv4 or IPv6 address to resolve.
    pub address: String,
}

/// Parameters for killing firewall states.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct KillStatesParams {
    /// Source or destination address whose states should be dropped.
    pub host: String,
}
