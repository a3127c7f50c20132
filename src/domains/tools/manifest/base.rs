//! Modules shipped with every OPNsense installation.

use super::params::{
    FirewallLogParams, KillStatesParams, PackageParams, ReverseLookupParams, ServiceParams,
};
use super::{MethodSpec, ModuleSpec, crud, crud_without_toggle};
use crate::domains::tools::schema::SchemaSource;

pub(super) fn modules() -> Vec<ModuleSpec> {
    vec![
        system(),
        firmware(),
        firewall_alias(),
        firewall_filter(),
        interfaces(),
        diagnostics(),
        routes(),
        cron(),
        unbound(),
        dhcpv4(),
        openvpn(),
        ipsec(),
        wireguard(),
    ]
}

fn system() -> ModuleSpec {
    ModuleSpec::new("system", "System")
        .method(
            MethodSpec::get("getStatus", "core/system/status")
                .no_args()
                .describe("Get overall system health and status messages"),
        )
        .method(
            MethodSpec::get("getSystemInformation", "diagnostics/system/systemInformation")
                .no_args()
                .describe("Get hostname, versions and uptime of the appliance"),
        )
        .method(MethodSpec::get("getSystemResources", "diagnostics/system/systemResources").no_args())
        .method(MethodSpec::get("getSystemTime", "diagnostics/system/systemTime").no_args())
        .method(MethodSpec::post("searchServices", "core/service/search"))
        .method(
            MethodSpec::post("startService", "core/service/start/{name}/{id?}")
                .schema(SchemaSource::typed::<ServiceParams>()),
        )
        .method(
            MethodSpec::post("stopService", "core/service/stop/{name}/{id?}")
                .schema(SchemaSource::typed::<ServiceParams>()),
        )
        .method(
            MethodSpec::post("restartService", "core/service/restart/{name}/{id?}")
                .schema(SchemaSource::typed::<ServiceParams>()),
        )
        .method(MethodSpec::post("reboot", "core/system/reboot").describe("Reboot the appliance"))
        .method(MethodSpec::post("halt", "core/system/halt").describe("Power off the appliance"))
        .method(MethodSpec::post("dismissStatus", "core/system/dismissStatus"))
}

fn firmware() -> ModuleSpec {
    ModuleSpec::new("firmware", "Firmware")
        .method(MethodSpec::get("getStatus", "core/firmware/status").no_args())
        .method(
            MethodSpec::get("getInfo", "core/firmware/info")
                .no_args()
                .describe("List installed and available firmware packages and plugins"),
        )
        .method(MethodSpec::get("getUpgradeStatus", "core/firmware/upgradestatus").no_args())
        .method(MethodSpec::post("checkUpdates", "core/firmware/check"))
        .method(
            MethodSpec::post("update", "core/firmware/update")
                .no_args()
                .describe("Install pending minor updates"),
        )
        .method(
            MethodSpec::post("installPackage", "core/firmware/install/{package}")
                .schema(SchemaSource::typed::<PackageParams>()),
        )
        .method(
            MethodSpec::post("removePackage", "core/firmware/remove/{package}")
                .schema(SchemaSource::typed::<PackageParams>()),
        )
        .method(
            MethodSpec::post("reinstallPackage", "core/firmware/reinstall/{package}")
                .schema(SchemaSource::typed::<PackageParams>()),
        )
}

fn firewall_alias() -> ModuleSpec {
    ModuleSpec::new("firewall_alias", "Firewall aliases")
        .methods(crud("Alias", "Aliases", "firewall/alias", "Item"))
        .method(MethodSpec::get("get", "firewall/alias/get"))
        .method(MethodSpec::post("reconfigure", "firewall/alias/reconfigure"))
        .method(
            MethodSpec::get("listTables", "firewall/alias_util/aliases")
                .no_args()
                .describe("List alias tables currently loaded in pf"),
        )
}

fn firewall_filter() -> ModuleSpec {
    ModuleSpec::new("firewall_filter", "Firewall rules")
        .methods(crud("Rule", "Rules", "firewall/filter", "Rule"))
        .method(MethodSpec::post("apply", "firewall/filter/apply").describe("Apply pending rule changes"))
        .method(MethodSpec::post("savepoint", "firewall/filter/savepoint"))
}

fn interfaces() -> ModuleSpec {
    ModuleSpec::new("interfaces", "Interfaces")
        .method(MethodSpec::get("getOverview", "interfaces/overview/interfacesInfo").no_args())
        .method(MethodSpec::get("getInterfaceNames", "diagnostics/interface/getInterfaceNames").no_args())
        .method(MethodSpec::get("getArp", "diagnostics/interface/getArp").no_args())
        .method(MethodSpec::get("getNdp", "diagnostics/interface/getNdp").no_args())
        .method(MethodSpec::get("getStatistics", "diagnostics/interface/getInterfaceStatistics").no_args())
        .methods(crud_without_toggle("Vlan", "Vlans", "interfaces/vlan_settings", "Item"))
        .method(MethodSpec::post("reconfigureVlans", "interfaces/vlan_settings/reconfigure"))
}

fn diagnostics() -> ModuleSpec {
    ModuleSpec::new("diagnostics", "Diagnostics")
        .method(MethodSpec::get("getActivity", "diagnostics/activity/getActivity").no_args())
        .method(MethodSpec::get("getMemory", "diagnostics/system/systemMemory").no_args())
        .method(MethodSpec::get("getDisk", "diagnostics/system/systemDisk").no_args())
        .method(
            MethodSpec::get("getFirewallLog", "diagnostics/firewall/log")
                .schema(SchemaSource::typed::<FirewallLogParams>()),
        )
        .method(MethodSpec::get("getFirewallStats", "diagnostics/firewall/stats").no_args())
        .method(MethodSpec::post("searchStates", "diagnostics/firewall/query_states"))
        .method(MethodSpec::post("flushStates", "diagnostics/firewall/flush_states"))
        .method(
            MethodSpec::post("killStates", "diagnostics/firewall/kill_states")
                .schema(SchemaSource::typed::<KillStatesParams>()),
        )
        .method(
            MethodSpec::get("reverseLookup", "diagnostics/dns/reverse_lookup")
                .schema(SchemaSource::typed::<ReverseLookupParams>()),
        )
}

fn routes() -> ModuleSpec {
    ModuleSpec::new("routes", "Static routes")
        .methods(crud("Route", "Routes", "routes/routes", "route"))
        .method(MethodSpec::post("reconfigure", "routes/routes/reconfigure"))
        .method(MethodSpec::get("getGatewayStatus", "routes/gateway/status").no_args())
}

fn cron() -> ModuleSpec {
    ModuleSpec::new("cron", "Cron jobs")
        .methods(crud("Job", "Jobs", "cron/settings", "Job"))
        .method(MethodSpec::post("reconfigure", "cron/service/reconfigure"))
}

fn unbound() -> ModuleSpec {
    ModuleSpec::new("unbound", "Unbound DNS")
        .method(MethodSpec::get("getStatus", "unbound/service/status").no_args())
        .methods(crud("HostOverride", "HostOverrides", "unbound/settings", "HostOverride"))
        .methods(crud("DomainOverride", "DomainOverrides", "unbound/settings", "DomainOverride"))
        .method(MethodSpec::post("restart", "unbound/service/restart"))
        .method(MethodSpec::post("reconfigure", "unbound/service/reconfigure"))
        .method(MethodSpec::post("flushCache", "unbound/service/dumpcache"))
}

fn dhcpv4() -> ModuleSpec {
    ModuleSpec::new("dhcpv4", "DHCPv4")
        .method(MethodSpec::get("getStatus", "dhcpv4/service/status").no_args())
        .method(MethodSpec::post("searchLeases", "dhcpv4/leases/searchLease"))
        .method(MethodSpec::post("restart", "dhcpv4/service/restart"))
}

fn openvpn() -> ModuleSpec {
    ModuleSpec::new("openvpn", "OpenVPN")
        .methods(crud("Instance", "Instances", "openvpn/instances", ""))
        .method(MethodSpec::post("searchSessions", "openvpn/service/searchSessions"))
        .method(MethodSpec::post("reconfigure", "openvpn/service/reconfigure"))
}

fn ipsec() -> ModuleSpec {
    ModuleSpec::new("ipsec", "IPsec")
        .method(MethodSpec::get("getStatus", "ipsec/service/status").no_args())
        .methods(crud("Connection", "Connections", "ipsec/connections", "Connection"))
        .method(MethodSpec::post("searchSessions", "ipsec/sessions/searchPhase1"))
        .method(MethodSpec::post("reconfigure", "ipsec/service/reconfigure"))
}

fn wireguard() -> ModuleSpec {
    ModuleSpec::new("wireguard", "WireGuard")
        .method(MethodSpec::get("getStatus", "wireguard/service/show").no_args())
        .methods(crud("Server", "Servers", "wireguard/server", "Server"))
        .methods(crud("Client", "Clients", "wireguard/client", "Client"))
        .method(MethodSpec::post("reconfigure", "wireguard/service/reconfigure"))
}
