//! Modules provided by optional `os-*` plugin packages.

use super::{MethodSpec, ModuleSpec, crud, crud_without_toggle};
use crate::domains::tools::schema::InputShape;

pub(super) fn modules() -> Vec<ModuleSpec> {
    vec![nginx(), haproxy(), acmeclient(), freeradius(), zabbix_agent()]
}

fn nginx() -> ModuleSpec {
    ModuleSpec::new("nginx", "Nginx")
        .package("os-nginx")
        .method(MethodSpec::get("getStatus", "nginx/service/status").no_args())
        .methods(crud_without_toggle("Upstream", "Upstreams", "nginx/settings", "upstream"))
        .methods(crud_without_toggle(
            "UpstreamServer",
            "UpstreamServers",
            "nginx/settings",
            "upstreamserver",
        ))
        .methods(crud_without_toggle("HttpServer", "HttpServers", "nginx/settings", "httpserver"))
        .methods(crud_without_toggle("Location", "Locations", "nginx/settings", "location"))
        .method(MethodSpec::post("reconfigure", "nginx/service/reconfigure"))
}

fn haproxy() -> ModuleSpec {
    ModuleSpec::new("haproxy", "HAProxy")
        .package("os-haproxy")
        .method(MethodSpec::get("getStatus", "haproxy/service/status").no_args())
        .methods(crud("Backend", "Backends", "haproxy/settings", "Backends"))
        .methods(crud("Frontend", "Frontends", "haproxy/settings", "Frontends"))
        .methods(crud("Server", "Servers", "haproxy/settings", "Servers"))
        .method(
            MethodSpec::get("configtest", "haproxy/service/configtest")
                .no_args()
                .describe("Validate the generated HAProxy configuration"),
        )
        .method(MethodSpec::post("reconfigure", "haproxy/service/reconfigure"))
}

fn acmeclient() -> ModuleSpec {
    ModuleSpec::new("acmeclient", "ACME client")
        .package("os-acme-client")
        .methods(crud("Certificate", "Certificates", "acmeclient/certificates", ""))
        .method(
            MethodSpec::post("signCertificate", "acmeclient/certificates/sign/{uuid}")
                .shape(InputShape::UuidLookup)
                .describe("Issue or renew a certificate"),
        )
        .method(
            MethodSpec::post("revokeCertificate", "acmeclient/certificates/revoke/{uuid}")
                .shape(InputShape::UuidLookup),
        )
        .methods(crud("Account", "Accounts", "acmeclient/accounts", ""))
        .methods(crud("Validation", "Validations", "acmeclient/validations", ""))
        .method(MethodSpec::post("reconfigure", "acmeclient/service/reconfigure"))
}

fn freeradius() -> ModuleSpec {
    ModuleSpec::new("freeradius", "FreeRADIUS")
        .package("os-freeradius")
        .method(MethodSpec::get("getStatus", "freeradius/service/status").no_args())
        .methods(crud("User", "Users", "freeradius/user", "User"))
        .methods(crud("Client", "Clients", "freeradius/client", "Client"))
        .method(MethodSpec::post("reconfigure", "freeradius/service/reconfigure"))
}

fn zabbix_agent() -> ModuleSpec {
    ModuleSpec::new("zabbix_agent", "Zabbix agent")
        .package("os-zabbix-agent")
        .method(MethodSpec::get("getStatus", "zabbixagent/service/status").no_args())
        .method(MethodSpec::get("get", "zabbixagent/settings/get"))
        .method(
            MethodSpec::post("set", "zabbixagent/settings/set")
                .shape(InputShape::Payload)
                .describe("Update the agent settings"),
        )
        .method(MethodSpec::post("reconfigure", "zabbixagent/service/reconfigure"))
}
