//! Built-in tool specs, registered on first use

use std::collections::{BTreeMap, HashMap};

use once_cell::sync::Lazy;

use super::bidsearch;
use super::spec::McpTransportKind::{self, Sse, StreamableHttp};
use super::spec::{StdioConnection, ToolSpec};

/// Hosted DashScope servers: (tool name, server name, transport, description, tags)
const DASHSCOPE_SERVERS: &[(&str, &str, McpTransportKind, &str, &[&str])] = &[
    ("aviation", "Aviation", Sse, "Flight status and schedules", &["transport", "flight"]),
    ("bidding_full", "market-cmapi00066410", StreamableHttp, "Full bidding and tender data", &["bidding"]),
    ("bidding_tenders", "market-cmapi00071999", StreamableHttp, "Tender announcements", &["bidding"]),
    ("enterprise_bigdata", "market-cmapi00071990", StreamableHttp, "Enterprise big-data lookup", &["enterprise"]),
    ("enterprise_registry", "market-cmapi029030", StreamableHttp, "Business registration records", &["enterprise", "registry"]),
    ("enterprise_risk", "market-cmapi00071991", StreamableHttp, "Enterprise risk insight", &["enterprise", "risk"]),
    ("gourmet_guide", "market-cmapi00067124", StreamableHttp, "Restaurant recommendations", &["lifestyle"]),
    ("railway_12306", "china-railway", Sse, "China railway ticket search", &["transport", "railway"]),
    ("supplier_management", "market-cmapi00071992", StreamableHttp, "Supplier management", &["supply-chain"]),
    ("tendency_software", "tendency-software", Sse, "Market data software tools", &["finance"]),
    ("time_tools", "TimeZone", Sse, "Time zone conversion", &["time"]),
    ("weather", "weather", Sse, "Realtime weather", &["weather"]),
    ("web_search", "WebSearch", Sse, "DashScope web search", &["search"]),
];

static BUILTIN_SPECS: Lazy<BTreeMap<&'static str, ToolSpec>> = Lazy::new(|| {
    let mut specs = BTreeMap::new();

    specs.insert(
        "amap_maps",
        ToolSpec::stdio(
            "amap_maps",
            StdioConnection::new("amap-maps", "npx")
                .args(["-y", "@amap/amap-maps-mcp-server"])
                .secret_env("AMAP_MAPS_API_KEY", "amap_maps"),
        )
        .with_description("AMap maps stdio MCP server")
        .with_tags(["geospatial", "maps"]),
    );

    specs.insert(
        "antv_visualization_chart",
        ToolSpec::stdio(
            "antv_visualization_chart",
            StdioConnection::new("mcp-server-chart", "npx").args(["-y", "@antv/mcp-server-chart"]),
        )
        .with_description("AntV chart generation MCP server")
        .with_tags(["visualization", "antv"]),
    );

    specs.insert(
        "markmap",
        ToolSpec::stdio(
            "markmap",
            StdioConnection::new("Markmap", "npx")
                .args(["-y", "@jinzcdev/markmap-mcp-server"])
                .env_factory(|settings| {
                    let mut env = HashMap::new();
                    env.insert(
                        "MARKMAP_DIR".to_string(),
                        settings.markmap_dir().display().to_string(),
                    );
                    Some(env)
                }),
        )
        .with_description("Markmap mind-map MCP server writing to the markmap directory")
        .with_tags(["mindmap", "knowledge"]),
    );

    specs.insert(bidsearch::TOOL_NAME, bidsearch::spec());

    for (name, server, transport, description, tags) in DASHSCOPE_SERVERS {
        specs.insert(
            *name,
            ToolSpec::dashscope(*name, *server, *transport)
                .with_description(*description)
                .with_tags(tags.iter().copied()),
        );
    }

    specs
});

/// Built-in spec for `name`
///
/// Every call for the same name returns an equal spec.
pub fn builtin_spec(name: &str) -> Option<ToolSpec> {
    BUILTIN_SPECS.get(name).cloned()
}

/// Names of all built-in specs, sorted
pub fn builtin_names() -> Vec<&'static str> {
    BUILTIN_SPECS.keys().copied().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::spec::{Connection, SpecKind};

    #[test]
    fn test_catalog_contents() {
        let names = builtin_names();
        assert_eq!(names.len(), 17);
        assert!(names.contains(&"weather"));
        assert!(names.contains(&"markmap"));
        assert!(names.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_builtin_specs_are_stable() {
        for name in builtin_names() {
            let spec = builtin_spec(name).unwrap();
            assert_eq!(spec, builtin_spec(name).unwrap());
            assert_eq!(spec.name(), name);
            assert!(spec.validate().is_ok());
        }
    }

    #[test]
    fn test_transports() {
        let registry = builtin_spec("enterprise_registry").unwrap();
        match registry.connection() {
            Connection::DashScope(conn) => {
                assert_eq!(conn.server_name, "market-cmapi029030");
                assert_eq!(conn.transport, McpTransportKind::StreamableHttp);
            }
            other => panic!("unexpected connection: {:?}", other),
        }

        assert_eq!(builtin_spec("amap_maps").unwrap().kind(), SpecKind::Stdio);

        let bids = builtin_spec("bidsearch").unwrap();
        assert_eq!(bids.kind(), SpecKind::Callable);
        assert!(bids.required_credentials().contains("jianyu_key"));
    }
}
