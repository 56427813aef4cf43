//! Agent graphs and the tools they load

use crate::error::{ToolError, ToolResult};
use crate::tools::ToolContext;
use crate::types::ToolSet;

/// Entry point of an agent graph and the tool names it binds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphEntry {
    pub name: &'static str,
    /// `module:function` the agent runtime loads
    pub entry_point: &'static str,
    pub tools: &'static [&'static str],
}

pub static GRAPHS: &[GraphEntry] = &[
    GraphEntry {
        name: "websearch_assistant",
        entry_point: "agents.websearch_assistant.agent:agent",
        tools: &["web_search"],
    },
    GraphEntry {
        name: "bid_company",
        entry_point: "agents.bid_company.agent:agent",
        tools: &[
            "bidsearch",
            "enterprise_registry",
            "enterprise_risk",
            "enterprise_bigdata",
            "antv_visualization_chart",
            "web_search",
            "supplier_management",
            "markmap",
        ],
    },
];

pub fn graph(name: &str) -> Option<&'static GraphEntry> {
    GRAPHS.iter().find(|g| g.name == name)
}

impl ToolContext {
    /// Every tool a graph binds, concatenated in declaration order
    pub async fn graph_tools_async(&self, graph_name: &str, refresh: bool) -> ToolResult<ToolSet> {
        let entry = graph(graph_name).ok_or_else(|| ToolError::UnknownTool(graph_name.to_string()))?;
        self.collect_tools_async(entry.tools, refresh).await
    }
}
