//! Facade modules for the built-in tools
//!
//! Each module registers its tool on first use and returns the tool list:
//!
//! ```no_run
//! use toolbelt_core::tools::{builtin::weather, ToolContext};
//!
//! # async fn run() -> toolbelt_core::ToolResult<()> {
//! let ctx = ToolContext::from_env()?;
//! let tools = weather::get_weather_tools_async(&ctx, false).await?;
//! # Ok(())
//! # }
//! ```

macro_rules! builtin_tool {
    ($(#[$doc:meta])* $module:ident, $get:ident, $get_async:ident) => {
        $(#[$doc])*
        pub mod $module {
            use crate::error::ToolResult;
            use crate::tools::ToolContext;
            use crate::types::ToolSet;

            pub const TOOL_NAME: &str = stringify!($module);

            pub fn $get(ctx: &ToolContext, refresh: bool) -> ToolResult<ToolSet> {
                ctx.ensure_tool_registered(TOOL_NAME)?;
                ctx.manager().get_tools(TOOL_NAME, refresh)
            }

            pub async fn $get_async(ctx: &ToolContext, refresh: bool) -> ToolResult<ToolSet> {
                ctx.ensure_tool_registered(TOOL_NAME)?;
                ctx.manager().get_tools_async(TOOL_NAME, refresh).await
            }
        }
    };
}

builtin_tool!(
    /// AMap maps (needs the `amap_maps` credential)
    amap_maps, get_amap_maps_tools, get_amap_maps_tools_async
);
builtin_tool!(
    /// AntV chart generation
    antv_visualization_chart, get_antv_visualization_chart_tools, get_antv_visualization_chart_tools_async
);
builtin_tool!(aviation, get_aviation_tools, get_aviation_tools_async);
builtin_tool!(
    /// Jianyu bid search (needs the `jianyu_appid` and `jianyu_key` credentials)
    bidsearch, get_bidsearch_tools, get_bidsearch_tools_async
);
builtin_tool!(bidding_full, get_bidding_full_tools, get_bidding_full_tools_async);
builtin_tool!(bidding_tenders, get_bidding_tenders_tools, get_bidding_tenders_tools_async);
builtin_tool!(enterprise_bigdata, get_enterprise_bigdata_tools, get_enterprise_bigdata_tools_async);
builtin_tool!(enterprise_registry, get_enterprise_registry_tools, get_enterprise_registry_tools_async);
builtin_tool!(enterprise_risk, get_enterprise_risk_tools, get_enterprise_risk_tools_async);
builtin_tool!(gourmet_guide, get_gourmet_guide_tools, get_gourmet_guide_tools_async);
builtin_tool!(
    /// Markmap mind maps, written to the configured markmap directory
    markmap, get_markmap_tools, get_markmap_tools_async
);
builtin_tool!(railway_12306, get_railway_12306_tools, get_railway_12306_tools_async);
builtin_tool!(supplier_management, get_supplier_management_tools, get_supplier_management_tools_async);
builtin_tool!(tendency_software, get_tendency_software_tools, get_tendency_software_tools_async);
builtin_tool!(time_tools, get_time_tools_tools, get_time_tools_tools_async);
builtin_tool!(weather, get_weather_tools, get_weather_tools_async);
builtin_tool!(web_search, get_web_search_tools, get_web_search_tools_async);
