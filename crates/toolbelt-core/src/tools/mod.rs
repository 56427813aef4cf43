//! Tool specs, providers and the tool manager
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  builtin::<tool> wrappers                   │
//! │    ensure_tool_registered + get_tools       │
//! └─────────────────────────────────────────────┘
//!           │
//!           ▼
//! ┌─────────────────────────────────────────────┐
//! │  ToolContext                                │
//! │                                             │
//! │  - SpecRegistry (name → ToolSpec)           │
//! │  - built-in catalog (lazy registration)     │
//! │  - ToolManager (providers + TTL cache)      │
//! └─────────────────────────────────────────────┘
//!           │
//!           ▼
//! ┌─────────────────────────────────────────────┐
//! │  ToolProvider                               │
//! │                                             │
//! │  stdio / DashScope / remote → McpConnector  │
//! │  callable → ToolBuilder (bidsearch, ...)    │
//! └─────────────────────────────────────────────┘
//! ```

mod spec;
mod provider;
mod manager;
mod registry;
mod runtime;
mod catalog;
mod bidsearch;
mod context;
mod graphs;
pub mod builtin;

#[cfg(test)]
mod testing;

pub use spec::{
    Connection, DashScopeConnection, EnvFactory, McpTransportKind, RemoteConnection, SpecKind,
    StdioConnection, ToolBuilder, ToolSpec,
};
pub use provider::{DisabledReason, ProviderInfo, ProviderStatus, ToolProvider};
pub use manager::ToolManager;
pub use registry::SpecRegistry;
pub use runtime::BlockingRuntime;
pub use catalog::{builtin_names, builtin_spec};
pub use bidsearch::JianyuClient;
pub use context::{CallableOptions, ToolContext, ToolContextBuilder};
pub use graphs::{graph, GraphEntry, GRAPHS};
