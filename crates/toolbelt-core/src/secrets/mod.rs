//! Credential lookup for tool providers
//!
//! Hosted MCP servers and some stdio servers need an API key. Providers read
//! those keys through the `SecretStore` trait so tests can inject values
//! without touching the process environment.
//!
//! Built-in implementations: `EnvSecretStore`, `MemorySecretStore`,
//! `ChainSecretStore`.

mod traits;
mod env_store;
mod memory_store;
mod chain_store;

pub use traits::{SecretStore, SecretInfo, SharedSecretStore};
pub use env_store::EnvSecretStore;
pub use memory_store::MemorySecretStore;
pub use chain_store::ChainSecretStore;
