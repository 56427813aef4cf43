//! Logging abstractions for runtime-agnostic logging
//!
//! The context, manager and providers log through an injected
//! [`SharedLogger`] so hosts decide where messages go.

mod traits;
mod noop;
mod console;
mod tracing_logger;

pub use traits::{Logger, SharedLogger};
pub use noop::NoOpLogger;
pub use console::ConsoleLogger;
pub use tracing_logger::TracingLogger;
