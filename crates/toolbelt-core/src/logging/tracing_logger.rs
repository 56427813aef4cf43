//! Logger that forwards to `tracing`

use super::traits::Logger;

/// Forwards every message to the `tracing` macros under the `toolbelt` target
///
/// Use this when the host already installs a `tracing` subscriber.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "toolbelt", "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "toolbelt", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "toolbelt", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "toolbelt", "{}", message);
    }
}
