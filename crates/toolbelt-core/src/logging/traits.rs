//! Logger trait definition

use std::sync::Arc;

/// Logger abstraction for runtime-agnostic logging
///
/// Implementations:
/// - `NoOpLogger`: Silent logger for tests
/// - `ConsoleLogger`: Logs to stdout/stderr
/// - `TracingLogger`: Forwards to the `tracing` crate
pub trait Logger: Send + Sync {
    /// Log a debug message
    fn debug(&self, message: &str);

    /// Log an info message
    fn info(&self, message: &str);

    /// Log a warning message
    fn warn(&self, message: &str);

    /// Log an error message
    fn error(&self, message: &str);
}

/// Type alias for an Arc-wrapped logger
pub type SharedLogger = Arc<dyn Logger>;

/// Convenience macros for logging with format arguments
#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $logger.debug(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $logger.info(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $logger.warn(&format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => {
        $logger.error(&format!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[derive(Default)]
    struct RecordingLogger {
        lines: Mutex<Vec<String>>,
    }

    impl Logger for RecordingLogger {
        fn debug(&self, message: &str) {
            self.lines.lock().push(format!("debug {}", message));
        }
        fn info(&self, message: &str) {
            self.lines.lock().push(format!("info {}", message));
        }
        fn warn(&self, message: &str) {
            self.lines.lock().push(format!("warn {}", message));
        }
        fn error(&self, message: &str) {
            self.lines.lock().push(format!("error {}", message));
        }
    }

    #[test]
    fn test_macros_format_arguments() {
        let recorder = Arc::new(RecordingLogger::default());
        let logger: SharedLogger = recorder.clone();

        log_info!(logger, "[ToolManager] Loaded {} tools for {}", 3, "weather");
        log_warn!(logger, "disabled: {}", "missing key");

        assert_eq!(
            recorder.lines.lock().as_slice(),
            [
                "info [ToolManager] Loaded 3 tools for weather",
                "warn disabled: missing key",
            ]
        );
    }
}
