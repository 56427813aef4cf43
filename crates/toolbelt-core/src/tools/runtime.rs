//! Background runtime for the synchronous lookup path

use std::future::Future;

use once_cell::sync::OnceCell;
use tokio::runtime::{Builder, Handle, Runtime};

use crate::error::ToolResult;

/// Lazily built multi-thread runtime that drives MCP sessions opened from
/// synchronous callers
///
/// Sessions spawn their background tasks on this runtime, so they stay alive
/// after `block_on` returns.
#[derive(Default)]
pub struct BlockingRuntime {
    runtime: OnceCell<Runtime>,
}

impl BlockingRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the caller is already inside a tokio runtime
    pub fn in_async_context() -> bool {
        Handle::try_current().is_ok()
    }

    pub fn is_started(&self) -> bool {
        self.runtime.get().is_some()
    }

    fn runtime(&self) -> ToolResult<&Runtime> {
        let runtime = self.runtime.get_or_try_init(|| {
            Builder::new_multi_thread()
                .worker_threads(1)
                .thread_name("toolbelt-mcp")
                .enable_all()
                .build()
        })?;
        Ok(runtime)
    }

    /// Drive a future to completion from synchronous code
    ///
    /// Callers must check [`BlockingRuntime::in_async_context`] first;
    /// blocking inside a runtime panics.
    pub fn block_on<F: Future>(&self, future: F) -> ToolResult<F::Output> {
        Ok(self.runtime()?.block_on(future))
    }
}

impl Drop for BlockingRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

impl std::fmt::Debug for BlockingRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingRuntime")
            .field("started", &self.is_started())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_on_outside_runtime() {
        let rt = BlockingRuntime::new();
        assert!(!BlockingRuntime::in_async_context());
        assert!(!rt.is_started());

        let value = rt.block_on(async { 40 + 2 }).unwrap();
        assert_eq!(value, 42);
        assert!(rt.is_started());
    }

    #[test]
    fn test_spawned_tasks_outlive_block_on() {
        let rt = BlockingRuntime::new();
        let (tx, rx) = std::sync::mpsc::channel();
        rt.block_on(async move {
            tokio::spawn(async move {
                tokio::time::sleep(std::time::Duration::from_millis(20)).await;
                let _ = tx.send("done");
            });
        })
        .unwrap();

        assert_eq!(rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap(), "done");
    }

    #[tokio::test]
    async fn test_detects_async_context() {
        assert!(BlockingRuntime::in_async_context());
    }
}
