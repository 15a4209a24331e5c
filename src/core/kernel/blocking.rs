use crate::core::errors::ChiefPayError;
use std::future::Future;
use tokio::runtime::{Builder, Runtime};

/// Owned Tokio runtime that drives the async clients from blocking code
///
/// The blocking clients hold one of these next to their async counterpart
/// and run every operation through [`BlockingRuntime::block_on`], so both
/// modes share a single request and event pipeline.
pub struct BlockingRuntime {
    runtime: Runtime,
}

impl BlockingRuntime {
    /// Runtime that only makes progress while a call is blocked on it
    pub fn current_thread() -> Result<Self, ChiefPayError> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| {
                ChiefPayError::ConfigurationError(format!("Failed to build runtime: {}", e))
            })?;
        Ok(Self { runtime })
    }

    /// Runtime with its own worker threads, so spawned tasks keep running
    /// between calls
    pub fn background(worker_threads: usize) -> Result<Self, ChiefPayError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(worker_threads.max(1))
            .thread_name("chiefpay-worker")
            .enable_all()
            .build()
            .map_err(|e| {
                ChiefPayError::ConfigurationError(format!("Failed to build runtime: {}", e))
            })?;
        Ok(Self { runtime })
    }

    /// Block the calling thread until `future` completes
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }
}

impl std::fmt::Debug for BlockingRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockingRuntime")
            .field("flavor", &self.runtime.handle().runtime_flavor())
            .finish()
    }
}
