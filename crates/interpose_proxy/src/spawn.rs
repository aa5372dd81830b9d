//! Scheduling of async continuations.

use futures::future::BoxFuture;
use tokio::runtime::Handle;

use crate::error::SpawnError;

/// Runs continuations of async calls.
pub trait Spawner: Send + Sync + 'static {
    /// Schedules `task` to run to completion in the background.
    ///
    /// # Errors
    ///
    /// Returns [`SpawnError`] if no executor can accept the task.
    fn spawn(&self, task: BoxFuture<'static, ()>) -> Result<(), SpawnError>;
}

/// Spawns continuations as tokio tasks.
///
/// Without an explicit handle the runtime is looked up on the calling thread
/// at each call.
#[derive(Debug, Clone, Default)]
pub struct TokioSpawner {
    handle: Option<Handle>,
}

impl TokioSpawner {
    /// Spawns on whichever runtime the proxy is called from.
    #[must_use]
    pub fn current() -> Self {
        Self::default()
    }

    /// Spawns on the given runtime, even from threads outside it.
    #[must_use]
    pub fn with_handle(handle: Handle) -> Self {
        Self {
            handle: Some(handle),
        }
    }
}

impl Spawner for TokioSpawner {
    fn spawn(&self, task: BoxFuture<'static, ()>) -> Result<(), SpawnError> {
        let handle = match &self.handle {
            Some(handle) => handle.clone(),
            None => Handle::try_current().map_err(|err| SpawnError::NoRuntime {
                reason: err.to_string(),
            })?,
        };
        // Detached: settlement is reported through the hooks.
        drop(handle.spawn(task));
        Ok(())
    }
}
