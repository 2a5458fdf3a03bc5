//! Detached collaborator work
//!
//! State `enter` handlers issue network calls and move on. The future is
//! handed to a [`TaskSpawner`] and its failure is logged where it happens,
//! so a rejected call can neither block nor unwind into the state machine.

use std::future::Future;

use futures::FutureExt;
use futures::future::LocalBoxFuture;

use crate::error::CollaboratorError;

/// Runs `'static` futures on the current thread without awaiting them
pub trait TaskSpawner {
    fn spawn_detached(&self, task: LocalBoxFuture<'static, ()>);
}

/// Spawn `fut` and log (not propagate) its error
pub fn detach<F>(spawner: &dyn TaskSpawner, label: &'static str, fut: F)
where
    F: Future<Output = Result<(), CollaboratorError>> + 'static,
{
    spawner.spawn_detached(
        async move {
            match fut.await {
                Ok(()) => log::debug!("{} completed", label),
                Err(e) => log::warn!("{} failed: {}", label, e),
            }
        }
        .boxed_local(),
    );
}

#[cfg(not(target_arch = "wasm32"))]
impl TaskSpawner for futures::executor::LocalSpawner {
    fn spawn_detached(&self, task: LocalBoxFuture<'static, ()>) {
        use futures::task::LocalSpawnExt;
        if let Err(e) = self.spawn_local(task) {
            log::error!("Executor shut down, task dropped: {}", e);
        }
    }
}

/// Spawns onto the browser's microtask queue
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserSpawner;

#[cfg(target_arch = "wasm32")]
impl TaskSpawner for BrowserSpawner {
    fn spawn_detached(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}
