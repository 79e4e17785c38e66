use anyhow::Result;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinSet;

/// Supervised group of fire-and-forget side effects.
///
/// Each task runs independently; a failure is logged and never affects its siblings.
/// The group exists so shutdown can give in-flight uploads a bounded chance to finish.
#[derive(Default)]
pub struct SideEffects {
    tasks: JoinSet<()>,
}

impl SideEffects {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn `task`, logging its error under `label`
    pub fn spawn<F>(&mut self, label: &'static str, task: F)
    where
        F: Future<Output = Result<()>> + Send + 'static,
    {
        self.reap();
        self.tasks.spawn(async move {
            if let Err(e) = task.await {
                log::warn!("{label} failed: {e:#}");
            }
        });
    }

    /// Wait for every spawned task to finish
    pub async fn flush(&mut self) {
        while let Some(result) = self.tasks.join_next().await {
            log_join_failure(result);
        }
    }

    /// Wait up to `grace` for in-flight tasks, then abort the rest
    pub async fn shutdown(&mut self, grace: Duration) {
        if tokio::time::timeout(grace, self.flush()).await.is_err() {
            log::warn!(
                "Aborting {} side effects still running after {grace:?}",
                self.tasks.len()
            );
            self.tasks.abort_all();
            while self.tasks.join_next().await.is_some() {}
        }
    }

    fn reap(&mut self) {
        while let Some(result) = self.tasks.try_join_next() {
            log_join_failure(result);
        }
    }
}

fn log_join_failure(result: Result<(), tokio::task::JoinError>) {
    if let Err(e) = result {
        if e.is_panic() {
            log::error!("Side effect panicked: {e}");
        }
    }
}
