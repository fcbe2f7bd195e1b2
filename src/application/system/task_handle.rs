use std::future::Future;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Owned handle to a long-lived background task.
///
/// The task receives a shutdown signal through a `watch` channel. Dropping
/// the handle closes the channel, which the tasks treat as a stop request.
pub struct TaskHandle {
    name: &'static str,
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl TaskHandle {
    /// Spawns `task` on the current Tokio runtime.
    pub fn spawn<F, Fut>(name: &'static str, task: F) -> Self
    where
        F: FnOnce(watch::Receiver<bool>) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(task(shutdown_rx));
        Self {
            name,
            shutdown_tx,
            task,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signals the task to stop and waits for it to exit.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        match self.task.await {
            Ok(()) => info!("{} stopped", self.name),
            Err(e) => warn!("{} exited abnormally: {}", self.name, e),
        }
    }
}
