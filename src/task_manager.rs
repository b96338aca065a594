//! Lifecycle management for the daemon's background tasks.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{error, info, warn};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(10);

/// Tracks named background tasks and shuts them down together.
///
/// Every task gets a child of the global cancellation token. Shutdown
/// cancels the global token and then waits for each handle under a
/// timeout, so one stuck loop cannot hang the daemon exit.
pub struct TaskManager {
    tasks: HashMap<String, TaskInfo>,
    global_token: CancellationToken,
}

impl TaskManager {
    pub fn new() -> Self {
        Self {
            tasks: HashMap::new(),
            global_token: CancellationToken::new(),
        }
    }

    /// Spawns and registers a task under `name`.
    ///
    /// The task receives its own cancellation token and is expected to
    /// return promptly once that token fires.
    pub fn spawn_task<F, Fut>(&mut self, name: &str, task_fn: F)
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Result<()>> + Send + 'static,
    {
        let task_token = self.global_token.child_token();
        let loop_token = task_token.clone();
        let task_name = name.to_string();

        let handle = tokio::spawn(async move {
            info!("Starting task: {task_name}");
            match task_fn(loop_token).await {
                Ok(()) => {
                    info!("Task '{task_name}' completed");
                    Ok(())
                }
                Err(e) => {
                    error!("Task '{task_name}' failed: {e}");
                    Err(e)
                }
            }
        });

        self.tasks.insert(
            name.to_string(),
            TaskInfo {
                handle,
                _cancel_token: task_token,
            },
        );
    }

    /// Cancels every task and waits for completion.
    ///
    /// Collects the first error; a task exceeding the timeout is reported
    /// as an error rather than awaited forever.
    pub async fn shutdown_all(&mut self) -> Result<()> {
        info!("Stopping all {} tasks", self.tasks.len());

        self.global_token.cancel();

        let mut errors = Vec::new();
        for (name, task) in self.tasks.drain() {
            match tokio::time::timeout(SHUTDOWN_TIMEOUT, task.handle).await {
                Ok(Ok(Ok(()))) => {}
                Ok(Ok(Err(e))) => {
                    warn!("Task '{name}' failed during shutdown: {e}");
                    errors.push(e);
                }
                Ok(Err(e)) => {
                    error!("Task '{name}' panicked: {e}");
                    errors.push(anyhow::anyhow!("Task '{name}' panicked: {e}"));
                }
                Err(_) => {
                    error!("Task '{name}' did not stop within {SHUTDOWN_TIMEOUT:?}");
                    errors.push(anyhow::anyhow!("Task '{name}' shutdown timeout exceeded"));
                }
            }
        }

        match errors.into_iter().next() {
            Some(error) => Err(error).context("One or more tasks failed during shutdown"),
            None => {
                info!("All tasks stopped");
                Ok(())
            }
        }
    }

    /// Returns the count of active tasks.
    ///
    /// Used only for testing purposes.
    #[cfg(test)]
    pub fn active_count(&self) -> usize {
        self.tasks.len()
    }

    /// Checks if a task with the given name is currently running.
    ///
    /// Used only for testing purposes.
    #[cfg(test)]
    pub fn is_running(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }
}

impl Default for TaskManager {
    fn default() -> Self {
        Self::new()
    }
}

struct TaskInfo {
    handle: JoinHandle<Result<()>>,
    _cancel_token: CancellationToken,
}
