//! Daemon lifecycle: task startup, signal handling, graceful shutdown.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;
use tokio::signal::unix::{SignalKind, signal};

use crate::{app_context::AppState, task_manager::TaskManager, tasks};

/// Runs the two periodic loops until SIGINT or SIGTERM arrives.
///
/// Shutdown only stops the loops; PWM registers keep whatever value was
/// last written.
pub struct Scheduler {
    task_manager: TaskManager,
    state: Arc<AppState>,
}

impl Scheduler {
    pub fn new(state: Arc<AppState>) -> Self {
        Self {
            task_manager: TaskManager::new(),
            state,
        }
    }

    /// Spawns the sensor refresh and fan control tasks.
    pub fn start_tasks(&mut self) {
        let state = self.state.clone();
        self.task_manager
            .spawn_task("SensorRefresh", |cancel_token| async move {
                tasks::run_sensor_refresh(state, cancel_token).await
            });

        let state = self.state.clone();
        self.task_manager
            .spawn_task("FanControl", |cancel_token| async move {
                tasks::run_fan_control(state, cancel_token).await
            });

        info!(
            "Monitoring {} sensors, controlling {} fans",
            self.state.sensors.len(),
            self.state.controllers.len()
        );
    }

    /// Blocks until an interruption signal, then shuts the tasks down.
    pub async fn run_until_signal(&mut self) -> Result<()> {
        let mut sigterm =
            signal(SignalKind::terminate()).context("Failed to install SIGTERM handler")?;

        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for shutdown signal")?;
                info!("Received SIGINT, shutting down");
            }
            _ = sigterm.recv() => {
                info!("Received SIGTERM, shutting down");
            }
        }

        self.task_manager.shutdown_all().await?;

        info!("Shutdown complete");
        Ok(())
    }
}
