//! Application entry point and builder pattern implementation.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::{app_context::AppState, config::Config, scheduler::Scheduler};

/// Main application structure that orchestrates the daemon.
///
/// Manages the complete lifecycle from initialization to shutdown.
///
/// # Example
///
/// ```no_run
/// use hwfand::application::Application;
/// use hwfand::config::Config;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::load(None)?;
/// let mut app = Application::builder()
///     .with_config(config)
///     .build()?;
///
/// app.run().await?;
/// # Ok(())
/// # }
/// ```
pub struct Application {
    scheduler: Scheduler,
}

impl Application {
    /// Creates a new ApplicationBuilder for constructing Application instances.
    pub fn builder() -> ApplicationBuilder {
        ApplicationBuilder::new()
    }

    /// Runs the complete daemon lifecycle: start tasks and block until a signal.
    pub async fn run(&mut self) -> Result<()> {
        self.scheduler.start_tasks();
        self.scheduler.run_until_signal().await
    }
}

/// Builder pattern for creating Application instances.
///
/// Provides a fluent interface for configuring the application before startup.
pub struct ApplicationBuilder {
    config: Option<Config>,
}

impl ApplicationBuilder {
    pub fn new() -> Self {
        Self { config: None }
    }

    /// Sets the configuration to run with.
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Builds the Application, resolving configured paths into sensors and
    /// controllers.
    pub fn build(self) -> Result<Application> {
        let config = self.config.context("Configuration is required")?;
        let state = Arc::new(AppState::new(&config)?);

        Ok(Application {
            scheduler: Scheduler::new(state),
        })
    }
}

impl Default for ApplicationBuilder {
    fn default() -> Self {
        Self::new()
    }
}
