//! # hwfand
//!
//! A Linux daemon for fan control through the sysfs hwmon interface.
//!
//! ## Features
//!
//! - **Async Architecture**: Built on Tokio, one task per periodic loop
//! - **Sensor Smoothing**: Fan and temperature readings averaged over a
//!   sliding window
//! - **Stepped Control**: PWM moves toward the target in bounded steps,
//!   with a dead band around the target speed
//! - **Configurable Targets**: Constant speeds, temperature curves, and
//!   max-of combinators, composed from YAML
//! - **Daemon Mode**: Optional detach with syslog logging
//!
//! ## Architecture
//!
//! - [`Application`](application::Application) - Lifecycle entry point
//! - [`Scheduler`](scheduler::Scheduler) - Task startup and signal handling
//! - [`AppState`](app_context::AppState) - Sensors and controllers resolved
//!   from configuration
//! - [`FanController`](fan_controller::FanController) - One control cycle
//!   per fan
//!
//! ## Example
//!
//! ```no_run
//! use hwfand::{application::Application, config::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     Application::builder()
//!         .with_config(config)
//!         .build()?
//!         .run()
//!         .await
//! }
//! ```

pub mod app_context;
pub mod application;
pub mod cli;
pub mod config;
pub mod fan_controller;
pub mod hwmon;
pub mod logging;
pub mod sample_buffer;
pub mod scheduler;
pub mod sensors;
pub mod target;
pub mod task_manager;
pub mod tasks;
