use std::{sync::Arc, time::Duration};

use anyhow::Result;
use log::{debug, error, info};
use tokio::time::{interval, sleep};
use tokio_util::sync::CancellationToken;

use crate::app_context::AppState;

/// Refreshes every sensor window once per tick until cancelled.
pub async fn run_sensor_refresh(
    state: Arc<AppState>,
    cancel_token: CancellationToken,
) -> Result<()> {
    let mut interval = interval(Duration::from_secs(u64::from(state.tick_seconds)));

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => {
                info!("Sensor refresh cancelled");
                break;
            }
            _instant = interval.tick() => {
                refresh_sensors(&state).await;
            }
        }
    }
    Ok(())
}

async fn refresh_sensors(state: &AppState) {
    for sensor in state.sensors.values() {
        match sensor.update().await {
            Ok(sample) => debug!("Sensor '{}': {sample:.1}", sensor.id()),
            Err(e) => error!("Sensor '{}' update failed: {e:#}", sensor.id()),
        }
    }
}

/// Runs one control cycle per tick on every fan, after a warm-up delay.
///
/// The warm-up lets the refresh task put a few samples into each window
/// before the first PWM decision.
pub async fn run_fan_control(
    state: Arc<AppState>,
    cancel_token: CancellationToken,
) -> Result<()> {
    tokio::select! {
        () = cancel_token.cancelled() => {
            info!("Fan control cancelled during warm-up");
            return Ok(());
        }
        () = sleep(Duration::from_secs(u64::from(state.warmup_seconds))) => {}
    }

    let mut interval = interval(Duration::from_secs(u64::from(state.control_seconds)));

    loop {
        tokio::select! {
            () = cancel_token.cancelled() => {
                info!("Fan control cancelled");
                break;
            }
            _instant = interval.tick() => {
                control_fans(&state).await;
            }
        }
    }
    Ok(())
}

async fn control_fans(state: &AppState) {
    for controller in &state.controllers {
        if let Err(e) = controller.set_fan_speed().await {
            error!("Fan '{}' control cycle failed: {e:#}", controller.name());
        }
    }
}
