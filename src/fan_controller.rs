//! Stepped PWM control for one fan.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use crate::{hwmon::AttributeFile, sensors::Sensor, target::TargetFunction};

/// Maps a speed shortfall or excess (rpm) to a PWM nudge.
///
/// Differences inside the ±10 rpm dead band map to zero so a fan
/// hovering near its target is left alone.
pub fn pwm_step(speed_diff: i64) -> i64 {
    match speed_diff {
        151.. => 10,
        51..=150 => 3,
        11..=50 => 1,
        -10..=10 => 0,
        -50..=-11 => -1,
        -150..=-51 => -3,
        _ => -10,
    }
}

/// Drives one PWM channel toward the speed its target function asks for.
#[derive(Debug)]
pub struct FanController {
    name: String,
    pwm: AttributeFile,
    pwm_enable: AttributeFile,
    speed_sensor: Arc<Sensor>,
    target: Arc<dyn TargetFunction>,
    min_rpm: i64,
    speed_floor: i64,
}

impl FanController {
    pub fn new(
        name: impl Into<String>,
        pwm: AttributeFile,
        speed_sensor: Arc<Sensor>,
        target: Arc<dyn TargetFunction>,
        min_rpm: i64,
        speed_floor: i64,
    ) -> Self {
        let pwm_enable = pwm.enable_sibling();
        Self {
            name: name.into(),
            pwm,
            pwm_enable,
            speed_sensor,
            target,
            min_rpm,
            speed_floor,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Runs one control cycle and returns the target speed.
    ///
    /// Reads the current PWM value, compares the smoothed fan speed with
    /// the target function's demand and nudges the PWM register by one
    /// step. Differences inside the dead band leave the hardware and the
    /// log untouched.
    pub async fn set_fan_speed(&self) -> Result<i64> {
        let current_pwm: i64 = self
            .pwm
            .read()
            .await?
            .parse()
            .with_context(|| format!("PWM value of '{}' is not an integer", self.name))?;

        let current_speed = self.current_speed().await;
        let target_speed = (self.target.target_rpm().await.floor() as i64).max(self.min_rpm);

        let pwm_diff = pwm_step(target_speed - current_speed);
        if pwm_diff != 0 {
            info!(
                "Fan '{}': speed {current_speed} -> {target_speed} rpm, {} {pwm_diff:+}",
                self.name,
                self.pwm.basename(),
            );
            // Manual PWM mode must be active or the value write is ignored.
            self.pwm_enable.write("1").await?;
            let next = (current_pwm + pwm_diff).clamp(0, 255);
            self.pwm.write(&next.to_string()).await?;
        }

        Ok(target_speed)
    }

    /// Smoothed fan speed, never below the configured floor.
    async fn current_speed(&self) -> i64 {
        match self.speed_sensor.value().await {
            Some(average) => (average.floor() as i64).max(self.speed_floor),
            None => self.speed_floor,
        }
    }
}
