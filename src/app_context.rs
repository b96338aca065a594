//! Runtime state assembled once from the configuration.

use std::{collections::HashMap, sync::Arc};

use anyhow::{Context, Result};

use crate::{
    config::Config,
    fan_controller::FanController,
    hwmon::AttributeFile,
    sensors::{SampleKind, Sensor},
    target,
};

/// Everything the periodic tasks touch.
///
/// Built once at startup from a validated [`Config`]; nothing in here
/// changes afterwards, so the tasks share it behind a plain `Arc`. The
/// only mutable state is inside each sensor's own window mutex.
#[derive(Debug)]
pub struct AppState {
    /// Sensor refresh interval in seconds.
    pub tick_seconds: u16,
    /// Fan control interval in seconds.
    pub control_seconds: u16,
    /// Delay before the first control cycle in seconds.
    pub warmup_seconds: u16,
    /// Sensors by id, shared with curve targets and controllers.
    pub sensors: HashMap<String, Arc<Sensor>>,
    /// One controller per configured fan.
    pub controllers: Vec<FanController>,
}

impl AppState {
    /// Resolves the configuration into live sensors and controllers.
    ///
    /// Fails when a fan or target names a sensor that does not exist;
    /// `Config::validate` catches this earlier for loaded files.
    pub fn new(config: &Config) -> Result<Self> {
        let mut sensors = HashMap::new();
        for cfg in &config.sensors {
            let sensor = Arc::new(Sensor::new(
                cfg.id.clone(),
                SampleKind::from(cfg.kind),
                AttributeFile::new(&cfg.path),
                cfg.samples,
            ));
            sensors.insert(cfg.id.clone(), sensor);
        }

        let mut controllers = Vec::with_capacity(config.fans.len());
        for fan in &config.fans {
            let speed_sensor = sensors.get(&fan.speed_sensor).cloned().with_context(|| {
                format!(
                    "Fan '{}' references unknown sensor '{}'",
                    fan.name, fan.speed_sensor
                )
            })?;
            let target = target::build(&fan.target, &sensors)
                .with_context(|| format!("Fan '{}': invalid target", fan.name))?;

            controllers.push(FanController::new(
                fan.name.clone(),
                AttributeFile::new(&fan.pwm),
                speed_sensor,
                target,
                fan.min_rpm,
                fan.speed_floor,
            ));
        }

        Ok(Self {
            tick_seconds: config.tick_seconds,
            control_seconds: config.control_seconds,
            warmup_seconds: config.warmup_seconds,
            sensors,
            controllers,
        })
    }
}
