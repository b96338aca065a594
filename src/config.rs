//! Configuration for the hwfand daemon.
//!
//! Handles loading, parsing, and validation of the YAML file that names
//! every watched hwmon attribute, the smoothing windows and the per-fan
//! target functions.

use crate::target::CurvePoint;
use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashSet,
    env, fs,
    path::{Path, PathBuf},
};

/// Main configuration structure for the hwfand daemon.
///
/// Deserialized from the YAML configuration file; validated once at
/// startup and then consumed into immutable runtime state.
///
/// # Example
///
/// ```yaml
/// version: 1
/// tick_seconds: 2
/// control_seconds: 8
/// warmup_seconds: 10
///
/// sensors:
///   - id: cpu
///     kind: temperature
///     path: /sys/class/hwmon/hwmon2/temp1_input
///     samples: 5
///   - id: case_fan
///     kind: fan
///     path: /sys/class/hwmon/hwmon3/fan1_input
///     samples: 5
///
/// fans:
///   - name: case
///     pwm: /sys/class/hwmon/hwmon3/pwm1
///     speed_sensor: case_fan
///     target:
///       kind: curve
///       sensor: cpu
///       points:
///         - { temp: 30.0, rpm: 600 }
///         - { temp: 70.0, rpm: 1800 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Configuration version for compatibility checking.
    pub version: u8,

    /// Sensor refresh interval in seconds.
    #[serde(default = "defaults::tick_seconds")]
    pub tick_seconds: u16,

    /// Fan control interval in seconds.
    #[serde(default = "defaults::control_seconds")]
    pub control_seconds: u16,

    /// Delay before the first control cycle, letting the windows fill.
    #[serde(default = "defaults::warmup_seconds")]
    pub warmup_seconds: u16,

    /// Watched hwmon attributes.
    #[serde(default)]
    pub sensors: Vec<SensorCfg>,

    /// Controlled PWM channels.
    #[serde(default)]
    pub fans: Vec<FanCfg>,
}

/// One watched attribute and its parse strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorCfg {
    /// Unique identifier referenced by fans and targets.
    pub id: String,

    /// How the attribute text turns into samples.
    pub kind: SensorKindCfg,

    /// Absolute path of the hwmon attribute.
    pub path: PathBuf,

    /// Smoothing window size in samples.
    #[serde(default = "defaults::samples")]
    pub samples: usize,
}

/// Sensor parse strategies selectable in the config file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SensorKindCfg {
    /// `fan*_input`: rpm readings.
    Fan,
    /// `temp*_input`: milli-degree readings.
    Temperature,
}

/// One controlled PWM channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FanCfg {
    /// Human-readable name used in log lines.
    pub name: String,

    /// Absolute path of the `pwm*` attribute. The `_enable` sibling is
    /// derived from it.
    pub pwm: PathBuf,

    /// Id of the fan-kind sensor measuring this fan's speed.
    pub speed_sensor: String,

    /// Lower bound applied to the computed target speed (rpm).
    #[serde(default)]
    pub min_rpm: i64,

    /// Stand-in for the measured speed while the window is empty or
    /// reads below this value (rpm).
    #[serde(default)]
    pub speed_floor: i64,

    /// Target function driving this fan.
    pub target: TargetCfg,
}

/// Target function variants for fan speed control.
///
/// - Constant: fixed rpm regardless of temperature
/// - Curve: linear interpolation of (°C, rpm) points over one sensor
/// - Max: maximum of nested targets
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum TargetCfg {
    /// Fixed rpm.
    Constant {
        /// Desired speed in rpm.
        rpm: f64,
    },
    /// Linear interpolation over a temperature sensor.
    Curve {
        /// Id of the temperature sensor driving this curve.
        sensor: String,
        /// Points with strictly increasing temperatures.
        points: Vec<CurvePoint>,
    },
    /// Maximum of nested targets.
    Max {
        /// Nested target functions, at least one.
        of: Vec<TargetCfg>,
    },
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 1,
            tick_seconds: defaults::tick_seconds(),
            control_seconds: defaults::control_seconds(),
            warmup_seconds: defaults::warmup_seconds(),
            sensors: Vec::new(),
            fans: Vec::new(),
        }
    }
}

impl Config {
    /// Validates the configuration for consistency.
    ///
    /// Checks intervals, id uniqueness, sensor references and their
    /// kinds, curve shapes and the rpm floors.
    pub fn validate(&self) -> Result<()> {
        if self.tick_seconds == 0 || self.control_seconds == 0 {
            anyhow::bail!("Intervals must be at least one second");
        }

        let mut sensor_ids = HashSet::new();
        for sensor in &self.sensors {
            if !sensor_ids.insert(sensor.id.as_str()) {
                anyhow::bail!("Duplicate sensor id '{}'", sensor.id);
            }
            if sensor.samples == 0 {
                anyhow::bail!("Sensor '{}' needs a non-zero sample window", sensor.id);
            }
        }

        for fan in &self.fans {
            match self.sensor_kind(&fan.speed_sensor) {
                Some(SensorKindCfg::Fan) => {}
                Some(_) => anyhow::bail!(
                    "Fan '{}': speed sensor '{}' is not a fan-kind sensor",
                    fan.name,
                    fan.speed_sensor
                ),
                None => anyhow::bail!(
                    "Fan '{}' references non-existent sensor '{}'",
                    fan.name,
                    fan.speed_sensor
                ),
            }
            if fan.min_rpm < 0 || fan.speed_floor < 0 {
                anyhow::bail!("Fan '{}': rpm floors cannot be negative", fan.name);
            }
            self.validate_target(&fan.name, &fan.target)?;
        }

        Ok(())
    }

    fn sensor_kind(&self, id: &str) -> Option<SensorKindCfg> {
        self.sensors
            .iter()
            .find(|sensor| sensor.id == id)
            .map(|sensor| sensor.kind)
    }

    fn validate_target(&self, fan: &str, target: &TargetCfg) -> Result<()> {
        match target {
            TargetCfg::Constant { rpm } => {
                if *rpm < 0.0 {
                    anyhow::bail!("Fan '{fan}': constant target cannot be negative");
                }
            }
            TargetCfg::Curve { sensor, points } => {
                match self.sensor_kind(sensor) {
                    Some(SensorKindCfg::Temperature) => {}
                    Some(_) => anyhow::bail!(
                        "Fan '{fan}': curve sensor '{sensor}' is not a temperature sensor"
                    ),
                    None => {
                        anyhow::bail!("Fan '{fan}' references non-existent sensor '{sensor}'")
                    }
                }
                if points.is_empty() {
                    anyhow::bail!("Fan '{fan}': curve needs at least one point");
                }
                if !points.windows(2).all(|pair| pair[0].temp < pair[1].temp) {
                    anyhow::bail!("Fan '{fan}': curve temperatures must be strictly increasing");
                }
            }
            TargetCfg::Max { of } => {
                if of.is_empty() {
                    anyhow::bail!("Fan '{fan}': max target needs at least one entry");
                }
                for nested in of {
                    self.validate_target(fan, nested)?;
                }
            }
        }
        Ok(())
    }

    /// Loads configuration from `path` or the standard locations.
    ///
    /// Search order without an explicit path:
    /// 1. `HWFAND_CONFIG` environment variable
    /// 2. `$XDG_CONFIG_HOME/hwfand/config.yml` or `~/.config/hwfand/config.yml`
    /// 3. `/etc/hwfand/config.yml`
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = match path {
            Some(p) => p,
            None => locate_config().context("No configuration file found")?,
        };

        info!("Loading config from: {}", config_path.display());

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML in: {}", config_path.display()))?;

        if config.version != 1 {
            anyhow::bail!(
                "Unsupported config version {} in file: {}",
                config.version,
                config_path.display()
            );
        }

        config.validate().with_context(|| {
            format!(
                "Configuration validation failed for: {}",
                config_path.display()
            )
        })?;

        Ok(config)
    }
}

mod defaults {
    /// Default sensor refresh interval in seconds.
    pub fn tick_seconds() -> u16 {
        2
    }

    /// Default fan control interval in seconds.
    pub fn control_seconds() -> u16 {
        8
    }

    /// Default warm-up delay in seconds.
    pub fn warmup_seconds() -> u16 {
        10
    }

    /// Default smoothing window size.
    pub fn samples() -> usize {
        5
    }
}

fn locate_config() -> Result<PathBuf> {
    // 1) ENV
    if let Ok(env_path) = env::var("HWFAND_CONFIG") {
        return Ok(PathBuf::from(env_path));
    }

    // 2) XDG_CONFIG_HOME or $HOME/.config
    if let Some(mut cfg_dir) = env::var_os("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))
    {
        cfg_dir.push("hwfand/config.yml");
        if cfg_dir.exists() {
            return Ok(cfg_dir);
        }
    }

    // 3) /etc
    let etc = Path::new("/etc/hwfand/config.yml");
    if etc.exists() {
        return Ok(etc.to_path_buf());
    }

    anyhow::bail!("Configuration file not found in any standard location")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VALID_YAML: &str = r#"
version: 1
tick_seconds: 3
control_seconds: 6
warmup_seconds: 5

sensors:
  - id: cpu
    kind: temperature
    path: /sys/class/hwmon/hwmon2/temp1_input
    samples: 5
  - id: case_fan
    kind: fan
    path: /sys/class/hwmon/hwmon3/fan1_input
    samples: 4

fans:
  - name: case
    pwm: /sys/class/hwmon/hwmon3/pwm1
    speed_sensor: case_fan
    min_rpm: 500
    speed_floor: 100
    target:
      kind: max
      of:
        - kind: constant
          rpm: 600
        - kind: curve
          sensor: cpu
          points:
            - { temp: 30.0, rpm: 600 }
            - { temp: 70.0, rpm: 1800 }
"#;

    // Helper function to create temporary config file
    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    fn fan(name: &str, speed_sensor: &str, target: TargetCfg) -> FanCfg {
        FanCfg {
            name: name.to_string(),
            pwm: PathBuf::from("/sys/class/hwmon/hwmon3/pwm1"),
            speed_sensor: speed_sensor.to_string(),
            min_rpm: 0,
            speed_floor: 0,
            target,
        }
    }

    fn fan_sensor(id: &str) -> SensorCfg {
        SensorCfg {
            id: id.to_string(),
            kind: SensorKindCfg::Fan,
            path: PathBuf::from("/sys/class/hwmon/hwmon3/fan1_input"),
            samples: 4,
        }
    }

    fn temp_sensor(id: &str) -> SensorCfg {
        SensorCfg {
            id: id.to_string(),
            kind: SensorKindCfg::Temperature,
            path: PathBuf::from("/sys/class/hwmon/hwmon2/temp1_input"),
            samples: 4,
        }
    }

    #[test]
    fn config_load_valid_yaml() {
        let temp_file = create_temp_config(VALID_YAML);

        let config = Config::load(Some(temp_file.path().to_path_buf())).unwrap();

        assert_eq!(config.version, 1);
        assert_eq!(config.tick_seconds, 3);
        assert_eq!(config.control_seconds, 6);
        assert_eq!(config.warmup_seconds, 5);
        assert_eq!(config.sensors.len(), 2);
        assert_eq!(config.fans.len(), 1);
        assert_eq!(config.fans[0].min_rpm, 500);
        assert_eq!(config.fans[0].speed_floor, 100);
        assert!(matches!(config.fans[0].target, TargetCfg::Max { .. }));
    }

    #[test]
    fn config_load_applies_interval_defaults() {
        let yaml = r#"
version: 1
sensors:
  - id: cpu
    kind: temperature
    path: /sys/class/hwmon/hwmon2/temp1_input
"#;
        let temp_file = create_temp_config(yaml);

        let config = Config::load(Some(temp_file.path().to_path_buf())).unwrap();

        assert_eq!(config.tick_seconds, 2);
        assert_eq!(config.control_seconds, 8);
        assert_eq!(config.warmup_seconds, 10);
        assert_eq!(config.sensors[0].samples, 5);
    }

    #[test]
    fn config_load_rejects_unsupported_version() {
        let temp_file = create_temp_config("version: 2\n");

        let result = Config::load(Some(temp_file.path().to_path_buf()));
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("Unsupported config version")
        );
    }

    #[test]
    fn config_load_missing_file_is_error() {
        let result = Config::load(Some(PathBuf::from("/nonexistent/config.yml")));
        assert!(result.is_err());
    }

    #[test]
    fn validate_rejects_duplicate_sensor_ids() {
        let config = Config {
            sensors: vec![temp_sensor("cpu"), temp_sensor("cpu")],
            ..Default::default()
        };

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Duplicate"));
    }

    #[test]
    fn validate_rejects_zero_sample_window() {
        let mut sensor = temp_sensor("cpu");
        sensor.samples = 0;
        let config = Config {
            sensors: vec![sensor],
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_missing_speed_sensor() {
        let config = Config {
            fans: vec![fan("case", "ghost", TargetCfg::Constant { rpm: 800.0 })],
            ..Default::default()
        };

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("ghost"));
    }

    #[test]
    fn validate_rejects_temperature_sensor_as_speed_source() {
        let config = Config {
            sensors: vec![temp_sensor("cpu")],
            fans: vec![fan("case", "cpu", TargetCfg::Constant { rpm: 800.0 })],
            ..Default::default()
        };

        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("not a fan-kind sensor")
        );
    }

    #[test]
    fn validate_rejects_fan_sensor_driving_a_curve() {
        let config = Config {
            sensors: vec![fan_sensor("case_fan")],
            fans: vec![fan(
                "case",
                "case_fan",
                TargetCfg::Curve {
                    sensor: "case_fan".to_string(),
                    points: vec![CurvePoint {
                        temp: 30.0,
                        rpm: 600.0,
                    }],
                },
            )],
            ..Default::default()
        };

        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("not a temperature sensor")
        );
    }

    #[test]
    fn validate_rejects_non_increasing_curve() {
        let config = Config {
            sensors: vec![fan_sensor("case_fan"), temp_sensor("cpu")],
            fans: vec![fan(
                "case",
                "case_fan",
                TargetCfg::Curve {
                    sensor: "cpu".to_string(),
                    points: vec![
                        CurvePoint {
                            temp: 70.0,
                            rpm: 1800.0,
                        },
                        CurvePoint {
                            temp: 30.0,
                            rpm: 600.0,
                        },
                    ],
                },
            )],
            ..Default::default()
        };

        let result = config.validate();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("strictly increasing")
        );
    }

    #[test]
    fn validate_rejects_empty_max_target() {
        let config = Config {
            sensors: vec![fan_sensor("case_fan")],
            fans: vec![fan("case", "case_fan", TargetCfg::Max { of: vec![] })],
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_negative_floors() {
        let mut bad_fan = fan("case", "case_fan", TargetCfg::Constant { rpm: 800.0 });
        bad_fan.speed_floor = -5;
        let config = Config {
            sensors: vec![fan_sensor("case_fan")],
            fans: vec![bad_fan],
            ..Default::default()
        };

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("negative"));
    }

    #[test]
    fn validate_checks_nested_max_entries() {
        let config = Config {
            sensors: vec![fan_sensor("case_fan")],
            fans: vec![fan(
                "case",
                "case_fan",
                TargetCfg::Max {
                    of: vec![TargetCfg::Curve {
                        sensor: "ghost".to_string(),
                        points: vec![CurvePoint {
                            temp: 30.0,
                            rpm: 600.0,
                        }],
                    }],
                },
            )],
            ..Default::default()
        };

        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("ghost"));
    }

    #[test]
    fn validate_rejects_zero_interval() {
        let config = Config {
            tick_seconds: 0,
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn env_var_overrides_standard_lookup() {
        let temp_file = create_temp_config(VALID_YAML);
        unsafe { env::set_var("HWFAND_CONFIG", temp_file.path()) };

        let config = Config::load(None);

        unsafe { env::remove_var("HWFAND_CONFIG") };
        assert_eq!(config.unwrap().tick_seconds, 3);
    }
}
