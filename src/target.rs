//! Target functions: what speed should a fan run at right now.
//!
//! A target function turns sensor averages into a desired rpm. The
//! controller treats it as a black box behind [`TargetFunction`], so
//! curves can be composed or swapped without touching the control cycle.

use std::{collections::HashMap, sync::Arc};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{config::TargetCfg, sensors::Sensor};

/// One temperature/rpm coordinate of a curve target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Temperature in degrees Celsius.
    pub temp: f64,
    /// Desired fan speed in rpm.
    pub rpm: f64,
}

/// Computes the rpm a fan should run at, from sensor averages alone.
///
/// Implementations never perform I/O beyond reading sensor windows.
#[async_trait]
pub trait TargetFunction: Send + Sync + core::fmt::Debug {
    async fn target_rpm(&self) -> f64;
}

/// Fixed target regardless of any sensor.
#[derive(Debug)]
pub struct ConstantTarget {
    rpm: f64,
}

impl ConstantTarget {
    pub fn new(rpm: f64) -> Self {
        Self { rpm }
    }
}

#[async_trait]
impl TargetFunction for ConstantTarget {
    async fn target_rpm(&self) -> f64 {
        self.rpm
    }
}

/// Linear interpolation over one temperature sensor's average.
///
/// Ends are clamped: below the first point the first rpm applies, above
/// the last point the last rpm applies. While the sensor has no average
/// yet the last (highest) rpm applies.
#[derive(Debug)]
pub struct CurveTarget {
    sensor: Arc<Sensor>,
    points: Vec<CurvePoint>,
}

impl CurveTarget {
    /// `points` must be non-empty with strictly increasing temperatures;
    /// config validation rejects anything else before construction.
    pub fn new(sensor: Arc<Sensor>, points: Vec<CurvePoint>) -> Self {
        Self { sensor, points }
    }

    fn interpolate(&self, temp: f64) -> f64 {
        let Some(first) = self.points.first().copied() else {
            return 0.0;
        };
        if temp <= first.temp {
            return first.rpm;
        }

        let Some(last) = self.points.last().copied() else {
            return 0.0;
        };
        if temp >= last.temp {
            return last.rpm;
        }

        for pair in self.points.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            if temp <= hi.temp {
                let frac = (temp - lo.temp) / (hi.temp - lo.temp);
                return lo.rpm + frac * (hi.rpm - lo.rpm);
            }
        }

        last.rpm
    }
}

#[async_trait]
impl TargetFunction for CurveTarget {
    async fn target_rpm(&self) -> f64 {
        match self.sensor.value().await {
            Some(temp) => self.interpolate(temp),
            // No reading yet: assume the hot end of the curve.
            None => self.points.last().map(|p| p.rpm).unwrap_or(0.0),
        }
    }
}

/// Maximum of several nested targets.
///
/// Lets more than one temperature sensor drive the same fan; whichever
/// asks for the most airflow wins.
#[derive(Debug)]
pub struct MaxTarget {
    of: Vec<Arc<dyn TargetFunction>>,
}

impl MaxTarget {
    pub fn new(of: Vec<Arc<dyn TargetFunction>>) -> Self {
        Self { of }
    }
}

#[async_trait]
impl TargetFunction for MaxTarget {
    async fn target_rpm(&self) -> f64 {
        let mut max = 0.0f64;
        for target in &self.of {
            max = max.max(target.target_rpm().await);
        }
        max
    }
}

/// Builds the target tree for one fan from its config block.
pub fn build(
    cfg: &TargetCfg,
    sensors: &HashMap<String, Arc<Sensor>>,
) -> Result<Arc<dyn TargetFunction>> {
    Ok(match cfg {
        TargetCfg::Constant { rpm } => Arc::new(ConstantTarget::new(*rpm)),
        TargetCfg::Curve { sensor, points } => {
            let sensor = sensors
                .get(sensor)
                .cloned()
                .ok_or_else(|| anyhow!("target references unknown sensor '{sensor}'"))?;
            Arc::new(CurveTarget::new(sensor, points.clone()))
        }
        TargetCfg::Max { of } => {
            let nested = of
                .iter()
                .map(|nested_cfg| build(nested_cfg, sensors))
                .collect::<Result<Vec<_>>>()?;
            Arc::new(MaxTarget::new(nested))
        }
    })
}
