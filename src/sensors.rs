use anyhow::{Context, Result};
use tokio::sync::Mutex;

use crate::{config::SensorKindCfg, hwmon::AttributeFile, sample_buffer::SampleBuffer};

/// Parse strategy for a sensor's attribute text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleKind {
    /// `fan*_input`: integer revolutions per minute.
    FanRpm,
    /// `temp*_input`: integer milli-degrees Celsius, stored as degrees.
    TempCelsius,
}

impl SampleKind {
    /// Parses the first whitespace-separated token of `text` into a sample.
    pub fn parse(self, text: &str) -> Result<f64> {
        let token = text
            .split_whitespace()
            .next()
            .context("empty attribute content")?;
        let value: i64 = token
            .parse()
            .with_context(|| format!("not an integer: {token:?}"))?;

        Ok(match self {
            SampleKind::FanRpm => value as f64,
            SampleKind::TempCelsius => value as f64 / 1000.0,
        })
    }
}

impl From<SensorKindCfg> for SampleKind {
    fn from(kind: SensorKindCfg) -> Self {
        match kind {
            SensorKindCfg::Fan => SampleKind::FanRpm,
            SensorKindCfg::Temperature => SampleKind::TempCelsius,
        }
    }
}

/// One monitored hwmon attribute with a smoothing window.
///
/// The window has its own mutex so the refresh task and readers contend
/// only for the few instructions around the window itself. The attribute
/// read happens with no lock held.
#[derive(Debug)]
pub struct Sensor {
    id: String,
    kind: SampleKind,
    attribute: AttributeFile,
    buffer: Mutex<SampleBuffer>,
}

impl Sensor {
    pub fn new(
        id: impl Into<String>,
        kind: SampleKind,
        attribute: AttributeFile,
        samples: usize,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            attribute,
            buffer: Mutex::new(SampleBuffer::new(samples)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn kind(&self) -> SampleKind {
        self.kind
    }

    /// Reads and parses the attribute, then pushes the sample.
    ///
    /// A failed read or parse leaves the window untouched; the next
    /// successful update continues from the prior contents.
    pub async fn update(&self) -> Result<f64> {
        let text = self.attribute.read().await?;
        let sample = self.kind.parse(&text)?;

        self.buffer.lock().await.push(sample);
        Ok(sample)
    }

    /// Average of the current window, `None` until the first sample lands.
    pub async fn value(&self) -> Option<f64> {
        self.buffer.lock().await.average()
    }
}
