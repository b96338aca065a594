//! Access to textual sysfs/hwmon attribute files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;

/// One textual sysfs attribute, e.g. `/sys/class/hwmon/hwmon3/fan1_input`.
///
/// No caching; sysfs regenerates attribute content on every open, so each
/// read and write goes straight to the file.
#[derive(Debug, Clone)]
pub struct AttributeFile {
    path: PathBuf,
}

impl AttributeFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the attribute content with surrounding whitespace trimmed.
    pub async fn read(&self) -> Result<String> {
        let raw = fs::read_to_string(&self.path)
            .await
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        Ok(raw.trim().to_string())
    }

    /// Overwrites the attribute with `value`.
    pub async fn write(&self, value: &str) -> Result<()> {
        fs::write(&self.path, value)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component, used in log lines.
    pub fn basename(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }

    /// The `<path>_enable` sibling of a PWM attribute.
    ///
    /// Writing "1" there switches the channel to manual PWM mode.
    pub fn enable_sibling(&self) -> Self {
        let mut name = self.path.as_os_str().to_os_string();
        name.push("_enable");
        Self {
            path: PathBuf::from(name),
        }
    }
}
