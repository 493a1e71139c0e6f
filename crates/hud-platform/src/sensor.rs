use async_trait::async_trait;

use crate::reading::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensor {
    Temperature,
    Voltage,
}

impl Sensor {
    /// Argument passed to the measurement command
    pub fn query_arg(self) -> &'static str {
        match self {
            Sensor::Temperature => "measure_temp",
            Sensor::Voltage => "measure_volts",
        }
    }
}

/// Queries a hardware sensor and returns its raw value text.
#[async_trait]
pub trait SensorProbe: Send + Sync {
    async fn measure(&self, sensor: Sensor) -> Result<String, FetchError>;
}

/// Extracts the value from a `label=value<unit>` line, verbatim.
pub fn parse_measurement(output: &str) -> Result<String, FetchError> {
    let line = output
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .ok_or_else(|| FetchError::Malformed("empty sensor output".to_string()))?;

    match line.split_once('=') {
        Some((label, value)) if !label.is_empty() && !value.is_empty() => Ok(value.to_string()),
        _ => Err(FetchError::Malformed(format!(
            "expected label=value, got {:?}",
            line
        ))),
    }
}
