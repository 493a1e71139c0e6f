use serde::{Deserialize, Serialize};

/// Text reported for a single sensor query that failed while the other succeeded.
pub const UNAVAILABLE: &str = "unavailable";

/// Resource usage reported by the remote stats endpoint.
///
/// Percentages come from the remote side as-is; nothing here is derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerStats {
    pub cpu_percent: f64,
    pub ram_used_bytes: u64,
    pub ram_total_bytes: u64,
    pub ram_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    pub temperature_celsius: f64,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockReading {
    /// Zone identifier as configured, e.g. "local" or "Europe/Berlin"
    pub label: String,
    /// 24-hour "HH:MM"
    pub time_of_day: String,
    pub date: Option<String>,
}

/// Raw sensor text, unit included (e.g. "48.3'C", "0.8600V").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareReading {
    pub temperature: String,
    pub voltage: String,
}
