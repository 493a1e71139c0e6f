use chrono::{DateTime, Utc};
use hud_platform::readings::{ClockReading, HardwareReading, ServerStats, WeatherReading};
use hud_platform::Reading;
use serde::Serialize;

/// Everything known after one tick. Built fresh every tick, never mutated.
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// 1 for the first tick of the process
    pub tick: u64,
    /// When aggregation finished
    pub captured_at: DateTime<Utc>,
    pub server: Reading<ServerStats>,
    pub weather: Reading<WeatherReading>,
    pub hardware: Reading<HardwareReading>,
    pub clocks: Vec<ClockReading>,
}

impl Snapshot {
    /// Number of sources that produced no data this tick
    pub fn failed_sources(&self) -> usize {
        [
            self.server.is_failure(),
            self.weather.is_failure(),
            self.hardware.is_failure(),
        ]
        .into_iter()
        .filter(|failed| *failed)
        .count()
    }
}
