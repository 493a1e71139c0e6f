use std::time::Duration;

use async_trait::async_trait;
use hud_platform::readings::{HardwareReading, UNAVAILABLE};
use hud_platform::sensor::{Sensor, SensorProbe};
use hud_platform::source::Source;
use hud_platform::{FetchError, Reading};
use tracing::debug;

/// Temperature and voltage from the board's sensor tool.
pub struct HardwareSource {
    probe: Box<dyn SensorProbe>,
}

impl HardwareSource {
    pub fn new(probe: Box<dyn SensorProbe>) -> Self {
        Self { probe }
    }
}

#[async_trait]
impl Source for HardwareSource {
    type Output = HardwareReading;

    fn name(&self) -> &'static str {
        "hardware"
    }

    async fn fetch(&self) -> Reading<HardwareReading> {
        let (temperature, voltage) = tokio::join!(
            self.probe.measure(Sensor::Temperature),
            self.probe.measure(Sensor::Voltage),
        );
        combine(temperature, voltage)
    }
}

/// Both queries failing fails the reading; one failing only blanks its field.
fn combine(
    temperature: Result<String, FetchError>,
    voltage: Result<String, FetchError>,
) -> Reading<HardwareReading> {
    match (temperature, voltage) {
        (Err(e), Err(_)) => Reading::Failure(e),
        (temperature, voltage) => Reading::Valid(HardwareReading {
            temperature: or_unavailable(Sensor::Temperature, temperature),
            voltage: or_unavailable(Sensor::Voltage, voltage),
        }),
    }
}

fn or_unavailable(sensor: Sensor, value: Result<String, FetchError>) -> String {
    value.unwrap_or_else(|e| {
        debug!("{} unavailable: {}", sensor.query_arg(), e);
        UNAVAILABLE.to_string()
    })
}

/// Stand-in on platforms without a sensor tool.
pub struct UnsupportedProbe;

#[async_trait]
impl SensorProbe for UnsupportedProbe {
    async fn measure(&self, _sensor: Sensor) -> Result<String, FetchError> {
        Err(FetchError::Unsupported)
    }
}

/// Create the platform-appropriate sensor probe.
pub fn platform_probe(
    program: &str,
    args: Vec<String>,
    timeout: Duration,
) -> Box<dyn SensorProbe> {
    #[cfg(target_os = "linux")]
    {
        Box::new(hud_linux::sensors::CommandProbe::new(program, args, timeout))
    }
    #[cfg(not(target_os = "linux"))]
    {
        let _ = (program, args, timeout);
        Box::new(UnsupportedProbe)
    }
}
