//! Hardware sensors read through the vendor query tool (`vcgencmd` on a
//! Raspberry Pi), one subprocess per query.

use std::io::ErrorKind;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use hud_platform::sensor::{parse_measurement, Sensor, SensorProbe};
use hud_platform::FetchError;
use tokio::process::Command;
use tokio::time;
use tracing::debug;

/// Runs `<program> [prefix args..] <query>` and parses its single output line.
pub struct CommandProbe {
    program: String,
    prefix_args: Vec<String>,
    timeout: Duration,
}

impl CommandProbe {
    pub fn new(program: impl Into<String>, prefix_args: Vec<String>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            prefix_args,
            timeout,
        }
    }
}

#[async_trait]
impl SensorProbe for CommandProbe {
    async fn measure(&self, sensor: Sensor) -> Result<String, FetchError> {
        let query = sensor.query_arg();
        debug!("running {} {}", self.program, query);

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.prefix_args)
            .arg(query)
            .stdin(Stdio::null())
            .kill_on_drop(true); // a hung tool is killed once the timeout drops it

        let output = match time::timeout(self.timeout, cmd.output()).await {
            Err(_) => return Err(FetchError::Timeout(self.timeout)),
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound => {
                return Err(FetchError::Process(format!("{} not found", self.program)));
            }
            Ok(Err(e)) => {
                return Err(FetchError::Process(format!(
                    "failed to run {}: {}",
                    self.program, e
                )));
            }
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(FetchError::Process(format!(
                "{} {} exited with {}: {}",
                self.program,
                query,
                output.status,
                stderr.trim()
            )));
        }

        parse_measurement(&String::from_utf8_lossy(&output.stdout))
    }
}
