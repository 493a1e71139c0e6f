use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use hud_platform::readings::{HardwareReading, ServerStats, WeatherReading};
use hud_platform::source::Source;
use hud_platform::{FetchError, Reading};
use tokio::time::{self, Instant};
use tracing::{debug, error, warn};

use crate::config::ValidatedConfig;
use crate::snapshot::Snapshot;
use crate::sources::clock::ClockSource;
use crate::sources::hardware::{self, HardwareSource};
use crate::sources::server_stats::ServerStatsSource;
use crate::sources::weather::WeatherSource;

/// Slack past the adapters' own timeout before a fetch task is abandoned.
const DEADLINE_GRACE: Duration = Duration::from_secs(1);

/// Fans out to every source once per tick and joins the results into a
/// Snapshot.
pub struct Aggregator {
    server: Arc<dyn Source<Output = ServerStats>>,
    weather: Arc<dyn Source<Output = WeatherReading>>,
    hardware: Arc<dyn Source<Output = HardwareReading>>,
    clocks: ClockSource,
    deadline: Duration,
    ticks: u64,
}

impl Aggregator {
    pub fn new(
        server: Arc<dyn Source<Output = ServerStats>>,
        weather: Arc<dyn Source<Output = WeatherReading>>,
        hardware: Arc<dyn Source<Output = HardwareReading>>,
        clocks: ClockSource,
        adapter_timeout: Duration,
    ) -> Self {
        Self {
            server,
            weather,
            hardware,
            clocks,
            deadline: adapter_timeout + DEADLINE_GRACE,
            ticks: 0,
        }
    }

    pub fn from_config(config: &ValidatedConfig) -> Result<Self> {
        let server = ServerStatsSource::new(config.server_url.clone(), config.fetch_timeout)?;
        let weather = WeatherSource::new(
            config.weather_url.clone(),
            config.location.clone(),
            config.weather_api_key.clone(),
            config.fetch_timeout,
        )?;
        let probe = hardware::platform_probe(
            &config.hardware_program,
            config.hardware_args.clone(),
            config.fetch_timeout,
        );

        Ok(Self::new(
            Arc::new(server),
            Arc::new(weather),
            Arc::new(HardwareSource::new(probe)),
            ClockSource::new(config.zones.clone()),
            config.fetch_timeout,
        ))
    }

    /// Query every source concurrently. Never fails: a source that errors,
    /// panics or overruns only turns its own field into a Failure.
    pub async fn aggregate(&mut self) -> Snapshot {
        self.ticks += 1;
        let started = Instant::now();

        let (server, weather, hardware) = tokio::join!(
            fetch_bounded(self.server.clone(), self.deadline),
            fetch_bounded(self.weather.clone(), self.deadline),
            fetch_bounded(self.hardware.clone(), self.deadline),
        );

        let snapshot = Snapshot {
            tick: self.ticks,
            captured_at: Utc::now(),
            server,
            weather,
            hardware,
            clocks: self.clocks.read_now(),
        };

        debug!(
            "tick {} aggregated in {:?} ({} of 3 sources failed)",
            snapshot.tick,
            started.elapsed(),
            snapshot.failed_sources()
        );
        snapshot
    }
}

async fn fetch_bounded<T: Send + 'static>(
    source: Arc<dyn Source<Output = T>>,
    deadline: Duration,
) -> Reading<T> {
    let name = source.name();
    let mut task = tokio::spawn(async move { source.fetch().await });

    let reading = match time::timeout(deadline, &mut task).await {
        Ok(Ok(reading)) => reading,
        Ok(Err(e)) => {
            error!("{} fetch task failed: {}", name, e);
            Reading::Failure(FetchError::Aborted(e.to_string()))
        }
        Err(_) => {
            task.abort();
            Reading::Failure(FetchError::Timeout(deadline))
        }
    };

    if let Some(e) = reading.failure() {
        warn!("{} unavailable: {}", name, e);
    }
    reading
}
