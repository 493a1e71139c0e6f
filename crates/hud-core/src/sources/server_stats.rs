use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use hud_platform::readings::ServerStats;
use hud_platform::source::Source;
use hud_platform::{FetchError, Reading};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use super::{http_client, request_error};

/// Body served by the remote stats endpoint
#[derive(Debug, Deserialize)]
struct StatsPayload {
    cpu_percent: f64,
    ram: RamPayload,
}

#[derive(Debug, Deserialize)]
struct RamPayload {
    used: f64,
    total: f64,
    percent: f64,
}

/// Polls the remote server's resource-utilization endpoint.
pub struct ServerStatsSource {
    client: reqwest::Client,
    url: Url,
    timeout: Duration,
}

impl ServerStatsSource {
    pub fn new(url: Url, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            url,
            timeout,
        })
    }

    async fn fetch_stats(&self) -> Result<ServerStats, FetchError> {
        let resp = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| request_error(e, self.timeout))?;

        if resp.status() != StatusCode::OK {
            return Err(FetchError::Status(resp.status().as_u16()));
        }

        let body = resp
            .bytes()
            .await
            .map_err(|e| request_error(e, self.timeout))?;
        parse_server_stats(&body)
    }
}

#[async_trait]
impl Source for ServerStatsSource {
    type Output = ServerStats;

    fn name(&self) -> &'static str {
        "server stats"
    }

    async fn fetch(&self) -> Reading<ServerStats> {
        let reading: Reading<ServerStats> = self.fetch_stats().await.into();
        if let Some(stats) = reading.valid() {
            debug!(
                "server stats: cpu {}%, ram {}/{} bytes",
                stats.cpu_percent, stats.ram_used_bytes, stats.ram_total_bytes
            );
        }
        reading
    }
}

/// Strictly parse a stats body; any missing or out-of-range field rejects
/// the whole reading.
pub fn parse_server_stats(body: &[u8]) -> Result<ServerStats, FetchError> {
    let payload: StatsPayload =
        serde_json::from_slice(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    let cpu_percent = check_percent("cpu_percent", payload.cpu_percent)?;
    let ram_percent = check_percent("ram.percent", payload.ram.percent)?;

    let ram_used_bytes = check_bytes("ram.used", payload.ram.used)?;
    let ram_total_bytes = check_bytes("ram.total", payload.ram.total)?;

    if ram_used_bytes > ram_total_bytes {
        return Err(FetchError::Malformed(format!(
            "ram.used {} exceeds ram.total {}",
            ram_used_bytes, ram_total_bytes
        )));
    }

    Ok(ServerStats {
        cpu_percent,
        ram_used_bytes,
        ram_total_bytes,
        ram_percent,
    })
}

/// Byte counts may arrive as `2147483648` or `2147483648.0`, but must be whole.
fn check_bytes(field: &str, value: f64) -> Result<u64, FetchError> {
    if value.is_finite() && value >= 0.0 && value.fract() == 0.0 && value < u64::MAX as f64 {
        Ok(value as u64)
    } else {
        Err(FetchError::Malformed(format!("{} is not a byte count: {}", field, value)))
    }
}

fn check_percent(field: &str, value: f64) -> Result<f64, FetchError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(value)
    } else {
        Err(FetchError::Malformed(format!("{} out of range: {}", field, value)))
    }
}
