use anyhow::{Context, Result};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::sources::clock::ClockZone;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HudConfig {
    /// Remote stats endpoint (e.g., http://192.168.0.100:5000/stats)
    #[serde(default = "default_server_url")]
    pub server_url: String,

    /// Location name passed to the weather API
    #[serde(default = "default_location")]
    pub location: String,

    /// Weather API endpoint
    #[serde(default = "default_weather_url")]
    pub weather_url: String,

    /// Weather API key. Never written back to disk; normally supplied
    /// through OPENWEATHER_API_KEY.
    #[serde(default, skip_serializing)]
    pub weather_api_key: Option<String>,

    /// Clocks to display, in order
    #[serde(default = "default_time_zones")]
    pub time_zones: Vec<ZoneConfig>,

    /// Delay between the end of one poll and the start of the next
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Per-source timeout for HTTP requests and sensor commands
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,

    /// Sensor query tool; first element is the program, the rest are
    /// passed before the query argument
    #[serde(default = "default_hardware_command")]
    pub hardware_command: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneConfig {
    /// "local" or an IANA zone name such as "Asia/Kolkata"
    pub zone: String,
    #[serde(default)]
    pub show_date: bool,
}

fn default_server_url() -> String {
    "http://192.168.0.100:5000/stats".to_string()
}
fn default_location() -> String {
    "New Delhi".to_string()
}
fn default_weather_url() -> String {
    "http://api.openweathermap.org/data/2.5/weather".to_string()
}
fn default_time_zones() -> Vec<ZoneConfig> {
    vec![ZoneConfig {
        zone: "local".to_string(),
        show_date: true,
    }]
}
fn default_poll_interval() -> u64 {
    5
}
fn default_fetch_timeout() -> u64 {
    3
}
fn default_hardware_command() -> Vec<String> {
    vec!["vcgencmd".to_string()]
}

impl Default for HudConfig {
    fn default() -> Self {
        Self {
            server_url: default_server_url(),
            location: default_location(),
            weather_url: default_weather_url(),
            weather_api_key: None,
            time_zones: default_time_zones(),
            poll_interval_secs: default_poll_interval(),
            fetch_timeout_secs: default_fetch_timeout(),
            hardware_command: default_hardware_command(),
        }
    }
}

/// Startup configuration problems. Any of these aborts the process before
/// the first poll.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("weather API key is required (--weather-api-key or OPENWEATHER_API_KEY)")]
    MissingApiKey,
    #[error("unknown time zone {0:?}")]
    UnknownTimeZone(String),
    #[error("no time zones configured")]
    NoTimeZones,
    #[error("invalid {field} {url:?}: {reason}")]
    InvalidUrl {
        field: &'static str,
        url: String,
        reason: String,
    },
    #[error("poll interval must be at least one second")]
    ZeroInterval,
    #[error("fetch timeout must be at least one second")]
    ZeroTimeout,
    #[error("hardware command is empty")]
    EmptyHardwareCommand,
}

/// Configuration after every startup check has passed.
#[derive(Clone)]
pub struct ValidatedConfig {
    pub server_url: Url,
    pub location: String,
    pub weather_url: Url,
    pub weather_api_key: String,
    pub zones: Vec<ClockZone>,
    pub poll_interval: Duration,
    pub fetch_timeout: Duration,
    pub hardware_program: String,
    pub hardware_args: Vec<String>,
}

impl fmt::Debug for ValidatedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidatedConfig")
            .field("server_url", &self.server_url.as_str())
            .field("location", &self.location)
            .field("weather_url", &self.weather_url.as_str())
            .field("weather_api_key", &"<redacted>")
            .field("zones", &self.zones)
            .field("poll_interval", &self.poll_interval)
            .field("fetch_timeout", &self.fetch_timeout)
            .field("hardware_program", &self.hardware_program)
            .field("hardware_args", &self.hardware_args)
            .finish()
    }
}

impl HudConfig {
    /// Default config file path for this platform
    pub fn default_path() -> PathBuf {
        if let Some(dirs) = directories::ProjectDirs::from("com", "server-hud", "hud") {
            dirs.config_dir().join("config.json")
        } else {
            PathBuf::from("hud-config.json")
        }
    }

    /// Load config from a file path
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config from {}", path.display()))?;
        let config: Self =
            serde_json::from_str(&data).with_context(|| "failed to parse config JSON")?;
        Ok(config)
    }

    /// Save config to a file path
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create config dir {}", parent.display()))?;
        }
        let data = serde_json::to_string_pretty(self)?;
        std::fs::write(path, data)
            .with_context(|| format!("failed to write config to {}", path.display()))?;
        Ok(())
    }

    /// Check everything that must hold before the scheduler may start.
    pub fn validate(&self) -> Result<ValidatedConfig, ConfigError> {
        let weather_api_key = self
            .weather_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or(ConfigError::MissingApiKey)?
            .to_string();

        let server_url = parse_url("server URL", &self.server_url)?;
        let weather_url = parse_url("weather URL", &self.weather_url)?;

        if self.time_zones.is_empty() {
            return Err(ConfigError::NoTimeZones);
        }
        let zones = self
            .time_zones
            .iter()
            .map(|z| ClockZone::resolve(&z.zone, z.show_date))
            .collect::<Result<Vec<_>, _>>()?;

        if self.poll_interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        let (hardware_program, hardware_args) = match self.hardware_command.split_first() {
            Some((program, args)) if !program.trim().is_empty() => {
                (program.clone(), args.to_vec())
            }
            _ => return Err(ConfigError::EmptyHardwareCommand),
        };

        Ok(ValidatedConfig {
            server_url,
            location: self.location.clone(),
            weather_url,
            weather_api_key,
            zones,
            poll_interval: Duration::from_secs(self.poll_interval_secs),
            fetch_timeout: Duration::from_secs(self.fetch_timeout_secs),
            hardware_program,
            hardware_args,
        })
    }
}

fn parse_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw).map_err(|e| ConfigError::InvalidUrl {
        field,
        url: raw.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            field,
            url: raw.to_string(),
            reason: format!("unsupported scheme {}", url.scheme()),
        });
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyed() -> HudConfig {
        HudConfig {
            weather_api_key: Some("secret".to_string()),
            ..HudConfig::default()
        }
    }

    #[test]
    fn test_defaults_validate_with_key() {
        let validated = keyed().validate().unwrap();
        assert_eq!(validated.server_url.as_str(), "http://192.168.0.100:5000/stats");
        assert_eq!(validated.location, "New Delhi");
        assert_eq!(validated.poll_interval, Duration::from_secs(5));
        assert_eq!(validated.fetch_timeout, Duration::from_secs(3));
        assert_eq!(validated.hardware_program, "vcgencmd");
        assert!(validated.hardware_args.is_empty());
        assert_eq!(validated.zones.len(), 1);
    }

    #[test]
    fn test_missing_api_key_is_fatal() {
        let err = HudConfig::default().validate().unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));

        let blank = HudConfig {
            weather_api_key: Some("   ".to_string()),
            ..HudConfig::default()
        };
        assert!(matches!(blank.validate().unwrap_err(), ConfigError::MissingApiKey));
    }

    #[test]
    fn test_unknown_time_zone() {
        let mut config = keyed();
        config.time_zones.push(ZoneConfig {
            zone: "Mars/Olympus_Mons".to_string(),
            show_date: false,
        });
        match config.validate().unwrap_err() {
            ConfigError::UnknownTimeZone(zone) => assert_eq!(zone, "Mars/Olympus_Mons"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_empty_time_zones() {
        let mut config = keyed();
        config.time_zones.clear();
        assert!(matches!(config.validate().unwrap_err(), ConfigError::NoTimeZones));
    }

    #[test]
    fn test_invalid_urls() {
        let mut config = keyed();
        config.server_url = "not a url".to_string();
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::InvalidUrl { field: "server URL", .. }
        ));

        let mut config = keyed();
        config.weather_url = "ftp://example.com/weather".to_string();
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::InvalidUrl { field: "weather URL", .. }
        ));
    }

    #[test]
    fn test_zero_durations_rejected() {
        let mut config = keyed();
        config.poll_interval_secs = 0;
        assert!(matches!(config.validate().unwrap_err(), ConfigError::ZeroInterval));

        let mut config = keyed();
        config.fetch_timeout_secs = 0;
        assert!(matches!(config.validate().unwrap_err(), ConfigError::ZeroTimeout));
    }

    #[test]
    fn test_hardware_command_split() {
        let mut config = keyed();
        config.hardware_command = vec!["ssh".into(), "pi@rpi".into(), "vcgencmd".into()];
        let validated = config.validate().unwrap();
        assert_eq!(validated.hardware_program, "ssh");
        assert_eq!(validated.hardware_args, vec!["pi@rpi", "vcgencmd"]);

        config.hardware_command.clear();
        assert!(matches!(
            config.validate().unwrap_err(),
            ConfigError::EmptyHardwareCommand
        ));
    }

    #[test]
    fn test_debug_redacts_key() {
        let validated = keyed().validate().unwrap();
        let rendered = format!("{:?}", validated);
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: HudConfig =
            serde_json::from_str(r#"{"location": "Oslo", "poll_interval_secs": 10}"#).unwrap();
        assert_eq!(config.location, "Oslo");
        assert_eq!(config.poll_interval_secs, 10);
        assert_eq!(config.fetch_timeout_secs, 3);
        assert_eq!(config.server_url, default_server_url());
        assert!(config.weather_api_key.is_none());
    }

    #[test]
    fn test_save_and_load_skips_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = keyed();
        config.location = "Reykjavik".to_string();
        config.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("secret"));

        let loaded = HudConfig::load(&path).unwrap();
        assert_eq!(loaded.location, "Reykjavik");
        assert!(loaded.weather_api_key.is_none());
        assert_eq!(loaded.time_zones, config.time_zones);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(HudConfig::load(&dir.path().join("absent.json")).is_err());
    }
}
