use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone, Utc};
use chrono_tz::Tz;
use hud_platform::readings::ClockReading;

use crate::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ZoneKind {
    Local,
    Named(Tz),
}

/// A time zone resolved at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockZone {
    label: String,
    kind: ZoneKind,
    show_date: bool,
}

impl ClockZone {
    /// Resolve "local" (any case) or an IANA zone name.
    pub fn resolve(zone: &str, show_date: bool) -> Result<Self, ConfigError> {
        let zone = zone.trim();
        let kind = if zone.eq_ignore_ascii_case("local") {
            ZoneKind::Local
        } else {
            let tz = zone
                .parse::<Tz>()
                .map_err(|_| ConfigError::UnknownTimeZone(zone.to_string()))?;
            ZoneKind::Named(tz)
        };
        let label = match kind {
            ZoneKind::Local => "local".to_string(),
            ZoneKind::Named(_) => zone.to_string(),
        };
        Ok(Self {
            label,
            kind,
            show_date,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn read_at(&self, now: DateTime<Utc>) -> ClockReading {
        match self.kind {
            ZoneKind::Local => self.format(now.with_timezone(&Local)),
            ZoneKind::Named(tz) => self.format(now.with_timezone(&tz)),
        }
    }

    fn format<Z>(&self, time: DateTime<Z>) -> ClockReading
    where
        Z: TimeZone,
        Z::Offset: Display,
    {
        ClockReading {
            label: self.label.clone(),
            time_of_day: time.format("%H:%M").to_string(),
            date: self
                .show_date
                .then(|| time.format("%d %b %Y").to_string()),
        }
    }
}

/// Reads every configured zone from the system clock. Cannot fail.
#[derive(Debug, Clone)]
pub struct ClockSource {
    zones: Vec<ClockZone>,
}

impl ClockSource {
    pub fn new(zones: Vec<ClockZone>) -> Self {
        Self { zones }
    }

    pub fn read_at(&self, now: DateTime<Utc>) -> Vec<ClockReading> {
        self.zones.iter().map(|z| z.read_at(now)).collect()
    }

    pub fn read_now(&self) -> Vec<ClockReading> {
        self.read_at(Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noon_utc() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 5, 0).unwrap()
    }

    #[test]
    fn test_named_zone_with_date() {
        let zone = ClockZone::resolve("Asia/Kolkata", true).unwrap();
        let reading = zone.read_at(noon_utc());
        assert_eq!(reading.label, "Asia/Kolkata");
        assert_eq!(reading.time_of_day, "17:35");
        assert_eq!(reading.date.as_deref(), Some("19 Oct 2026"));
    }

    #[test]
    fn test_date_rolls_over_across_zones() {
        let zone = ClockZone::resolve("Pacific/Auckland", true).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 10, 19, 23, 30, 0).unwrap();
        let reading = zone.read_at(late);
        assert_eq!(reading.time_of_day, "12:30");
        assert_eq!(reading.date.as_deref(), Some("20 Oct 2026"));
    }

    #[test]
    fn test_date_hidden() {
        let zone = ClockZone::resolve("UTC", false).unwrap();
        let reading = zone.read_at(noon_utc());
        assert_eq!(reading.time_of_day, "12:05");
        assert!(reading.date.is_none());
    }

    #[test]
    fn test_local_zone_any_case() {
        let zone = ClockZone::resolve(" Local ", false).unwrap();
        assert_eq!(zone.label(), "local");
        let reading = zone.read_at(noon_utc());
        assert_eq!(reading.time_of_day.len(), 5);
        assert_eq!(&reading.time_of_day[2..3], ":");
    }

    #[test]
    fn test_unknown_zone() {
        let err = ClockZone::resolve("Atlantis/Capital", true).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownTimeZone(ref z) if z == "Atlantis/Capital"));
    }

    #[test]
    fn test_source_keeps_order() {
        let source = ClockSource::new(vec![
            ClockZone::resolve("UTC", false).unwrap(),
            ClockZone::resolve("America/New_York", false).unwrap(),
        ]);
        let readings = source.read_at(noon_utc());
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].label, "UTC");
        assert_eq!(readings[1].label, "America/New_York");
        assert_eq!(readings[1].time_of_day, "08:05");
    }
}
