//! Plain-text rendering of a Snapshot, one line per widget.

use hud_platform::readings::{ClockReading, HardwareReading, ServerStats, WeatherReading};
use hud_platform::Reading;

use crate::snapshot::Snapshot;

const MIB: u64 = 1024 * 1024;
const NO_DATA: &str = "--";

pub fn render_lines(snapshot: &Snapshot) -> Vec<String> {
    let mut lines: Vec<String> = snapshot.clocks.iter().map(clock_line).collect();
    lines.push(weather_line(&snapshot.weather));
    lines.extend(server_lines(&snapshot.server));
    lines.extend(hardware_lines(&snapshot.hardware));
    lines
}

fn clock_line(clock: &ClockReading) -> String {
    let time = match &clock.date {
        Some(date) => format!("{} | {}", date, clock.time_of_day),
        None => clock.time_of_day.clone(),
    };
    if clock.label == "local" {
        time
    } else {
        format!("{}: {}", clock.label, time)
    }
}

fn weather_line(weather: &Reading<WeatherReading>) -> String {
    match weather {
        Reading::Valid(w) => format!("Weather: {}°C, {}", w.temperature_celsius, w.condition),
        Reading::Failure(_) => "Weather: Error Fetching Results".to_string(),
    }
}

fn server_lines(server: &Reading<ServerStats>) -> [String; 2] {
    match server {
        Reading::Valid(s) => [
            format!("CPU: {}%", s.cpu_percent),
            format!(
                "Memory: {} MB / {} MB ({}%)",
                s.ram_used_bytes / MIB,
                s.ram_total_bytes / MIB,
                s.ram_percent
            ),
        ],
        Reading::Failure(_) => [format!("CPU: {}", NO_DATA), format!("Memory: {}", NO_DATA)],
    }
}

fn hardware_lines(hardware: &Reading<HardwareReading>) -> [String; 2] {
    match hardware {
        Reading::Valid(h) => [
            format!("Temp: {}", h.temperature),
            format!("Volt: {}", h.voltage),
        ],
        Reading::Failure(_) => [format!("Temp: {}", NO_DATA), format!("Volt: {}", NO_DATA)],
    }
}
