use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use hud_platform::readings::WeatherReading;
use hud_platform::source::Source;
use hud_platform::{FetchError, Reading};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::debug;

use super::{http_client, request_error};

/// The subset of the OpenWeatherMap current-weather response we read
#[derive(Debug, Deserialize)]
struct WeatherPayload {
    main: MainPayload,
    weather: Vec<ConditionPayload>,
}

#[derive(Debug, Deserialize)]
struct MainPayload {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct ConditionPayload {
    description: String,
}

/// Current weather for one location, in metric units.
pub struct WeatherSource {
    client: reqwest::Client,
    url: Url,
    location: String,
    api_key: String,
    timeout: Duration,
}

impl WeatherSource {
    pub fn new(url: Url, location: String, api_key: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: http_client(timeout)?,
            url,
            location,
            api_key,
            timeout,
        })
    }

    async fn fetch_weather(&self) -> Result<WeatherReading, FetchError> {
        let resp = self
            .client
            .get(self.url.clone())
            .query(&[
                ("q", self.location.as_str()),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
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
        parse_weather(&body)
    }
}

#[async_trait]
impl Source for WeatherSource {
    type Output = WeatherReading;

    fn name(&self) -> &'static str {
        "weather"
    }

    async fn fetch(&self) -> Reading<WeatherReading> {
        let reading: Reading<WeatherReading> = self.fetch_weather().await.into();
        if let Some(w) = reading.valid() {
            debug!("weather in {}: {}°C, {}", self.location, w.temperature_celsius, w.condition);
        }
        reading
    }
}

pub fn parse_weather(body: &[u8]) -> Result<WeatherReading, FetchError> {
    let payload: WeatherPayload =
        serde_json::from_slice(body).map_err(|e| FetchError::Malformed(e.to_string()))?;

    let condition = payload
        .weather
        .first()
        .ok_or_else(|| FetchError::Malformed("no weather conditions".to_string()))?;

    Ok(WeatherReading {
        temperature_celsius: payload.main.temp,
        condition: title_case(&condition.description),
    })
}

/// "light intensity drizzle" -> "Light Intensity Drizzle"
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{dead_url, http_stub};

    const SAMPLE: &str = r#"{"main":{"temp":21.5},"weather":[{"description":"clear sky"}]}"#;

    fn source(url: &str, timeout: Duration) -> WeatherSource {
        WeatherSource::new(
            url.parse().unwrap(),
            "New Delhi".to_string(),
            "secret-key".to_string(),
            timeout,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_sample() {
        let w = parse_weather(SAMPLE.as_bytes()).unwrap();
        assert_eq!(w.temperature_celsius, 21.5);
        assert_eq!(w.condition, "Clear Sky");
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        for body in [
            r#"{"main":{"temp":21.5},"weather":[]}"#,
            r#"{"weather":[{"description":"clear sky"}]}"#,
            r#"{"main":{"temp":"warm"},"weather":[{"description":"clear sky"}]}"#,
            r#"{"main":{"temp":21.5},"weather":[{"main":"Clear"}]}"#,
            r#"{"cod":"404","message":"city not found"}"#,
        ] {
            assert!(
                matches!(parse_weather(body.as_bytes()), Err(FetchError::Malformed(_))),
                "accepted {body:?}"
            );
        }
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("clear sky"), "Clear Sky");
        assert_eq!(title_case("OVERCAST  clouds"), "Overcast Clouds");
        assert_eq!(title_case(""), "");
    }

    #[tokio::test]
    async fn test_fetch_sends_location_key_and_units() {
        let (url, mut seen) = http_stub(200, SAMPLE, Duration::ZERO).await;
        let reading = source(&url, Duration::from_secs(3)).fetch().await;
        assert_eq!(
            reading,
            Reading::Valid(WeatherReading {
                temperature_celsius: 21.5,
                condition: "Clear Sky".to_string(),
            })
        );

        let request = seen.recv().await.unwrap();
        let request_line = request.lines().next().unwrap();
        assert!(request_line.starts_with("GET /stats?"));
        assert!(request_line.contains("q=New+Delhi"));
        assert!(request_line.contains("appid=secret-key"));
        assert!(request_line.contains("units=metric"));
    }

    #[tokio::test]
    async fn test_fetch_unauthorized() {
        let (url, _seen) = http_stub(401, r#"{"cod":401}"#, Duration::ZERO).await;
        let reading = source(&url, Duration::from_secs(3)).fetch().await;
        assert_eq!(reading, Reading::Failure(FetchError::Status(401)));
    }

    #[tokio::test]
    async fn test_transport_error_hides_key() {
        let url = dead_url().await;
        let reading = source(&url, Duration::from_secs(3)).fetch().await;
        match reading {
            Reading::Failure(FetchError::Transport(msg)) => assert!(!msg.contains("secret-key")),
            other => panic!("unexpected reading: {other:?}"),
        }
    }
}
