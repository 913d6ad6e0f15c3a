use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use std::collections::BTreeMap;
use tracing::{debug, warn};

use crate::{
    error::WeatherError,
    model::{Coordinates, ForecastDay, WeatherQuery, WeatherSnapshot, Wind},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

const UNITS: &str = "metric";
const FALLBACK_ERROR: &str = "Failed to fetch weather data";
const MALFORMED_RESPONSE: &str = "Malformed response from weather provider";
const FALLBACK_CONDITION: &str = "Clear";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            api_key,
            base_url,
            http: Client::new(),
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &WeatherQuery,
    ) -> Result<T, WeatherError> {
        let params = query_params(query)?;
        let url = format!("{}/{}", self.base_url, endpoint);
        debug!(%url, ?query, "requesting OpenWeather");

        let res = self
            .http
            .get(&url)
            .query(&params)
            .query(&[("units", UNITS), ("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|err| WeatherError::Network(err.to_string()))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|err| WeatherError::Network(err.to_string()))?;

        if status == StatusCode::NOT_FOUND {
            return Err(WeatherError::NotFound);
        }

        if !status.is_success() {
            debug!(%status, body = %truncate_body(&body), "OpenWeather request failed");
            return Err(WeatherError::Provider(provider_message(&body)));
        }

        serde_json::from_str(&body).map_err(|err| {
            warn!(%err, body = %truncate_body(&body), "could not parse OpenWeather response");
            WeatherError::Provider(MALFORMED_RESPONSE.to_string())
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch_by_name(&self, city: &str) -> Result<WeatherSnapshot, WeatherError> {
        let query = WeatherQuery::City(city.to_string());
        let parsed: OwCurrentResponse = self.get_json("weather", &query).await?;
        Ok(parsed.into_snapshot())
    }

    async fn fetch_by_coordinates(
        &self,
        lat: f64,
        lon: f64,
    ) -> Result<WeatherSnapshot, WeatherError> {
        let query = WeatherQuery::Coordinates(Coordinates { lat, lon });
        let parsed: OwCurrentResponse = self.get_json("weather", &query).await?;
        Ok(parsed.into_snapshot())
    }

    async fn fetch_forecast(&self, query: &WeatherQuery) -> Result<Vec<ForecastDay>, WeatherError> {
        let parsed: OwForecastResponse = self.get_json("forecast", query).await?;
        Ok(daily_forecast(&parsed.list, parsed.city.timezone))
    }
}

fn query_params(query: &WeatherQuery) -> Result<Vec<(&'static str, String)>, WeatherError> {
    match query {
        WeatherQuery::City(city) => {
            let city = city.trim();
            if city.is_empty() {
                return Err(WeatherError::EmptyQuery);
            }
            Ok(vec![("q", city.to_string())])
        }
        WeatherQuery::Coordinates(c) => {
            Ok(vec![("lat", c.lat.to_string()), ("lon", c.lon.to_string())])
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwErrorBody {
    message: Option<String>,
}

/// The `message` field of an error body, or a generic fallback.
fn provider_message(body: &str) -> String {
    serde_json::from_str::<OwErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| FALLBACK_ERROR.to_string())
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    feels_like: Option<f64>,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OwWind {
    #[serde(default)]
    speed: f64,
    deg: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct OwSys {
    country: Option<String>,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    #[serde(default)]
    name: String,
    coord: OwCoord,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
    #[serde(default)]
    sys: OwSys,
    #[serde(default)]
    timezone: i32,
}

impl OwCurrentResponse {
    fn into_snapshot(self) -> WeatherSnapshot {
        let (condition, description) = match self.weather.into_iter().next() {
            Some(w) => (w.main, w.description),
            None => (FALLBACK_CONDITION.to_string(), None),
        };

        WeatherSnapshot {
            location_name: self.name,
            country: self.sys.country.filter(|c| !c.is_empty()),
            coordinates: Coordinates {
                lat: self.coord.lat,
                lon: self.coord.lon,
            },
            temperature_c: self.main.temp,
            feels_like_c: self.main.feels_like,
            humidity_pct: self.main.humidity,
            wind: Wind {
                speed_mps: self.wind.speed,
                direction_deg: self.wind.deg,
            },
            sunrise: self.sys.sunrise.and_then(unix_to_utc),
            sunset: self.sys.sunset.and_then(unix_to_utc),
            condition,
            description,
            utc_offset_secs: self.timezone,
        }
    }
}

#[derive(Debug, Deserialize)]
struct OwForecastMain {
    temp_min: f64,
    temp_max: f64,
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwForecastMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

#[derive(Debug, Deserialize)]
struct OwCity {
    #[serde(default)]
    timezone: i32,
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    city: OwCity,
    #[serde(default)]
    list: Vec<OwForecastEntry>,
}

#[derive(Debug)]
struct DayAccumulator {
    min_c: f64,
    max_c: f64,
    /// Condition labels with their counts, in first-seen order.
    conditions: Vec<(String, usize)>,
}

impl DayAccumulator {
    fn new(entry: &OwForecastEntry) -> Self {
        Self {
            min_c: entry.main.temp_min,
            max_c: entry.main.temp_max,
            conditions: Vec::new(),
        }
    }

    fn push(&mut self, entry: &OwForecastEntry) {
        self.min_c = self.min_c.min(entry.main.temp_min);
        self.max_c = self.max_c.max(entry.main.temp_max);

        let label = entry
            .weather
            .first()
            .map(|w| w.main.as_str())
            .unwrap_or(FALLBACK_CONDITION);
        match self.conditions.iter_mut().find(|(l, _)| l == label) {
            Some((_, count)) => *count += 1,
            None => self.conditions.push((label.to_string(), 1)),
        }
    }

    fn dominant_condition(&self) -> String {
        let mut best: Option<&(String, usize)> = None;
        for candidate in &self.conditions {
            if best.is_none_or(|b| candidate.1 > b.1) {
                best = Some(candidate);
            }
        }
        best.map(|(label, _)| label.clone())
            .unwrap_or_else(|| FALLBACK_CONDITION.to_string())
    }
}

/// Collapse 3-hour entries into one [`ForecastDay`] per local calendar day.
fn daily_forecast(entries: &[OwForecastEntry], utc_offset_secs: i32) -> Vec<ForecastDay> {
    let offset = FixedOffset::east_opt(utc_offset_secs).unwrap_or_else(|| Utc.fix());

    let mut days: BTreeMap<NaiveDate, DayAccumulator> = BTreeMap::new();
    for entry in entries {
        let Some(at) = unix_to_utc(entry.dt) else {
            continue;
        };
        let date = at.with_timezone(&offset).date_naive();
        days.entry(date)
            .or_insert_with(|| DayAccumulator::new(entry))
            .push(entry);
    }

    days.into_iter()
        .map(|(date, acc)| ForecastDay {
            date,
            min_c: acc.min_c,
            max_c: acc.max_c,
            condition: acc.dominant_condition(),
        })
        .collect()
}

fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(dt: i64, min: f64, max: f64, condition: &str) -> OwForecastEntry {
        OwForecastEntry {
            dt,
            main: OwForecastMain {
                temp_min: min,
                temp_max: max,
            },
            weather: vec![OwWeather {
                main: condition.to_string(),
                description: None,
            }],
        }
    }

    // 2024-05-01T00:00:00Z
    const MAY_1: i64 = 1_714_521_600;
    const HOUR: i64 = 3600;

    #[test]
    fn blank_city_is_rejected_before_request() {
        let err = query_params(&WeatherQuery::City("   ".into())).unwrap_err();
        assert_eq!(err, WeatherError::EmptyQuery);
    }

    #[test]
    fn city_query_is_trimmed() {
        let params = query_params(&WeatherQuery::City("  Paris ".into())).unwrap();
        assert_eq!(params, vec![("q", "Paris".to_string())]);
    }

    #[test]
    fn provider_message_falls_back_when_absent() {
        assert_eq!(
            provider_message(r#"{"cod":401,"message":"Invalid API key"}"#),
            "Invalid API key"
        );
        assert_eq!(provider_message(r#"{"cod":500}"#), FALLBACK_ERROR);
        assert_eq!(provider_message("<html>bad gateway</html>"), FALLBACK_ERROR);
    }

    #[test]
    fn current_response_tolerates_missing_optionals() {
        let body = r#"{
            "name": "Nowhere",
            "coord": {"lat": 1.5, "lon": -2.5},
            "main": {"temp": 4.2, "humidity": 80},
            "wind": {"speed": 1.0}
        }"#;
        let parsed: OwCurrentResponse = serde_json::from_str(body).unwrap();
        let snap = parsed.into_snapshot();

        assert_eq!(snap.condition, "Clear");
        assert_eq!(snap.country, None);
        assert_eq!(snap.wind.direction_deg, None);
        assert_eq!(snap.sunrise, None);
        assert_eq!(snap.sunset, None);
        assert_eq!(snap.feels_like_c, None);
        assert_eq!(snap.utc_offset_secs, 0);
    }

    #[test]
    fn forecast_groups_entries_by_day() {
        let entries = vec![
            entry(MAY_1, 10.0, 12.0, "Clouds"),
            entry(MAY_1 + 3 * HOUR, 11.0, 15.0, "Rain"),
            entry(MAY_1 + 6 * HOUR, 9.5, 14.0, "Rain"),
            entry(MAY_1 + 24 * HOUR, 8.0, 9.0, "Clear"),
        ];

        let days = daily_forecast(&entries, 0);
        assert_eq!(days.len(), 2);

        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(days[0].min_c, 9.5);
        assert_eq!(days[0].max_c, 15.0);
        assert_eq!(days[0].condition, "Rain");

        assert_eq!(days[1].date, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
        assert_eq!(days[1].condition, "Clear");
    }

    #[test]
    fn forecast_uses_location_offset_for_day_boundaries() {
        // 22:00Z on April 30th is already May 1st at UTC+3.
        let entries = vec![
            entry(MAY_1 - 2 * HOUR, 5.0, 6.0, "Clear"),
            entry(MAY_1 + HOUR, 7.0, 8.0, "Clear"),
        ];

        let days = daily_forecast(&entries, 3 * 3600);
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(days[0].min_c, 5.0);
        assert_eq!(days[0].max_c, 8.0);
    }

    #[test]
    fn condition_tie_goes_to_first_seen() {
        let entries = vec![
            entry(MAY_1, 1.0, 2.0, "Snow"),
            entry(MAY_1 + 3 * HOUR, 1.0, 2.0, "Clouds"),
        ];

        let days = daily_forecast(&entries, 0);
        assert_eq!(days[0].condition, "Snow");
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
    }
}
