use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WeatherQuery {
    City(String),
    Coordinates(Coordinates),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed_mps: f64,
    /// Meteorological degrees; absent when the provider omits it.
    pub direction_deg: Option<f64>,
}

/// One successful current-weather lookup. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location_name: String,
    pub country: Option<String>,
    pub coordinates: Coordinates,
    pub temperature_c: f64,
    pub feels_like_c: Option<f64>,
    pub humidity_pct: u8,
    pub wind: Wind,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    /// Primary condition label, e.g. "Clear" or "Rain".
    pub condition: String,
    pub description: Option<String>,
    /// Shift in seconds from UTC at the location.
    pub utc_offset_secs: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub min_c: f64,
    pub max_c: f64,
    pub condition: String,
}
