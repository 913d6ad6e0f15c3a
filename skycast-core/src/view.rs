//! Display-ready projections of weather data.

use chrono::{DateTime, FixedOffset, Offset, TimeZone, Utc};

use crate::{
    i18n::{Locale, MessageKey},
    model::{ForecastDay, WeatherSnapshot},
};

/// Icon family chosen from a condition label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConditionIcon {
    Sun,
    Cloud,
    Rain,
    Snow,
    Thunder,
    Mist,
}

impl ConditionIcon {
    /// Substring match on the lowercased label; unknown labels show the sun.
    pub fn from_condition(label: &str) -> Self {
        let label = label.to_lowercase();
        if label.contains("clear") {
            Self::Sun
        } else if label.contains("cloud") {
            Self::Cloud
        } else if label.contains("rain") || label.contains("drizzle") {
            Self::Rain
        } else if label.contains("snow") {
            Self::Snow
        } else if label.contains("thunder") {
            Self::Thunder
        } else if ["mist", "fog", "haze", "smoke", "dust", "sand", "ash"]
            .iter()
            .any(|m| label.contains(m))
        {
            Self::Mist
        } else {
            Self::Sun
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Sun => "sun-animation",
            Self::Cloud => "cloud-animation",
            Self::Rain => "rain-animation",
            Self::Snow => "snow-animation",
            Self::Thunder => "thunder-animation",
            Self::Mist => "mist-animation",
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Sun => "☀",
            Self::Cloud => "☁",
            Self::Rain => "☂",
            Self::Snow => "❄",
            Self::Thunder => "⚡",
            Self::Mist => "≋",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledValue {
    pub label: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeatherView {
    pub location: String,
    pub icon: ConditionIcon,
    pub temperature: String,
    pub condition: String,
    pub description: Option<String>,
    pub feels_like: Option<LabeledValue>,
    pub humidity: LabeledValue,
    pub wind: LabeledValue,
    /// Rotation of the wind arrow, degrees clockwise from north.
    pub wind_rotation_deg: Option<u16>,
    pub wind_arrow: Option<char>,
    pub sunrise: Option<LabeledValue>,
    pub sunset: Option<LabeledValue>,
}

impl WeatherView {
    pub fn new(snapshot: &WeatherSnapshot, locale: Locale) -> Self {
        let location = match &snapshot.country {
            Some(country) => format!("{}, {}", snapshot.location_name, country),
            None => snapshot.location_name.clone(),
        };
        let rotation = snapshot.wind.direction_deg.map(wind_rotation);
        let offset = location_offset(snapshot.utc_offset_secs);
        let clock = |at: DateTime<Utc>| at.with_timezone(&offset).format("%H:%M").to_string();

        Self {
            location,
            icon: ConditionIcon::from_condition(&snapshot.condition),
            temperature: format_temperature(snapshot.temperature_c),
            condition: snapshot.condition.clone(),
            description: snapshot.description.clone(),
            feels_like: snapshot.feels_like_c.map(|t| LabeledValue {
                label: locale.translate(MessageKey::FeelsLike),
                value: format_temperature(t),
            }),
            humidity: LabeledValue {
                label: locale.translate(MessageKey::Humidity),
                value: format!("{}%", snapshot.humidity_pct),
            },
            wind: LabeledValue {
                label: locale.translate(MessageKey::Wind),
                value: format!("{:.1} m/s", snapshot.wind.speed_mps),
            },
            wind_rotation_deg: rotation,
            wind_arrow: rotation.map(wind_arrow),
            sunrise: snapshot.sunrise.map(|at| LabeledValue {
                label: locale.translate(MessageKey::Sunrise),
                value: clock(at),
            }),
            sunset: snapshot.sunset.map(|at| LabeledValue {
                label: locale.translate(MessageKey::Sunset),
                value: clock(at),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastDayView {
    pub day: String,
    pub icon: ConditionIcon,
    pub max: String,
    pub min: String,
}

impl ForecastDayView {
    pub fn new(day: &ForecastDay) -> Self {
        Self {
            day: day.date.format("%a").to_string(),
            icon: ConditionIcon::from_condition(&day.condition),
            max: format_temperature(day.max_c),
            min: format_temperature(day.min_c),
        }
    }
}

/// Whole degrees, rounded half away from zero: `18.3` → `"18°"`.
pub fn format_temperature(celsius: f64) -> String {
    format!("{}°", celsius.round() as i64)
}

/// Header date in the `Friday, October 16` style.
pub fn format_date<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format("%A, %B %d").to_string()
}

fn wind_rotation(deg: f64) -> u16 {
    deg.round().rem_euclid(360.0) as u16
}

/// Arrow for an arrow glyph pointing north rotated clockwise by `rotation` degrees.
fn wind_arrow(rotation: u16) -> char {
    const ARROWS: [char; 8] = ['↑', '↗', '→', '↘', '↓', '↙', '←', '↖'];
    let sector = ((f64::from(rotation) + 22.5) / 45.0) as usize % ARROWS.len();
    ARROWS[sector]
}

fn location_offset(utc_offset_secs: i32) -> FixedOffset {
    FixedOffset::east_opt(utc_offset_secs).unwrap_or_else(|| Utc.fix())
}
