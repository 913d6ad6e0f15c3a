use chrono::Local;
use crossterm::style::{Color, Stylize};
use skycast_core::{
    AppState, Locale, MessageKey,
    view::{ForecastDayView, LabeledValue, WeatherView, format_date},
};

/// Output palette; the dark variant suits dark terminal backgrounds.
#[derive(Debug, Clone, Copy)]
pub struct Theme {
    accent: Color,
    text: Color,
    muted: Color,
    error: Color,
}

impl Theme {
    pub fn new(dark_mode: bool) -> Self {
        if dark_mode {
            Self {
                accent: Color::Cyan,
                text: Color::White,
                muted: Color::DarkGrey,
                error: Color::Red,
            }
        } else {
            Self {
                accent: Color::DarkBlue,
                text: Color::Black,
                muted: Color::Grey,
                error: Color::DarkRed,
            }
        }
    }
}

pub fn print_weather(state: &AppState, is_favorite: bool, theme: &Theme) {
    let Some(view) = state.view() else {
        return;
    };

    println!("{}", view.location.clone().with(theme.accent).bold());
    println!("{}", headline(&view).with(theme.text).bold());
    println!("{}", format_date(&Local::now()).with(theme.muted));

    for line in detail_lines(&view) {
        println!("{}", line.with(theme.text));
    }

    let favorite_key = if is_favorite {
        MessageKey::RemoveFromFavorites
    } else {
        MessageKey::AddToFavorites
    };
    let star = if is_favorite { "★" } else { "☆" };
    println!(
        "{}",
        format!("{star} {}", state.locale.translate(favorite_key)).with(theme.muted)
    );

    if let Some(days) = &state.forecast {
        println!();
        println!("{}", state.locale.translate(MessageKey::Forecast).with(theme.accent).bold());
        for day in days {
            println!("{}", forecast_line(&ForecastDayView::new(day)).with(theme.text));
        }
    }
}

pub fn print_error(message: &str, theme: &Theme) {
    eprintln!("{}", message.with(theme.error));
}

pub fn print_favorites(favorites: &[String], locale: Locale, theme: &Theme) {
    println!("{}", locale.translate(MessageKey::Favorites).with(theme.accent).bold());
    if favorites.is_empty() {
        println!("  {}", locale.translate(MessageKey::NoFavorites).with(theme.muted));
        return;
    }
    for city in favorites {
        println!("  ★ {}", city.as_str().with(theme.text));
    }
}

fn headline(view: &WeatherView) -> String {
    match &view.description {
        Some(description) => format!(
            "{}  {}  {} ({})",
            view.icon.glyph(),
            view.temperature,
            view.condition,
            description
        ),
        None => format!("{}  {}  {}", view.icon.glyph(), view.temperature, view.condition),
    }
}

fn labeled(value: &LabeledValue) -> String {
    format!("{} {}", value.label, value.value)
}

fn detail_lines(view: &WeatherView) -> Vec<String> {
    let mut conditions = Vec::new();
    if let Some(feels_like) = &view.feels_like {
        conditions.push(labeled(feels_like));
    }
    conditions.push(labeled(&view.humidity));
    conditions.push(match (view.wind_arrow, view.wind_rotation_deg) {
        (Some(arrow), Some(deg)) => format!("{} {arrow} ({deg}°)", labeled(&view.wind)),
        _ => labeled(&view.wind),
    });

    let sun: Vec<String> = [&view.sunrise, &view.sunset]
        .into_iter()
        .flatten()
        .map(labeled)
        .collect();

    let mut lines = vec![conditions.join("   ")];
    if !sun.is_empty() {
        lines.push(sun.join("   "));
    }
    lines
}

fn forecast_line(day: &ForecastDayView) -> String {
    format!("  {:<4} {}  {:>4} / {:<4}", day.day, day.icon.glyph(), day.max, day.min)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skycast_core::{Coordinates, WeatherSnapshot, Wind};

    fn view() -> WeatherView {
        let snapshot = WeatherSnapshot {
            location_name: "Paris".into(),
            country: Some("FR".into()),
            coordinates: Coordinates { lat: 48.85, lon: 2.35 },
            temperature_c: 18.3,
            feels_like_c: None,
            humidity_pct: 60,
            wind: Wind {
                speed_mps: 3.1,
                direction_deg: Some(200.0),
            },
            sunrise: None,
            sunset: None,
            condition: "Clouds".into(),
            description: None,
            utc_offset_secs: 0,
        };
        WeatherView::new(&snapshot, Locale::En)
    }

    #[test]
    fn headline_shows_icon_and_rounded_temperature() {
        assert_eq!(headline(&view()), "☁  18°  Clouds");
    }

    #[test]
    fn detail_lines_include_wind_direction() {
        let lines = detail_lines(&view());
        assert_eq!(lines, vec!["Humidity 60%   Wind 3.1 m/s ↓ (200°)".to_string()]);
    }
}
