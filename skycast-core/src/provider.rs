use crate::{
    Config,
    error::WeatherError,
    model::{ForecastDay, WeatherQuery, WeatherSnapshot},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod openweather;

/// A weather data service. One attempt per call: no caching, no retry.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn fetch_by_name(&self, city: &str) -> Result<WeatherSnapshot, WeatherError>;

    async fn fetch_by_coordinates(&self, lat: f64, lon: f64)
    -> Result<WeatherSnapshot, WeatherError>;

    /// Daily forecast, one entry per calendar day at the location.
    async fn fetch_forecast(&self, query: &WeatherQuery) -> Result<Vec<ForecastDay>, WeatherError>;

    async fn fetch(&self, query: &WeatherQuery) -> Result<WeatherSnapshot, WeatherError> {
        match query {
            WeatherQuery::City(city) => self.fetch_by_name(city).await,
            WeatherQuery::Coordinates(c) => self.fetch_by_coordinates(c.lat, c.lon).await,
        }
    }
}

/// Construct the provider from config.
pub fn provider_from_config(config: &Config) -> anyhow::Result<Box<dyn WeatherProvider>> {
    let api_key = config.api_key().ok_or_else(|| {
        anyhow::anyhow!(
            "No API key configured.\n\
                 Hint: run `skycast configure` or set {}.",
            crate::config::API_KEY_ENV
        )
    })?;

    Ok(Box::new(OpenWeatherProvider::with_base_url(
        api_key,
        config.base_url.as_str(),
    )))
}
