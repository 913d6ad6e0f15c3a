//! Core library for the `skycast` weather lookup tool.
//!
//! This crate defines:
//! - The OpenWeather client and its error taxonomy
//! - Favorites and display preferences persisted to local storage
//! - Geolocation and voice input adapters
//! - The application state machine and display-ready views
//! - Configuration and localized strings
//!
//! It is used by `skycast-cli`, but can also be reused by other front ends.

pub mod app;
pub mod config;
pub mod error;
pub mod favorites;
pub mod geolocation;
pub mod i18n;
pub mod model;
pub mod preferences;
pub mod provider;
pub mod storage;
pub mod view;
pub mod voice;

pub use app::{App, AppState, Event, Services, UiError};
pub use config::Config;
pub use error::{
    AppError, ErrorKind, GeolocationError, StorageError, VoiceError, WeatherError,
};
pub use favorites::FavoritesStore;
pub use i18n::{Locale, MessageKey};
pub use model::{Coordinates, ForecastDay, WeatherQuery, WeatherSnapshot, Wind};
pub use provider::WeatherProvider;
