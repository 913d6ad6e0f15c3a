//! Application state, its transitions, and the controller that drives them.
//!
//! [`AppState::apply`] is a pure function from the current state and an
//! [`Event`] to the next state. [`App`] owns the state together with every
//! collaborator and performs the side effects (network, geolocation, voice,
//! storage), feeding each outcome back in as an event.

use anyhow::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    error::{AppError, ErrorKind, GeolocationError, StorageError, VoiceError, WeatherError},
    favorites::FavoritesStore,
    geolocation::{self, Geolocator, PositionOptions},
    i18n::Locale,
    model::{ForecastDay, WeatherQuery, WeatherSnapshot},
    preferences::Preferences,
    provider::WeatherProvider,
    storage::SharedStorage,
    view::WeatherView,
    voice::VoiceInput,
};

/// An error as shown to the user: the cause plus its localized text.
#[derive(Debug, Clone, PartialEq)]
pub struct UiError {
    pub error: AppError,
    pub message: String,
}

impl UiError {
    fn new(error: AppError, locale: Locale) -> Self {
        let message = error.localized(locale);
        Self { error, message }
    }

    pub fn kind(&self) -> ErrorKind {
        self.error.kind()
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppState {
    pub query: String,
    pub snapshot: Option<WeatherSnapshot>,
    pub forecast: Option<Vec<ForecastDay>>,
    pub error: Option<UiError>,
    /// A weather query is in flight.
    pub loading: bool,
    /// A geolocation request is in flight.
    pub locating: bool,
    /// A voice session is in flight.
    pub listening: bool,
    pub dark_mode: bool,
    pub locale: Locale,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    QueryChanged(String),
    SubmitStarted,
    WeatherLoaded {
        snapshot: WeatherSnapshot,
        forecast: Option<Vec<ForecastDay>>,
    },
    WeatherFailed(WeatherError),
    LocateStarted,
    /// A position was found; its weather lookup starts immediately.
    LocateSucceeded,
    LocateFailed(GeolocationError),
    ListenStarted,
    /// `None` when the session was stopped before a transcript arrived.
    ListenFinished(Option<String>),
    ListenFailed(VoiceError),
    DarkModeChanged(bool),
    /// Favorites or the theme could not be saved.
    StorageFailed(StorageError),
    LocaleChanged(Locale),
    ErrorDismissed,
}

impl AppState {
    pub fn new(dark_mode: bool, locale: Locale) -> Self {
        Self {
            dark_mode,
            locale,
            ..Self::default()
        }
    }

    /// Submitting needs a non-blank query and no query already in flight.
    pub fn can_submit(&self) -> bool {
        !self.loading && !self.query.trim().is_empty()
    }

    pub fn can_toggle_favorite(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn view(&self) -> Option<WeatherView> {
        self.snapshot
            .as_ref()
            .map(|snapshot| WeatherView::new(snapshot, self.locale))
    }

    pub fn apply(self, event: Event) -> Self {
        match event {
            Event::QueryChanged(query) => Self { query, ..self },
            Event::SubmitStarted if !self.can_submit() => self,
            Event::SubmitStarted => Self {
                loading: true,
                error: None,
                ..self
            },
            Event::WeatherLoaded { snapshot, forecast } => Self {
                snapshot: Some(snapshot),
                forecast,
                error: None,
                loading: false,
                ..self
            },
            // The last good snapshot stays on screen under the error.
            Event::WeatherFailed(err) => Self {
                error: Some(UiError::new(err.into(), self.locale)),
                loading: false,
                ..self
            },
            Event::LocateStarted if self.locating || self.loading => self,
            Event::LocateStarted => Self {
                locating: true,
                error: None,
                ..self
            },
            Event::LocateSucceeded => Self {
                locating: false,
                loading: true,
                ..self
            },
            Event::LocateFailed(GeolocationError::Cancelled) => Self {
                locating: false,
                ..self
            },
            Event::LocateFailed(err) => Self {
                error: Some(UiError::new(err.into(), self.locale)),
                locating: false,
                ..self
            },
            Event::ListenStarted => Self {
                listening: true,
                error: None,
                ..self
            },
            Event::ListenFinished(Some(transcript)) => Self {
                query: transcript,
                listening: false,
                ..self
            },
            Event::ListenFinished(None) => Self {
                listening: false,
                ..self
            },
            Event::ListenFailed(err) => Self {
                error: Some(UiError::new(err.into(), self.locale)),
                listening: false,
                ..self
            },
            Event::DarkModeChanged(dark_mode) => Self { dark_mode, ..self },
            Event::StorageFailed(err) => Self {
                error: Some(UiError::new(err.into(), self.locale)),
                ..self
            },
            Event::LocaleChanged(locale) => Self {
                error: self.error.map(|e| UiError::new(e.error, locale)),
                locale,
                ..self
            },
            Event::ErrorDismissed => Self {
                error: None,
                ..self
            },
        }
    }
}

/// Platform capabilities the controller drives.
#[derive(Debug)]
pub struct Services {
    pub provider: Box<dyn WeatherProvider>,
    pub geolocator: Box<dyn Geolocator>,
    pub voice: Arc<VoiceInput>,
}

#[derive(Debug)]
pub struct App {
    state: AppState,
    services: Services,
    favorites: FavoritesStore,
    preferences: Preferences,
    position_options: PositionOptions,
    with_forecast: bool,
}

impl App {
    /// Build the controller, restoring favorites and theme from `storage`.
    pub fn new(services: Services, storage: SharedStorage, locale: Locale) -> Self {
        let favorites = FavoritesStore::load(storage.clone());
        let preferences = Preferences::load(storage);
        Self {
            state: AppState::new(preferences.dark_mode(), locale),
            services,
            favorites,
            preferences,
            position_options: PositionOptions::default(),
            with_forecast: false,
        }
    }

    pub fn with_position_options(mut self, options: PositionOptions) -> Self {
        self.position_options = options;
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn favorites(&self) -> &[String] {
        self.favorites.list()
    }

    pub fn is_favorite(&self) -> bool {
        self.state
            .snapshot
            .as_ref()
            .is_some_and(|s| self.favorites.contains(&s.location_name))
    }

    /// Handle to the voice session, so another task can stop it.
    pub fn voice(&self) -> Arc<VoiceInput> {
        self.services.voice.clone()
    }

    /// Whether successful lookups also fetch the daily forecast.
    pub fn set_forecast(&mut self, enabled: bool) {
        self.with_forecast = enabled;
    }

    fn dispatch(&mut self, event: Event) {
        debug!(?event, "applying event");
        let state = std::mem::take(&mut self.state);
        self.state = state.apply(event);
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.dispatch(Event::QueryChanged(query.into()));
    }

    /// Look up the current query. Blank input or a lookup already in flight is ignored.
    pub async fn submit(&mut self) {
        if !self.state.can_submit() {
            debug!(query = %self.state.query, "submit ignored");
            return;
        }
        self.dispatch(Event::SubmitStarted);

        let query = WeatherQuery::City(self.state.query.trim().to_string());
        let event = self.load(query).await;
        self.dispatch(event);
    }

    /// Find the device position, then look up its weather.
    pub async fn use_location(&mut self, cancel: &CancellationToken) {
        if self.state.locating || self.state.loading {
            return;
        }
        self.dispatch(Event::LocateStarted);

        let position = geolocation::locate(
            self.services.geolocator.as_ref(),
            &self.position_options,
            cancel,
        )
        .await;

        match position {
            Ok(coords) => {
                info!(lat = coords.lat, lon = coords.lon, "position found");
                self.dispatch(Event::LocateSucceeded);
                let event = self.load(WeatherQuery::Coordinates(coords)).await;
                self.dispatch(event);
            }
            Err(err) => {
                warn!(%err, "geolocation failed");
                self.dispatch(Event::LocateFailed(err));
            }
        }
    }

    /// Take one spoken query and submit it.
    pub async fn voice_search(&mut self) {
        let voice = self.services.voice.clone();
        if !voice.is_supported() {
            self.dispatch(Event::ListenFailed(VoiceError::Unsupported));
            return;
        }

        self.dispatch(Event::ListenStarted);
        match voice.start(self.state.locale).await {
            Ok(Some(transcript)) => {
                info!(%transcript, "voice query recognized");
                self.dispatch(Event::ListenFinished(Some(transcript)));
                self.submit().await;
            }
            Ok(None) => self.dispatch(Event::ListenFinished(None)),
            Err(err) => {
                warn!(%err, "voice search failed");
                self.dispatch(Event::ListenFailed(err));
            }
        }
    }

    /// Put a favorite in the search box and look it up.
    pub async fn select_favorite(&mut self, city: &str) {
        self.set_query(city);
        self.submit().await;
    }

    /// Add or remove the shown location. `None` when nothing is shown.
    ///
    /// A failed write leaves the list as it was and is also shown as the
    /// current error.
    pub fn toggle_favorite(&mut self) -> Result<Option<bool>> {
        let Some(snapshot) = &self.state.snapshot else {
            return Ok(None);
        };
        let city = snapshot.location_name.clone();
        match self.favorites.toggle(&city) {
            Ok(now_favorite) => Ok(Some(now_favorite)),
            Err(err) => Err(self.storage_failed(err)),
        }
    }

    /// Flip the theme. On a failed write the theme stays as it was.
    pub fn toggle_theme(&mut self) -> Result<bool> {
        match self.preferences.toggle_dark_mode() {
            Ok(dark_mode) => {
                self.dispatch(Event::DarkModeChanged(dark_mode));
                Ok(dark_mode)
            }
            Err(err) => Err(self.storage_failed(err)),
        }
    }

    fn storage_failed(&mut self, err: anyhow::Error) -> anyhow::Error {
        warn!("could not save settings: {err:#}");
        self.dispatch(Event::StorageFailed(StorageError(format!("{err:#}"))));
        err
    }

    pub fn set_locale(&mut self, locale: Locale) {
        self.dispatch(Event::LocaleChanged(locale));
    }

    pub fn dismiss_error(&mut self) {
        self.dispatch(Event::ErrorDismissed);
    }

    async fn load(&self, query: WeatherQuery) -> Event {
        let provider = self.services.provider.as_ref();
        let snapshot = match provider.fetch(&query).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(%err, ?query, "weather lookup failed");
                return Event::WeatherFailed(err);
            }
        };

        let forecast = if self.with_forecast {
            let by_position = WeatherQuery::Coordinates(snapshot.coordinates);
            match provider.fetch_forecast(&by_position).await {
                Ok(days) => Some(days),
                Err(err) => {
                    warn!(%err, "forecast lookup failed, showing current conditions only");
                    None
                }
            }
        } else {
            None
        };

        Event::WeatherLoaded { snapshot, forecast }
    }
}
