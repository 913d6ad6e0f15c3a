use thiserror::Error;

use crate::i18n::{Locale, MessageKey};

/// Failures of a single weather lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeatherError {
    /// The provider answered 404: the query matched no location.
    #[error("City not found")]
    NotFound,

    /// The provider was reachable but answered with a structured failure.
    #[error("Weather provider error: {0}")]
    Provider(String),

    /// The request never completed (DNS, connection, TLS, broken body).
    #[error("Network error: {0}")]
    Network(String),

    /// Blank input, rejected before any request is built.
    #[error("Query must not be blank")]
    EmptyQuery,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location unavailable: {0}")]
    Unavailable(String),
    #[error("Location request timed out")]
    Timeout,
    #[error("Location request cancelled")]
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VoiceError {
    #[error("Speech recognition is not supported in this environment")]
    Unsupported,
    #[error("Speech recognition failed: {0}")]
    Recognition(String),
    #[error("A voice session is already listening")]
    AlreadyListening,
}

/// Favorites or preferences could not be written; the previous value is kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Could not save settings: {0}")]
pub struct StorageError(pub String);

/// Coarse error category shown alongside the localized message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    ProviderError,
    NetworkError,
    EmptyQuery,
    GeolocationDenied,
    GeolocationUnavailable,
    GeolocationTimeout,
    VoiceUnsupported,
    VoiceError,
    StorageError,
}

/// Every failure the application can surface to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error(transparent)]
    Weather(#[from] WeatherError),
    #[error(transparent)]
    Geolocation(#[from] GeolocationError),
    #[error(transparent)]
    Voice(#[from] VoiceError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Weather(WeatherError::NotFound) => ErrorKind::NotFound,
            AppError::Weather(WeatherError::Provider(_)) => ErrorKind::ProviderError,
            AppError::Weather(WeatherError::Network(_)) => ErrorKind::NetworkError,
            AppError::Weather(WeatherError::EmptyQuery) => ErrorKind::EmptyQuery,
            AppError::Geolocation(GeolocationError::PermissionDenied) => {
                ErrorKind::GeolocationDenied
            }
            AppError::Geolocation(GeolocationError::Timeout) => ErrorKind::GeolocationTimeout,
            AppError::Geolocation(_) => ErrorKind::GeolocationUnavailable,
            AppError::Voice(VoiceError::Unsupported) => ErrorKind::VoiceUnsupported,
            AppError::Voice(_) => ErrorKind::VoiceError,
            AppError::Storage(_) => ErrorKind::StorageError,
        }
    }

    pub fn message_key(&self) -> MessageKey {
        match self.kind() {
            ErrorKind::NotFound => MessageKey::CityNotFound,
            ErrorKind::ProviderError => MessageKey::FetchError,
            ErrorKind::NetworkError => MessageKey::NetworkError,
            ErrorKind::EmptyQuery => MessageKey::EmptyQuery,
            ErrorKind::GeolocationDenied => MessageKey::LocationDenied,
            ErrorKind::GeolocationUnavailable => MessageKey::LocationUnavailable,
            ErrorKind::GeolocationTimeout => MessageKey::LocationTimeout,
            ErrorKind::VoiceUnsupported => MessageKey::VoiceNotSupported,
            ErrorKind::VoiceError => MessageKey::VoiceError,
            ErrorKind::StorageError => MessageKey::StorageError,
        }
    }

    /// User-facing text in `locale`. Provider and storage failures carry their detail.
    pub fn localized(&self, locale: Locale) -> String {
        let base = locale.translate(self.message_key());
        match self {
            AppError::Weather(WeatherError::Provider(message))
            | AppError::Storage(StorageError(message))
                if !message.is_empty() =>
            {
                format!("{base}: {message}")
            }
            _ => base.to_string(),
        }
    }
}
