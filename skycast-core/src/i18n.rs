//! Static string tables for the supported UI languages.
//!
//! Every table is an exhaustive `match`, so adding a [`MessageKey`] without
//! translating it in every locale does not compile.

use serde::{Deserialize, Serialize};
use std::{convert::TryFrom, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Es,
    Fr,
}

impl Locale {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Es => "es",
            Locale::Fr => "fr",
        }
    }

    pub const fn all() -> &'static [Locale] {
        &[Locale::En, Locale::Es, Locale::Fr]
    }

    /// Native name, for language pickers.
    pub fn display_name(&self) -> &'static str {
        match self {
            Locale::En => "English",
            Locale::Es => "Español",
            Locale::Fr => "Français",
        }
    }

    /// Best-effort match of a language tag such as `fr_FR.UTF-8` or `es-419`.
    pub fn detect(tag: &str) -> Option<Locale> {
        let primary = tag
            .split(['_', '-', '.', '@'])
            .next()
            .unwrap_or_default();
        Locale::try_from(primary).ok()
    }

    /// Locale from the usual POSIX environment variables, in priority order.
    pub fn from_env() -> Option<Locale> {
        ["LC_ALL", "LC_MESSAGES", "LANG"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .find_map(|value| Locale::detect(&value))
    }

    pub fn translate(&self, key: MessageKey) -> &'static str {
        match self {
            Locale::En => english(key),
            Locale::Es => spanish(key),
            Locale::Fr => french(key),
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Locale {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_lowercase().as_str() {
            "en" => Ok(Locale::En),
            "es" => Ok(Locale::Es),
            "fr" => Ok(Locale::Fr),
            _ => Err(anyhow::anyhow!(
                "Unknown language '{value}'. Supported languages: en, es, fr."
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    AppTitle,
    SearchPlaceholder,
    SearchButton,
    Loading,
    UseLocation,
    Favorites,
    AddToFavorites,
    RemoveFromFavorites,
    FeelsLike,
    Humidity,
    Wind,
    Sunrise,
    Sunset,
    Forecast,
    NoFavorites,
    CityNotFound,
    FetchError,
    NetworkError,
    EmptyQuery,
    LocationDenied,
    LocationUnavailable,
    LocationTimeout,
    VoiceNotSupported,
    VoiceError,
    StartListening,
    StopListening,
    DarkMode,
    LightMode,
    Language,
    Quit,
    StorageError,
}

impl MessageKey {
    /// Table key as stored in translation files.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKey::AppTitle => "appTitle",
            MessageKey::SearchPlaceholder => "searchPlaceholder",
            MessageKey::SearchButton => "searchButton",
            MessageKey::Loading => "loading",
            MessageKey::UseLocation => "useLocation",
            MessageKey::Favorites => "favorites",
            MessageKey::AddToFavorites => "addToFavorites",
            MessageKey::RemoveFromFavorites => "removeFromFavorites",
            MessageKey::FeelsLike => "feelsLike",
            MessageKey::Humidity => "humidity",
            MessageKey::Wind => "wind",
            MessageKey::Sunrise => "sunrise",
            MessageKey::Sunset => "sunset",
            MessageKey::Forecast => "forecast",
            MessageKey::NoFavorites => "noFavorites",
            MessageKey::CityNotFound => "cityNotFound",
            MessageKey::FetchError => "fetchError",
            MessageKey::NetworkError => "networkError",
            MessageKey::EmptyQuery => "emptyQuery",
            MessageKey::LocationDenied => "locationDenied",
            MessageKey::LocationUnavailable => "locationUnavailable",
            MessageKey::LocationTimeout => "locationTimeout",
            MessageKey::VoiceNotSupported => "voiceNotSupported",
            MessageKey::VoiceError => "voiceError",
            MessageKey::StartListening => "startListening",
            MessageKey::StopListening => "stopListening",
            MessageKey::DarkMode => "darkMode",
            MessageKey::LightMode => "lightMode",
            MessageKey::Language => "language",
            MessageKey::Quit => "quit",
            MessageKey::StorageError => "storageError",
        }
    }
}

fn english(key: MessageKey) -> &'static str {
    match key {
        MessageKey::AppTitle => "SkycastWeather",
        MessageKey::SearchPlaceholder => "Enter city name...",
        MessageKey::SearchButton => "SET",
        MessageKey::Loading => "LOADING...",
        MessageKey::UseLocation => "Use My Location",
        MessageKey::Favorites => "Favorites",
        MessageKey::AddToFavorites => "Add to Favorites",
        MessageKey::RemoveFromFavorites => "Remove from Favorites",
        MessageKey::FeelsLike => "Feels like",
        MessageKey::Humidity => "Humidity",
        MessageKey::Wind => "Wind",
        MessageKey::Sunrise => "Sunrise",
        MessageKey::Sunset => "Sunset",
        MessageKey::Forecast => "Forecast",
        MessageKey::NoFavorites => "No favorites yet",
        MessageKey::CityNotFound => "City not found. Please try again.",
        MessageKey::FetchError => "Error fetching weather data",
        MessageKey::NetworkError => "Network error. Please check your connection",
        MessageKey::EmptyQuery => "Please enter a city name",
        MessageKey::LocationDenied => "Location permission denied",
        MessageKey::LocationUnavailable => "Unable to get your location",
        MessageKey::LocationTimeout => "Location request timed out",
        MessageKey::VoiceNotSupported => "Voice search is not supported here",
        MessageKey::VoiceError => "Could not understand, please try again",
        MessageKey::StartListening => "Start voice search",
        MessageKey::StopListening => "Stop listening",
        MessageKey::DarkMode => "Dark mode",
        MessageKey::LightMode => "Light mode",
        MessageKey::Language => "Language",
        MessageKey::Quit => "Quit",
        MessageKey::StorageError => "Could not save settings",
    }
}

fn spanish(key: MessageKey) -> &'static str {
    match key {
        MessageKey::AppTitle => "SkycastWeather",
        MessageKey::SearchPlaceholder => "Ingrese el nombre de la ciudad...",
        MessageKey::SearchButton => "BUSCAR",
        MessageKey::Loading => "CARGANDO...",
        MessageKey::UseLocation => "Usar Mi Ubicación",
        MessageKey::Favorites => "Favoritos",
        MessageKey::AddToFavorites => "Añadir a Favoritos",
        MessageKey::RemoveFromFavorites => "Quitar de Favoritos",
        MessageKey::FeelsLike => "Sensación",
        MessageKey::Humidity => "Humedad",
        MessageKey::Wind => "Viento",
        MessageKey::Sunrise => "Amanecer",
        MessageKey::Sunset => "Atardecer",
        MessageKey::Forecast => "Pronóstico",
        MessageKey::NoFavorites => "Aún no hay favoritos",
        MessageKey::CityNotFound => "Ciudad no encontrada. Inténtelo de nuevo.",
        MessageKey::FetchError => "Error al obtener datos del clima",
        MessageKey::NetworkError => "Error de red. Compruebe su conexión",
        MessageKey::EmptyQuery => "Ingrese el nombre de una ciudad",
        MessageKey::LocationDenied => "Permiso de ubicación denegado",
        MessageKey::LocationUnavailable => "No se puede obtener su ubicación",
        MessageKey::LocationTimeout => "Se agotó el tiempo para obtener la ubicación",
        MessageKey::VoiceNotSupported => "La búsqueda por voz no está disponible aquí",
        MessageKey::VoiceError => "No se entendió, inténtelo de nuevo",
        MessageKey::StartListening => "Iniciar búsqueda por voz",
        MessageKey::StopListening => "Dejar de escuchar",
        MessageKey::DarkMode => "Modo oscuro",
        MessageKey::LightMode => "Modo claro",
        MessageKey::Language => "Idioma",
        MessageKey::Quit => "Salir",
        MessageKey::StorageError => "No se pudieron guardar los ajustes",
    }
}

fn french(key: MessageKey) -> &'static str {
    match key {
        MessageKey::AppTitle => "SkycastWeather",
        MessageKey::SearchPlaceholder => "Entrez le nom de la ville...",
        MessageKey::SearchButton => "DÉFINIR",
        MessageKey::Loading => "CHARGEMENT...",
        MessageKey::UseLocation => "Utiliser Ma Position",
        MessageKey::Favorites => "Favoris",
        MessageKey::AddToFavorites => "Ajouter aux Favoris",
        MessageKey::RemoveFromFavorites => "Retirer des Favoris",
        MessageKey::FeelsLike => "Ressenti",
        MessageKey::Humidity => "Humidité",
        MessageKey::Wind => "Vent",
        MessageKey::Sunrise => "Lever du soleil",
        MessageKey::Sunset => "Coucher du soleil",
        MessageKey::Forecast => "Prévisions",
        MessageKey::NoFavorites => "Pas encore de favoris",
        MessageKey::CityNotFound => "Ville introuvable. Veuillez réessayer.",
        MessageKey::FetchError => "Erreur lors de la récupération des données météo",
        MessageKey::NetworkError => "Erreur réseau. Vérifiez votre connexion",
        MessageKey::EmptyQuery => "Veuillez saisir le nom d'une ville",
        MessageKey::LocationDenied => "Accès à la position refusé",
        MessageKey::LocationUnavailable => "Impossible d'obtenir votre position",
        MessageKey::LocationTimeout => "La demande de position a expiré",
        MessageKey::VoiceNotSupported => "La recherche vocale n'est pas disponible ici",
        MessageKey::VoiceError => "Je n'ai pas compris, veuillez réessayer",
        MessageKey::StartListening => "Démarrer la recherche vocale",
        MessageKey::StopListening => "Arrêter l'écoute",
        MessageKey::DarkMode => "Mode sombre",
        MessageKey::LightMode => "Mode clair",
        MessageKey::Language => "Langue",
        MessageKey::Quit => "Quitter",
        MessageKey::StorageError => "Impossible d'enregistrer les réglages",
    }
}
