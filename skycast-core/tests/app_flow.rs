//! End-to-end flows through the App controller with a mocked provider.

use async_trait::async_trait;
use skycast_core::{
    App, Coordinates, ErrorKind, Locale, Services, VoiceError,
    geolocation::{FixedGeolocator, Geolocator, IpGeolocator, PositionOptions},
    provider::openweather::OpenWeatherProvider,
    storage::{
        DARK_MODE_KEY, FAVORITES_KEY, FileStorage, MemoryStorage, SharedStorage, Storage,
    },
    view::ConditionIcon,
    voice::{CommandRecognizer, RecognitionOptions, SpeechRecognizer, VoiceInput},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[derive(Debug)]
struct Dictation(&'static str);

#[async_trait]
impl SpeechRecognizer for Dictation {
    fn is_supported(&self) -> bool {
        true
    }

    async fn recognize(&self, _options: &RecognitionOptions) -> Result<String, VoiceError> {
        Ok(self.0.to_string())
    }
}

fn current_body(name: &str, temp: f64, main: &str) -> serde_json::Value {
    serde_json::json!({
        "coord": {"lon": 2.35, "lat": 48.85},
        "weather": [{"main": main, "description": main.to_lowercase()}],
        "main": {"temp": temp, "feels_like": temp, "humidity": 60},
        "wind": {"speed": 3.1, "deg": 200},
        "sys": {"country": "FR", "sunrise": 1714537800, "sunset": 1714590900},
        "timezone": 7200,
        "name": name
    })
}

struct Harness {
    server: MockServer,
    storage: SharedStorage,
}

impl Harness {
    async fn start() -> Self {
        Self::with_storage(Arc::new(MemoryStorage::new())).await
    }

    async fn with_storage(storage: SharedStorage) -> Self {
        Self {
            server: MockServer::start().await,
            storage,
        }
    }

    fn app_with(&self, geolocator: Box<dyn Geolocator>, voice: VoiceInput) -> App {
        let services = Services {
            provider: Box::new(OpenWeatherProvider::with_base_url(
                "KEY".to_string(),
                self.server.uri(),
            )),
            geolocator,
            voice: Arc::new(voice),
        };
        App::new(services, self.storage.clone(), Locale::En)
    }

    fn app(&self) -> App {
        self.app_with(
            Box::new(FixedGeolocator::new(Some(Coordinates {
                lat: 48.85,
                lon: 2.35,
            }))),
            VoiceInput::new(Box::new(CommandRecognizer::new(None))),
        )
    }

    async fn city(&self, name: &str, temp: f64, main: &str) {
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", name))
            .respond_with(ResponseTemplate::new(200).set_body_json(current_body(name, temp, main)))
            .mount(&self.server)
            .await;
    }

    async fn unknown_city(&self, name: &str) {
        Mock::given(method("GET"))
            .and(path("/weather"))
            .and(query_param("q", name))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "cod": "404",
                "message": "city not found"
            })))
            .mount(&self.server)
            .await;
    }
}

#[tokio::test]
async fn paris_query_renders_expected_view() {
    let h = Harness::start().await;
    h.city("Paris", 18.3, "Clouds").await;

    let mut app = h.app();
    app.set_query("Paris");
    app.submit().await;

    let state = app.state();
    assert!(!state.loading);
    assert!(state.error.is_none());

    let view = state.view().expect("snapshot present");
    assert_eq!(view.temperature, "18°");
    assert_eq!(view.humidity.value, "60%");
    assert_eq!(view.icon, ConditionIcon::Cloud);
    assert_eq!(view.wind_rotation_deg, Some(200));
}

#[tokio::test]
async fn unknown_city_shows_message_and_sets_no_snapshot() {
    let h = Harness::start().await;
    h.unknown_city("Zzzznotacity").await;

    let mut app = h.app();
    app.set_query("Zzzznotacity");
    app.submit().await;

    let state = app.state();
    assert!(state.snapshot.is_none());
    assert!(!state.loading);
    let error = state.error.as_ref().expect("error shown");
    assert_eq!(error.kind(), ErrorKind::NotFound);
    assert_eq!(error.message, "City not found. Please try again.");
}

#[tokio::test]
async fn failed_query_does_not_replace_previous_snapshot() {
    let h = Harness::start().await;
    h.city("Paris", 18.3, "Clouds").await;
    h.unknown_city("Zzzznotacity").await;

    let mut app = h.app();
    app.set_query("Paris");
    app.submit().await;
    app.set_query("Zzzznotacity");
    app.submit().await;

    let state = app.state();
    assert_eq!(state.error.as_ref().map(|e| e.kind()), Some(ErrorKind::NotFound));
    assert_eq!(
        state.snapshot.as_ref().map(|s| s.location_name.as_str()),
        Some("Paris")
    );
}

#[tokio::test]
async fn blank_submit_issues_no_request() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&h.server)
        .await;

    let mut app = h.app();
    app.set_query("   ");
    app.submit().await;

    assert!(!app.state().loading);
    assert!(app.state().snapshot.is_none());
    assert!(app.state().error.is_none());
}

#[tokio::test]
async fn denied_location_makes_no_coordinate_request() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(current_body("Paris", 18.3, "Clear")),
        )
        .expect(0)
        .mount(&h.server)
        .await;

    let mut app = h.app_with(
        Box::new(FixedGeolocator::denied()),
        VoiceInput::new(Box::new(CommandRecognizer::new(None))),
    );
    app.use_location(&CancellationToken::new()).await;

    let state = app.state();
    assert!(!state.locating);
    assert!(!state.loading);
    let error = state.error.as_ref().expect("error shown");
    assert_eq!(error.kind(), ErrorKind::GeolocationDenied);
    assert_eq!(error.message, "Location permission denied");
}

#[tokio::test]
async fn location_lookup_uses_coordinates() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "48.85"))
        .and(query_param("lon", "2.35"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(current_body("Paris", 21.0, "Clear")),
        )
        .expect(1)
        .mount(&h.server)
        .await;

    let mut app = h.app();
    app.use_location(&CancellationToken::new()).await;

    let state = app.state();
    assert!(!state.locating);
    assert!(!state.loading);
    assert_eq!(state.view().map(|v| v.temperature).as_deref(), Some("21°"));
}

#[tokio::test]
async fn ip_geolocation_feeds_coordinate_lookup() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "lat": 48.85,
            "lon": 2.35
        })))
        .mount(&h.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/weather"))
        .and(query_param("lat", "48.85"))
        .respond_with(ResponseTemplate::new(200).set_body_json(current_body("Paris", 15.0, "Rain")))
        .mount(&h.server)
        .await;

    let geolocator = IpGeolocator::new(format!("{}/json", h.server.uri()));
    let mut app = h
        .app_with(
            Box::new(geolocator),
            VoiceInput::new(Box::new(CommandRecognizer::new(None))),
        )
        .with_position_options(PositionOptions::default());
    app.use_location(&CancellationToken::new()).await;

    assert_eq!(
        app.state().view().map(|v| v.icon),
        Some(ConditionIcon::Rain)
    );
}

#[tokio::test]
async fn failed_ip_lookup_is_unavailable() {
    let h = Harness::start().await;
    Mock::given(method("GET"))
        .and(path("/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "fail",
            "message": "private range"
        })))
        .mount(&h.server)
        .await;

    let geolocator = IpGeolocator::new(format!("{}/json", h.server.uri()));
    let mut app = h.app_with(
        Box::new(geolocator),
        VoiceInput::new(Box::new(CommandRecognizer::new(None))),
    );
    app.use_location(&CancellationToken::new()).await;

    assert_eq!(
        app.state().error.as_ref().map(|e| e.kind()),
        Some(ErrorKind::GeolocationUnavailable)
    );
}

#[tokio::test]
async fn voice_query_is_submitted() {
    let h = Harness::start().await;
    h.city("Madrid", 27.4, "Clear").await;

    let mut app = h.app_with(
        Box::new(FixedGeolocator::new(None)),
        VoiceInput::new(Box::new(Dictation("Madrid"))),
    );
    app.voice_search().await;

    let state = app.state();
    assert!(!state.listening);
    assert_eq!(state.query, "Madrid");
    assert_eq!(
        state.snapshot.as_ref().map(|s| s.location_name.as_str()),
        Some("Madrid")
    );
}

#[tokio::test]
async fn unsupported_voice_is_reported() {
    let h = Harness::start().await;
    let mut app = h.app();
    app.voice_search().await;

    let state = app.state();
    assert!(!state.listening);
    assert_eq!(
        state.error.as_ref().map(|e| e.kind()),
        Some(ErrorKind::VoiceUnsupported)
    );
}

#[tokio::test]
async fn favorite_toggle_persists_provider_name() {
    let h = Harness::start().await;
    h.city("Paris", 18.3, "Clouds").await;

    let mut app = h.app();
    assert_eq!(app.toggle_favorite().unwrap(), None);

    app.set_query("Paris");
    app.submit().await;

    assert_eq!(app.toggle_favorite().unwrap(), Some(true));
    assert!(app.is_favorite());
    assert_eq!(app.favorites(), ["Paris"]);
    assert_eq!(h.storage.get(FAVORITES_KEY).as_deref(), Some(r#"["Paris"]"#));

    assert_eq!(app.toggle_favorite().unwrap(), Some(false));
    assert!(app.favorites().is_empty());
    assert_eq!(h.storage.get(FAVORITES_KEY).as_deref(), Some("[]"));
}

#[tokio::test]
async fn selecting_a_favorite_submits_it() {
    let h = Harness::start().await;
    h.city("Lyon", 12.0, "Rain").await;
    h.storage.set(FAVORITES_KEY, r#"["Lyon"]"#.into()).unwrap();

    let mut app = h.app();
    assert_eq!(app.favorites(), ["Lyon"]);

    app.select_favorite("Lyon").await;
    assert_eq!(app.state().query, "Lyon");
    assert_eq!(app.state().view().map(|v| v.temperature).as_deref(), Some("12°"));
}

#[tokio::test]
async fn theme_is_restored_and_persisted() {
    let h = Harness::start().await;
    h.storage.set(DARK_MODE_KEY, "true".into()).unwrap();

    let mut app = h.app();
    assert!(app.state().dark_mode);

    assert!(!app.toggle_theme().unwrap());
    assert!(!app.state().dark_mode);
    assert_eq!(h.storage.get(DARK_MODE_KEY).as_deref(), Some("false"));
}

/// A storage file whose parent "directory" is a regular file, so every write fails.
fn unwritable_storage(dir: &tempfile::TempDir) -> SharedStorage {
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();
    Arc::new(FileStorage::open(blocker.join("storage.json")))
}

#[tokio::test]
async fn failed_favorite_write_is_shown_and_keeps_list() {
    let dir = tempfile::tempdir().unwrap();
    let h = Harness::with_storage(unwritable_storage(&dir)).await;
    h.city("Paris", 18.3, "Clouds").await;

    let mut app = h.app();
    app.set_query("Paris");
    app.submit().await;

    assert!(app.toggle_favorite().is_err());
    assert!(!app.is_favorite());
    assert!(app.favorites().is_empty());

    let state = app.state();
    assert_eq!(state.error.as_ref().map(|e| e.kind()), Some(ErrorKind::StorageError));
    assert_eq!(state.view().map(|v| v.temperature).as_deref(), Some("18°"));

    // The retry tries the write again instead of reporting "already there".
    assert!(app.toggle_favorite().is_err());
    assert!(app.favorites().is_empty());
}

#[tokio::test]
async fn failed_theme_write_keeps_theme() {
    let dir = tempfile::tempdir().unwrap();
    let h = Harness::with_storage(unwritable_storage(&dir)).await;

    let mut app = h.app();
    assert!(app.toggle_theme().is_err());
    assert!(!app.state().dark_mode);
    assert_eq!(app.state().error.as_ref().map(|e| e.kind()), Some(ErrorKind::StorageError));

    app.dismiss_error();
    assert!(app.state().error.is_none());
}

#[tokio::test]
async fn forecast_is_fetched_when_enabled() {
    let h = Harness::start().await;
    h.city("Paris", 18.3, "Clouds").await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .and(query_param("lat", "48.85"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "list": [
                {
                    "dt": 1714521600,
                    "main": {"temp_min": 10.0, "temp_max": 14.0},
                    "weather": [{"main": "Clear"}]
                },
                {
                    "dt": 1714608000,
                    "main": {"temp_min": 8.0, "temp_max": 12.0},
                    "weather": [{"main": "Rain"}]
                }
            ],
            "city": {"timezone": 0}
        })))
        .expect(1)
        .mount(&h.server)
        .await;

    let mut app = h.app();
    app.set_forecast(true);
    app.set_query("Paris");
    app.submit().await;

    let forecast = app.state().forecast.as_ref().expect("forecast loaded");
    assert_eq!(forecast.len(), 2);
    assert_eq!(forecast[1].condition, "Rain");
}

#[tokio::test]
async fn forecast_failure_keeps_current_conditions() {
    let h = Harness::start().await;
    h.city("Paris", 18.3, "Clouds").await;
    Mock::given(method("GET"))
        .and(path("/forecast"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&h.server)
        .await;

    let mut app = h.app();
    app.set_forecast(true);
    app.set_query("Paris");
    app.submit().await;

    assert!(app.state().snapshot.is_some());
    assert!(app.state().forecast.is_none());
    assert!(app.state().error.is_none());
}
