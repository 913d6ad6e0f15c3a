use anyhow::{Context, anyhow};
use clap::{Parser, Subcommand, ValueEnum};
use inquire::{Confirm, CustomType, Password, Select, Text};
use skycast_core::{
    App, Config, FavoritesStore, Locale, MessageKey, Services,
    geolocation::geolocator_from_config,
    preferences::Preferences,
    provider::provider_from_config,
    storage::{FileStorage, SharedStorage},
    voice::{CommandRecognizer, VoiceInput},
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{interactive, render};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "skycast", version, about = "Weather lookup by city, location or voice")]
pub struct Cli {
    /// UI language: en, es or fr. Defaults to the config file, then $LANG.
    #[arg(long, global = true, value_parser = parse_locale)]
    pub lang: Option<Locale>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store the API key and other settings.
    Configure,

    /// Show the weather for a city.
    Show {
        /// City name, e.g. "Paris" or "Paris,FR".
        city: String,

        /// Also show the daily forecast.
        #[arg(long)]
        forecast: bool,

        /// Add the city to favorites, or remove it if already there.
        #[arg(long)]
        favorite: bool,
    },

    /// Show the weather at the current location.
    Here {
        #[arg(long)]
        forecast: bool,
    },

    /// Speak a city name and show its weather.
    Listen {
        #[arg(long)]
        forecast: bool,
    },

    /// Manage favorite cities.
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },

    /// Switch between dark and light output.
    Theme { mode: ThemeMode },

    /// Menu-driven session.
    Interactive,
}

#[derive(Debug, Subcommand)]
pub enum FavoritesAction {
    List,
    /// Look the city up and store the name the provider returns.
    Add { city: String },
    Remove { city: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ThemeMode {
    Dark,
    Light,
    Toggle,
}

fn parse_locale(value: &str) -> anyhow::Result<Locale> {
    Locale::try_from(value)
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        let config = Config::load()?;
        let locale = self.lang.unwrap_or_else(|| config.locale());
        debug!(%locale, "starting");

        match self.command {
            Command::Configure => configure(config),
            Command::Show {
                city,
                forecast,
                favorite,
            } => {
                let mut app = build_app(&config, locale)?;
                app.set_forecast(forecast);
                app.set_query(city);
                app.submit().await;
                if favorite {
                    app.toggle_favorite()?;
                }
                finish(&app)
            }
            Command::Here { forecast } => {
                let mut app = build_app(&config, locale)?;
                app.set_forecast(forecast);

                let cancel = CancellationToken::new();
                let guard = cancel_on_ctrl_c(cancel.clone());
                app.use_location(&cancel).await;
                guard.abort();
                finish(&app)
            }
            Command::Listen { forecast } => {
                let mut app = build_app(&config, locale)?;
                app.set_forecast(forecast);

                let voice = app.voice();
                let guard = tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        voice.stop();
                    }
                });
                println!("{}", locale.translate(MessageKey::StartListening));
                app.voice_search().await;
                guard.abort();
                finish(&app)
            }
            Command::Favorites { action } => favorites(action, &config, locale).await,
            Command::Theme { mode } => {
                let mut prefs = Preferences::load(open_storage()?);
                let dark = match mode {
                    ThemeMode::Dark => true,
                    ThemeMode::Light => false,
                    ThemeMode::Toggle => !prefs.dark_mode(),
                };
                prefs.set_dark_mode(dark)?;
                let key = if dark {
                    MessageKey::DarkMode
                } else {
                    MessageKey::LightMode
                };
                println!("{}", locale.translate(key));
                Ok(())
            }
            Command::Interactive => {
                let app = build_app(&config, locale)?;
                interactive::run(app).await
            }
        }
    }
}

async fn favorites(
    action: FavoritesAction,
    config: &Config,
    locale: Locale,
) -> anyhow::Result<()> {
    match action {
        FavoritesAction::List => {
            let store = FavoritesStore::load(open_storage()?);
            let theme = render::Theme::new(Preferences::load(open_storage()?).dark_mode());
            render::print_favorites(store.list(), locale, &theme);
            Ok(())
        }
        FavoritesAction::Add { city } => {
            let mut app = build_app(config, locale)?;
            app.set_query(city);
            app.submit().await;
            if let Some(error) = &app.state().error {
                return Err(anyhow!("{}", error.message));
            }
            if !app.is_favorite() {
                app.toggle_favorite()?;
            }
            let theme = render::Theme::new(app.state().dark_mode);
            render::print_favorites(app.favorites(), locale, &theme);
            Ok(())
        }
        FavoritesAction::Remove { city } => {
            let mut store = FavoritesStore::load(open_storage()?);
            if !store.remove(&city)? {
                return Err(anyhow!("'{city}' is not in favorites"));
            }
            let theme = render::Theme::new(Preferences::load(open_storage()?).dark_mode());
            render::print_favorites(store.list(), locale, &theme);
            Ok(())
        }
    }
}

fn open_storage() -> anyhow::Result<SharedStorage> {
    Ok(Arc::new(FileStorage::open(Config::storage_file_path()?)))
}

fn build_app(config: &Config, locale: Locale) -> anyhow::Result<App> {
    let services = Services {
        provider: provider_from_config(config)?,
        geolocator: geolocator_from_config(&config.geolocation),
        voice: Arc::new(VoiceInput::new(Box::new(CommandRecognizer::new(
            config.voice.command.as_deref(),
        )))),
    };

    Ok(App::new(services, open_storage()?, locale).with_position_options(config.position_options()))
}

fn cancel_on_ctrl_c(cancel: CancellationToken) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.cancel();
        }
    })
}

/// Print the outcome of a one-shot command; a shown error becomes the exit error.
fn finish(app: &App) -> anyhow::Result<()> {
    let state = app.state();
    let theme = render::Theme::new(state.dark_mode);

    if let Some(error) = &state.error {
        return Err(anyhow!("{}", error.message));
    }
    render::print_weather(state, app.is_favorite(), &theme);
    Ok(())
}

fn configure(mut config: Config) -> anyhow::Result<()> {
    let api_key = Password::new("OpenWeather API key:")
        .without_confirmation()
        .with_help_message("Stored in the config file; SKYCAST_API_KEY overrides it")
        .prompt()
        .context("Failed to read API key")?;
    if !api_key.trim().is_empty() {
        config.set_api_key(api_key);
    }

    let locales: Vec<LocaleChoice> = Locale::all().iter().copied().map(LocaleChoice).collect();
    let current = Locale::all()
        .iter()
        .position(|l| *l == config.locale())
        .unwrap_or(0);
    let choice = Select::new("Language:", locales)
        .with_starting_cursor(current)
        .prompt()
        .context("Failed to read language")?;
    config.locale = Some(choice.0);

    config.geolocation.enabled = Confirm::new("Allow location lookups?")
        .with_default(config.geolocation.enabled)
        .prompt()
        .context("Failed to read location permission")?;

    if config.geolocation.enabled
        && Confirm::new("Use a fixed home position instead of IP lookup?")
            .with_default(config.geolocation.latitude.is_some())
            .prompt()
            .context("Failed to read position choice")?
    {
        let lat = CustomType::<f64>::new("Latitude:")
            .with_error_message("Please enter a number, e.g. 48.85")
            .prompt()
            .context("Failed to read latitude")?;
        let lon = CustomType::<f64>::new("Longitude:")
            .with_error_message("Please enter a number, e.g. 2.35")
            .prompt()
            .context("Failed to read longitude")?;
        config.geolocation.latitude = Some(lat);
        config.geolocation.longitude = Some(lon);
    } else {
        config.geolocation.latitude = None;
        config.geolocation.longitude = None;
    }

    let command = Text::new("Dictation command for voice search (empty to disable):")
        .with_initial_value(config.voice.command.as_deref().unwrap_or_default())
        .prompt()
        .context("Failed to read dictation command")?;
    config.voice.command = Some(command.trim().to_string()).filter(|c| !c.is_empty());

    config.save()?;
    println!(
        "Configuration saved to {}",
        Config::config_file_path()?.display()
    );
    Ok(())
}

struct LocaleChoice(Locale);

impl std::fmt::Display for LocaleChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.0.display_name(), self.0)
    }
}
