//! Menu-driven session over a single [`App`].

use anyhow::Context;
use inquire::{InquireError, Select, Text};
use skycast_core::{App, Locale, MessageKey};
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::render::{self, Theme};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Search,
    UseLocation,
    Voice,
    ToggleFavorite,
    OpenFavorite,
    ToggleTheme,
    Language,
    Quit,
}

struct MenuItem {
    label: String,
    action: Action,
}

impl fmt::Display for MenuItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

fn menu(app: &App) -> Vec<MenuItem> {
    let state = app.state();
    let t = |key| state.locale.translate(key).to_string();

    let mut items = vec![
        MenuItem {
            label: t(MessageKey::SearchButton),
            action: Action::Search,
        },
        MenuItem {
            label: t(MessageKey::UseLocation),
            action: Action::UseLocation,
        },
        MenuItem {
            label: t(MessageKey::StartListening),
            action: Action::Voice,
        },
    ];

    if state.can_toggle_favorite() {
        let key = if app.is_favorite() {
            MessageKey::RemoveFromFavorites
        } else {
            MessageKey::AddToFavorites
        };
        items.push(MenuItem {
            label: t(key),
            action: Action::ToggleFavorite,
        });
    }

    items.push(MenuItem {
        label: t(MessageKey::Favorites),
        action: Action::OpenFavorite,
    });
    items.push(MenuItem {
        label: t(if state.dark_mode {
            MessageKey::LightMode
        } else {
            MessageKey::DarkMode
        }),
        action: Action::ToggleTheme,
    });
    items.push(MenuItem {
        label: t(MessageKey::Language),
        action: Action::Language,
    });
    items.push(MenuItem {
        label: t(MessageKey::Quit),
        action: Action::Quit,
    });
    items
}

/// `None` when the user backed out of the prompt.
fn cancelled<T>(res: Result<T, InquireError>) -> anyhow::Result<Option<T>> {
    match res {
        Ok(value) => Ok(Some(value)),
        Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
        Err(err) => Err(err).context("Prompt failed"),
    }
}

pub async fn run(mut app: App) -> anyhow::Result<()> {
    println!("{}", app.state().locale.translate(MessageKey::AppTitle));

    loop {
        let title = app.state().locale.translate(MessageKey::AppTitle);
        let Some(item) = cancelled(Select::new(title, menu(&app)).prompt())? else {
            return Ok(());
        };

        match item.action {
            Action::Search => {
                let locale = app.state().locale;
                let prompt = Text::new(locale.translate(MessageKey::SearchPlaceholder))
                    .with_initial_value(&app.state().query)
                    .prompt();
                let Some(query) = cancelled(prompt)? else {
                    continue;
                };
                app.set_query(query);
                if app.state().query.trim().is_empty() {
                    render::print_error(locale.translate(MessageKey::EmptyQuery), &theme(&app));
                    continue;
                }
                app.submit().await;
            }
            Action::UseLocation => {
                let cancel = CancellationToken::new();
                let guard = tokio::spawn({
                    let cancel = cancel.clone();
                    async move {
                        if tokio::signal::ctrl_c().await.is_ok() {
                            cancel.cancel();
                        }
                    }
                });
                app.use_location(&cancel).await;
                guard.abort();
            }
            Action::Voice => {
                let voice = app.voice();
                let guard = tokio::spawn(async move {
                    if tokio::signal::ctrl_c().await.is_ok() {
                        voice.stop();
                    }
                });
                println!(
                    "{}: Ctrl-C",
                    app.state().locale.translate(MessageKey::StopListening)
                );
                app.voice_search().await;
                guard.abort();
            }
            // A failed save is already in the state as a localized error.
            Action::ToggleFavorite => {
                if let Err(err) = app.toggle_favorite() {
                    debug!("favorite not saved: {err:#}");
                }
            }
            Action::OpenFavorite => {
                let favorites = app.favorites().to_vec();
                let locale = app.state().locale;
                if favorites.is_empty() {
                    render::print_favorites(&favorites, locale, &theme(&app));
                    continue;
                }
                let prompt =
                    Select::new(locale.translate(MessageKey::Favorites), favorites).prompt();
                if let Some(city) = cancelled(prompt)? {
                    app.select_favorite(&city).await;
                }
            }
            Action::ToggleTheme => {
                if let Err(err) = app.toggle_theme() {
                    debug!("theme not saved: {err:#}");
                }
            }
            Action::Language => {
                let title = app.state().locale.translate(MessageKey::Language);
                let locales: Vec<Locale> = Locale::all().to_vec();
                if let Some(locale) = cancelled(Select::new(title, locales).prompt())? {
                    app.set_locale(locale);
                }
            }
            Action::Quit => return Ok(()),
        }

        show(&mut app);
    }
}

fn theme(app: &App) -> Theme {
    Theme::new(app.state().dark_mode)
}

fn show(app: &mut App) {
    let theme = theme(app);
    if let Some(error) = &app.state().error {
        render::print_error(&error.message, &theme);
    }
    render::print_weather(app.state(), app.is_favorite(), &theme);
    app.dismiss_error();
}
