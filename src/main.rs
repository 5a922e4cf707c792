mod api;
mod chat;
mod config;
mod search;

use iced::{
    widget::{column, container, row, scrollable, text, text_input, button, text_input::Id},
    Element, Length, Task, Theme, Font, Subscription,
    time, clipboard,
    keyboard::{self, Key},
    event::{self, Event as IcedEvent},
    alignment,
    window,
};
use std::sync::Arc;
use std::time::Duration;

use api::{ApiClient, ApiError, Suggestion, WeatherRecord};
use chat::{ChatController, Role};
use search::{SearchController, SearchRequest};

const SPINNER_FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

fn main() -> iced::Result {
    env_logger::init();

    let config = config::Config::load();

    iced::application("Skycast", App::update, App::view)
        .theme(App::theme)
        .subscription(App::subscription)
        .window(window::Settings {
            size: iced::Size::new(config.window.width as f32, config.window.height as f32),
            position: window::Position::Centered,
            ..Default::default()
        })
        .default_font(Font::MONOSPACE)
        .run_with(App::new)
}

#[derive(Debug, Clone)]
enum Message {
    LocationChanged(String),
    SuggestTimerFired(u64),
    SuggestionsLoaded(u64, Result<Vec<Suggestion>, ApiError>),
    SearchSubmitted,
    SuggestionPicked(Suggestion),
    WeatherLoaded(u64, Result<WeatherRecord, ApiError>),
    ChatDraftChanged(String),
    ChatSubmitted,
    ChatReplyReceived(u64, Result<String, ApiError>),
    ChatToggled,
    ChatCleared,
    CopySummary,
    EscapePressed,
    Tick,
}

/// The one render-facing state record. Controllers own their slices; the view
/// and subscription only read. `loading` always means the weather search;
/// chat busyness is the separate `is_typing` flag on the chat controller.
struct App {
    search: SearchController,
    chat: ChatController,
    chat_open: bool,
    loading_frame: usize,
    debounce: Duration,
    api: Arc<ApiClient>,
    search_input_id: Id,
    chat_input_id: Id,
}

impl App {
    fn new() -> (Self, Task<Message>) {
        Self::from_config(config::Config::load())
    }

    fn from_config(config: config::Config) -> (Self, Task<Message>) {
        let search_input_id = Id::unique();

        let app = App {
            search: SearchController::new(),
            chat: ChatController::new(),
            chat_open: false,
            loading_frame: 0,
            debounce: Duration::from_millis(config.server.debounce_ms),
            api: Arc::new(ApiClient::new(config.server.base_url)),
            search_input_id: search_input_id.clone(),
            chat_input_id: Id::unique(),
        };

        (app, text_input::focus(search_input_id))
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::LocationChanged(value) => match self.search.input_changed(value) {
                Some(probe) => {
                    let delay = self.debounce;
                    Task::future(async move {
                        tokio::time::sleep(delay).await;
                        Message::SuggestTimerFired(probe.token)
                    })
                }
                None => Task::none(),
            },
            Message::SuggestTimerFired(token) => match self.search.due_probe(token) {
                Some(query) => {
                    let api = self.api.clone();
                    Task::future(async move {
                        let result = api.suggestions(&query).await;
                        Message::SuggestionsLoaded(token, result)
                    })
                }
                None => Task::none(),
            },
            Message::SuggestionsLoaded(token, result) => {
                self.search.apply_suggestions(token, result);
                Task::none()
            }
            Message::SearchSubmitted => match self.search.submit() {
                Some(request) => self.fetch_weather(request),
                None => Task::none(),
            },
            Message::SuggestionPicked(suggestion) => {
                let request = self.search.pick_suggestion(&suggestion);
                self.fetch_weather(request)
            }
            Message::WeatherLoaded(token, result) => {
                self.search.apply_weather(token, result);
                Task::none()
            }
            Message::ChatDraftChanged(value) => {
                self.chat.set_draft(value);
                Task::none()
            }
            Message::ChatSubmitted => match self.chat.submit() {
                Some(send) => {
                    let api = self.api.clone();
                    Task::future(async move {
                        let result = api.chat(&send.message).await;
                        Message::ChatReplyReceived(send.generation, result)
                    })
                }
                None => Task::none(),
            },
            Message::ChatReplyReceived(generation, result) => {
                self.chat.apply_reply(generation, result);
                Task::none()
            }
            Message::ChatToggled => {
                // Visibility only. The transcript is untouched either way.
                self.chat_open = !self.chat_open;
                if self.chat_open {
                    text_input::focus(self.chat_input_id.clone())
                } else {
                    Task::none()
                }
            }
            Message::ChatCleared => {
                self.chat.clear();
                Task::none()
            }
            Message::CopySummary => match &self.search.weather {
                Some(record) => clipboard::write(record.summary()),
                None => Task::none(),
            },
            Message::EscapePressed => {
                if self.chat_open {
                    self.chat_open = false;
                    Task::none()
                } else {
                    iced::exit()
                }
            }
            Message::Tick => {
                if self.search.loading || self.chat.is_typing {
                    self.loading_frame = (self.loading_frame + 1) % SPINNER_FRAMES.len();
                }
                Task::none()
            }
        }
    }

    fn fetch_weather(&self, request: SearchRequest) -> Task<Message> {
        let api = self.api.clone();
        Task::future(async move {
            let result = api.fetch_weather(&request.location).await;
            Message::WeatherLoaded(request.token, result)
        })
    }

    fn subscription(&self) -> Subscription<Message> {
        let timer = if self.search.loading || self.chat.is_typing {
            time::every(Duration::from_millis(80)).map(|_| Message::Tick)
        } else {
            Subscription::none()
        };

        let events = event::listen_with(|event, _status, _id| {
            if let IcedEvent::Keyboard(keyboard::Event::KeyPressed {
                key: Key::Named(keyboard::key::Named::Escape),
                ..
            }) = event
            {
                Some(Message::EscapePressed)
            } else {
                None
            }
        });

        Subscription::batch([timer, events])
    }

    fn view(&self) -> Element<Message> {
        let content = column![
            text("Weather Data").size(22),
            self.search_panel(),
            self.weather_panel(),
            self.chat_panel(),
        ]
        .spacing(12)
        .padding(12);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }

    fn search_panel(&self) -> Element<Message> {
        let input = text_input("Enter city, state, or zip code", &self.search.query)
            .on_input(Message::LocationChanged)
            .on_submit(Message::SearchSubmitted)
            .padding(10)
            .size(16)
            .id(self.search_input_id.clone());

        let label = if self.search.loading { "Loading..." } else { "Search" };
        let mut search_button = button(text(label).size(14)).padding(10);
        if !self.search.loading {
            search_button = search_button.on_press(Message::SearchSubmitted);
        }

        let mut panel = column![row![input, search_button].spacing(10)].spacing(4);

        if !self.search.suggestions.is_empty() {
            let mut list = column![].spacing(2);
            for suggestion in &self.search.suggestions {
                list = list.push(
                    button(text(suggestion.label()).size(14))
                        .on_press(Message::SuggestionPicked(suggestion.clone()))
                        .padding(6)
                        .width(Length::Fill),
                );
            }
            panel = panel.push(list);
        }

        panel.into()
    }

    fn weather_panel(&self) -> Element<Message> {
        let mut panel = column![].spacing(4);

        if let Some(error) = &self.search.error {
            panel = panel.push(text(error.clone()).size(15));
        }

        if self.search.loading {
            let spinner = SPINNER_FRAMES[self.loading_frame % SPINNER_FRAMES.len()];
            panel = panel.push(
                container(
                    column![text(spinner).size(28), text("Fetching data...").size(14)]
                        .spacing(8)
                        .align_x(alignment::Horizontal::Center),
                )
                .width(Length::Fill)
                .align_x(alignment::Horizontal::Center),
            );
        }

        // The old record stays up while a new search is in flight.
        match &self.search.weather {
            Some(record) => {
                panel = panel
                    .push(text(record.location.clone()).size(18))
                    .push(text(format!("Temperature: {}°C", record.temperature)).size(14))
                    .push(text(format!("Humidity: {}%", record.humidity)).size(14))
                    .push(text(format!("Wind: {} mph {}", record.wind_mph, record.wind_dir)).size(14))
                    .push(text(format!("Condition: {}", record.condition.text)).size(14))
                    .push(text(format!("Last Updated: {}", record.last_updated)).size(14))
                    .push(text(format!("Pressure: {} mb", record.pressure_mb)).size(14))
                    .push(text(format!("Feels Like: {}°C", record.feelslike_c)).size(14))
                    .push(text(format!("Dew Point: {}°C", record.dewpoint_c)).size(14))
                    .push(text(format!("Visibility: {} km", record.vis_km)).size(14))
                    .push(
                        container(
                            button(text("[Copy]").size(12))
                                .on_press(Message::CopySummary)
                                .padding(6),
                        )
                        .width(Length::Fill)
                        .align_x(alignment::Horizontal::Right),
                    );
            }
            None if !self.search.loading => {
                panel = panel.push(text("No data available.").size(14));
            }
            None => {}
        }

        panel.into()
    }

    fn chat_panel(&self) -> Element<Message> {
        let toggle_label = if self.chat_open { "Chat [-]" } else { "Chat [+]" };
        let toggle = button(text(toggle_label).size(14))
            .on_press(Message::ChatToggled)
            .padding(6);

        if !self.chat_open {
            return row![toggle].into();
        }

        let mut transcript = column![].spacing(4);
        for message in &self.chat.history {
            let speaker = match message.role {
                Role::User => "You",
                Role::Assistant => "Assistant",
            };
            transcript = transcript.push(text(format!("{}: {}", speaker, message.content)).size(14));
        }
        if self.chat.is_typing {
            let spinner = SPINNER_FRAMES[self.loading_frame % SPINNER_FRAMES.len()];
            transcript = transcript.push(text(format!("Assistant is typing {}", spinner)).size(14));
        }

        let draft = text_input("Ask about the weather...", &self.chat.draft)
            .on_input(Message::ChatDraftChanged)
            .on_submit(Message::ChatSubmitted)
            .padding(8)
            .size(14)
            .id(self.chat_input_id.clone());

        let mut send = button(text("Send").size(14)).padding(8);
        if !self.chat.is_typing {
            send = send.on_press(Message::ChatSubmitted);
        }
        let clear = button(text("Clear").size(14))
            .on_press(Message::ChatCleared)
            .padding(8);

        column![
            row![toggle].spacing(8),
            scrollable(container(transcript).padding(8).width(Length::Fill))
                .height(Length::Fixed(220.0)),
            row![draft, send, clear].spacing(8),
        ]
        .spacing(8)
        .into()
    }

    fn theme(&self) -> Theme {
        Theme::TokyoNight
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app() -> App {
        App::from_config(config::Config::default()).0
    }

    #[test]
    fn toggling_the_panel_never_touches_history() {
        let mut app = app();
        app.chat.set_draft("hello".to_string());
        let send = app.chat.submit().unwrap();
        app.chat.apply_reply(send.generation, Ok("Hi!".to_string()));

        let _ = app.update(Message::ChatToggled);
        let _ = app.update(Message::ChatToggled);

        assert_eq!(app.chat.history.len(), 2);
        assert!(!app.chat_open);
    }

    #[test]
    fn loading_reflects_the_weather_search_only() {
        let mut app = app();
        app.chat.set_draft("hello".to_string());
        let _ = app.update(Message::ChatSubmitted);

        assert!(app.chat.is_typing);
        assert!(!app.search.loading);
    }

    #[test]
    fn chat_typing_is_independent_of_search_errors() {
        let mut app = app();
        let _ = app.update(Message::LocationChanged("zzz".to_string()));
        let _ = app.update(Message::SearchSubmitted);
        let _ = app.update(Message::WeatherLoaded(
            1,
            Err(ApiError::Service("City not found".to_string())),
        ));

        assert_eq!(app.search.error.as_deref(), Some("City not found"));
        assert!(!app.chat.is_typing);
    }

    #[test]
    fn empty_search_submits_nothing() {
        let mut app = app();
        let _ = app.update(Message::SearchSubmitted);
        assert!(!app.search.loading);
    }

    #[test]
    fn escape_closes_the_chat_panel_first() {
        let mut app = app();
        let _ = app.update(Message::ChatToggled);
        assert!(app.chat_open);
        let _ = app.update(Message::EscapePressed);
        assert!(!app.chat_open);
    }
}
