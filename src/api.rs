use reqwest;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors coming back from the backend service.
///
/// `Service` carries the message the server attached to a non-success status;
/// `Transport` covers connection, timeout, and body decode failures. Both hold
/// plain strings so values stay `Clone` and can ride inside UI messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    #[error("{0}")]
    Service(String),
    #[error("{0}")]
    Transport(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Transport(err.to_string())
    }
}

impl ApiError {
    /// Text shown in the weather error banner: the server's own message when
    /// there is one, a generic fallback when the request never made it.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Service(message) => message.clone(),
            ApiError::Transport(_) => "Failed to fetch weather data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    City,
    Zip,
    #[serde(other)]
    Other,
}

/// A candidate location returned while the user is still typing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Suggestion {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    #[serde(default)]
    pub state: Option<String>,
}

impl Suggestion {
    /// The query string a picked suggestion searches for. Cities qualify with
    /// their state; everything else searches the bare name.
    pub fn canonical_query(&self) -> String {
        match (self.kind, self.state.as_deref()) {
            (SuggestionKind::City, Some(state)) => format!("{}, {}", self.name, state),
            _ => self.name.clone(),
        }
    }

    /// Label shown in the dropdown.
    pub fn label(&self) -> String {
        match (self.kind, self.state.as_deref()) {
            (SuggestionKind::City, Some(state)) => format!("{} ({})", self.name, state),
            _ => self.name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Condition {
    pub text: String,
    pub icon: String,
}

/// A single point-in-time weather snapshot for one location. Replaced
/// wholesale by the next successful fetch, never mutated in place.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeatherRecord {
    pub location: String,
    pub timestamp: i64,
    pub temperature: f64,
    pub humidity: f64,
    pub wind_mph: f64,
    pub wind_dir: String,
    pub condition: Condition,
    pub last_updated: String,
    pub pressure_mb: f64,
    pub feelslike_c: f64,
    pub dewpoint_c: f64,
    pub vis_km: f64,
}

impl WeatherRecord {
    /// One-line summary used by the clipboard action.
    pub fn summary(&self) -> String {
        format!(
            "{}: {}°C, {}",
            self.location, self.temperature, self.condition.text
        )
    }
}

#[derive(Debug, Serialize)]
struct WeatherQuery<'a> {
    location: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatOutbound<'a> {
    message: &'a str,
}

#[derive(Debug, Deserialize)]
struct WeatherEnvelope {
    data: WeatherRecord,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: String,
}

#[derive(Debug, Deserialize)]
struct ChatEnvelope {
    reply: String,
}

pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: String) -> Self {
        ApiClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// POST /fetch-weather. Resolves to the current snapshot for `location`,
    /// or the server's error message on a non-success status.
    pub async fn fetch_weather(&self, location: &str) -> Result<WeatherRecord, ApiError> {
        let response = self
            .client
            .post(format!("{}/fetch-weather", self.base_url))
            .json(&WeatherQuery { location })
            .send()
            .await?;

        if response.status().is_success() {
            let envelope: WeatherEnvelope = response.json().await?;
            Ok(envelope.data)
        } else {
            let status = response.status();
            let message = match response.json::<ErrorEnvelope>().await {
                Ok(body) => body.error,
                Err(_) => format!("Weather service returned {}", status),
            };
            Err(ApiError::Service(message))
        }
    }

    /// GET /suggestions?query=. Empty vec on no match.
    pub async fn suggestions(&self, query: &str) -> Result<Vec<Suggestion>, ApiError> {
        let response = self
            .client
            .get(format!("{}/suggestions", self.base_url))
            .query(&[("query", query)])
            .send()
            .await?;

        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(ApiError::Service(format!(
                "Suggestion service returned {}",
                response.status()
            )))
        }
    }

    /// POST /chatbot. Resolves to the assistant's reply text.
    pub async fn chat(&self, message: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .post(format!("{}/chatbot", self.base_url))
            .json(&ChatOutbound { message })
            .send()
            .await?;

        if response.status().is_success() {
            let envelope: ChatEnvelope = response.json().await?;
            Ok(envelope.reply)
        } else {
            let status = response.status();
            let message = match response.json::<ErrorEnvelope>().await {
                Ok(body) => body.error,
                Err(_) => format!("Chat service returned {}", status),
            };
            Err(ApiError::Service(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_suggestion_parses_with_state() {
        let suggestion: Suggestion =
            serde_json::from_str(r#"{"type": "city", "name": "Austin", "state": "Texas"}"#)
                .unwrap();
        assert_eq!(suggestion.kind, SuggestionKind::City);
        assert_eq!(suggestion.canonical_query(), "Austin, Texas");
        assert_eq!(suggestion.label(), "Austin (Texas)");
    }

    #[test]
    fn zip_suggestion_omits_state() {
        let suggestion: Suggestion =
            serde_json::from_str(r#"{"type": "zip", "name": "60601"}"#).unwrap();
        assert_eq!(suggestion.kind, SuggestionKind::Zip);
        assert_eq!(suggestion.canonical_query(), "60601");
        assert_eq!(suggestion.label(), "60601");
    }

    #[test]
    fn unknown_suggestion_kind_falls_back_to_other() {
        let suggestion: Suggestion =
            serde_json::from_str(r#"{"type": "state", "name": "Texas"}"#).unwrap();
        assert_eq!(suggestion.kind, SuggestionKind::Other);
        assert_eq!(suggestion.canonical_query(), "Texas");
    }

    #[test]
    fn weather_envelope_parses_backend_shape() {
        let body = r#"{
            "data": {
                "timestamp": 1700000000,
                "temperature": 22.5,
                "humidity": 45,
                "location": "Austin, Texas, United States of America",
                "wind_mph": 8.1,
                "wind_dir": "SSW",
                "condition": {"text": "Partly cloudy", "icon": "//cdn.example/icon.png"},
                "last_updated": "2023-11-14 15:30",
                "pressure_mb": 1015.0,
                "feelslike_c": 23.1,
                "dewpoint_c": 9.8,
                "vis_km": 16.0
            }
        }"#;
        let envelope: WeatherEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.data.timestamp, 1700000000);
        assert_eq!(envelope.data.condition.text, "Partly cloudy");
        assert_eq!(
            envelope.data.summary(),
            "Austin, Texas, United States of America: 22.5°C, Partly cloudy"
        );
    }

    #[test]
    fn service_error_surfaces_server_message() {
        let err = ApiError::Service("City not found".to_string());
        assert_eq!(err.user_message(), "City not found");
    }

    #[test]
    fn transport_error_surfaces_generic_message() {
        let err = ApiError::Transport("connection refused".to_string());
        assert_eq!(err.user_message(), "Failed to fetch weather data");
    }
}
