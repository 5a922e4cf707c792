use log::debug;

use crate::api::{ApiError, Suggestion, WeatherRecord};

/// Queries at or below this length clear the dropdown instead of fetching.
const MIN_SUGGEST_CHARS: usize = 2;

/// A suggestion lookup scheduled for `query`, valid while `token` is the
/// newest one minted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestProbe {
    pub token: u64,
    pub query: String,
}

/// A weather fetch issued for `location`, valid while `token` is the newest
/// one minted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub token: u64,
    pub location: String,
}

/// Owns the location-search side of the UI: the query text, the suggestion
/// dropdown, and the weather fetch lifecycle (idle -> loading ->
/// success/failure).
///
/// Both request classes carry a monotonic token. A resolution is applied only
/// if its token still equals the newest issued one, so responses arriving out
/// of order during fast typing can never overwrite fresher state. Superseded
/// requests are not aborted, just dropped on arrival.
#[derive(Debug, Default)]
pub struct SearchController {
    pub query: String,
    pub suggestions: Vec<Suggestion>,
    pub weather: Option<WeatherRecord>,
    pub loading: bool,
    pub error: Option<String>,
    suggest_token: u64,
    search_token: u64,
}

impl SearchController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a keystroke. Long enough queries mint a probe to schedule;
    /// shorter ones clear the dropdown immediately. The token advances either
    /// way, so a lookup still in flight for the old text is invalidated.
    pub fn input_changed(&mut self, text: String) -> Option<SuggestProbe> {
        self.query = text;
        self.suggest_token += 1;
        if self.query.chars().count() >= MIN_SUGGEST_CHARS {
            Some(SuggestProbe {
                token: self.suggest_token,
                query: self.query.clone(),
            })
        } else {
            self.suggestions.clear();
            None
        }
    }

    /// Called when the debounce timer for `token` fires. Yields the query to
    /// fetch unless a newer keystroke superseded the probe in the meantime.
    pub fn due_probe(&self, token: u64) -> Option<String> {
        if token == self.suggest_token {
            Some(self.query.clone())
        } else {
            debug!("suggestion probe {token} superseded before fetch");
            None
        }
    }

    /// Applies a resolved suggestion lookup. Late responses are dropped;
    /// failures clear the dropdown rather than leaving stale entries (the
    /// next keystroke re-issues, so there is no retry).
    pub fn apply_suggestions(&mut self, token: u64, result: Result<Vec<Suggestion>, ApiError>) {
        if token != self.suggest_token {
            debug!("dropping stale suggestion response {token}");
            return;
        }
        match result {
            Ok(list) => self.suggestions = list,
            Err(err) => {
                debug!("suggestion lookup failed: {err}");
                self.suggestions.clear();
            }
        }
    }

    /// Starts a weather search for the current query text. Empty queries are
    /// a no-op.
    pub fn submit(&mut self) -> Option<SearchRequest> {
        let location = self.query.trim().to_string();
        if location.is_empty() {
            return None;
        }
        Some(self.begin_search(location))
    }

    /// Picks a suggestion: composes the canonical location, clears the
    /// dropdown synchronously, and starts the search for it.
    pub fn pick_suggestion(&mut self, suggestion: &Suggestion) -> SearchRequest {
        let location = suggestion.canonical_query();
        self.query = location.clone();
        self.suggestions.clear();
        self.suggest_token += 1;
        self.begin_search(location)
    }

    /// Applies a resolved weather fetch. A failure keeps the previously
    /// displayed record untouched and surfaces the error text instead.
    pub fn apply_weather(&mut self, token: u64, result: Result<WeatherRecord, ApiError>) {
        if token != self.search_token {
            debug!("dropping superseded weather response {token}");
            return;
        }
        self.loading = false;
        match result {
            Ok(record) => {
                self.weather = Some(record);
                self.error = None;
            }
            Err(err) => self.error = Some(err.user_message()),
        }
    }

    // Entering loading clears the error but keeps the old record visible
    // until the new result lands.
    fn begin_search(&mut self, location: String) -> SearchRequest {
        self.search_token += 1;
        self.loading = true;
        self.error = None;
        SearchRequest {
            token: self.search_token,
            location,
        }
    }
}
