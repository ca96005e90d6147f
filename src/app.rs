//! Application state management for Skycast
//!
//! All interactive state lives in [`App`] and changes only through
//! [`App::dispatch`]. Dispatching an [`Action`] returns the [`Effect`]s that
//! need to run (network requests, debounce timers, location lookups); the
//! runtime executes them and feeds their results back as new actions.
//!
//! Every network request carries a sequence number. A response whose number is
//! not the latest one issued for its kind is stale and is dropped without
//! touching state.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::{debug, info, warn};

use crate::cache::WeatherCache;
use crate::data::{ApiError, CitySuggestion, Coordinates, GeoError, WeatherSnapshot};

/// Shown when current conditions cannot be fetched
pub const WEATHER_ERROR: &str = "Unable to fetch weather information.";
/// Shown when the forecast cannot be fetched
pub const FORECAST_ERROR: &str = "Unable to fetch forecast data.";
/// Shown when no location provider is configured
pub const GEO_UNSUPPORTED_ERROR: &str = "Geolocation is not supported on this system.";
/// Shown when the location provider fails
pub const GEO_FAILED_ERROR: &str = "Unable to fetch location. Please check location permissions.";

/// Default number of forecast days requested
pub const DEFAULT_FORECAST_DAYS: u8 = 7;

/// Inputs to the state machine: user intents and completed effects
#[derive(Debug)]
pub enum Action {
    /// The query text was edited
    QueryChanged(String),
    /// The query has been stable for the debounce delay
    QuerySettled(String),
    /// A suggestion was picked by index
    SelectSuggestion(usize),
    /// Fetch weather and forecast for the query text
    Search,
    /// Look up the current position and fetch its weather
    LocateMe,
    LocationResolved(Result<Coordinates, GeoError>),
    SuggestionsLoaded {
        seq: u64,
        result: Result<Vec<CitySuggestion>, ApiError>,
    },
    WeatherLoaded {
        seq: u64,
        location: String,
        result: Result<WeatherSnapshot, ApiError>,
    },
    ForecastLoaded {
        seq: u64,
        result: Result<Vec<WeatherSnapshot>, ApiError>,
    },
}

/// Side effects requested by the state machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// (Re)start the debounce timer for the query
    ScheduleSettle(String),
    FetchSuggestions { seq: u64, query: String },
    FetchWeather { seq: u64, location: String },
    FetchForecast { seq: u64, location: String, days: u8 },
    LocateUser,
}

/// Main application struct managing state
pub struct App {
    /// Text in the search box
    pub query: String,
    /// Last query that survived the debounce delay
    pub settled_query: String,
    /// Autocomplete matches for the settled query
    pub suggestions: Vec<CitySuggestion>,
    /// Index of the highlighted suggestion, if any
    pub highlighted: Option<usize>,
    /// Current conditions for the last looked-up location
    pub weather: Option<WeatherSnapshot>,
    /// Daily forecast for the last searched location
    pub forecast: Vec<WeatherSnapshot>,
    /// The single user-visible error slot
    pub error: Option<String>,
    /// Flag indicating the application should quit
    pub should_quit: bool,
    /// Flag to show help overlay
    pub show_help: bool,
    forecast_days: u8,
    geolocation_supported: bool,
    cache: WeatherCache,
    last_seq: u64,
    latest_suggestions: Option<u64>,
    pending_weather: Option<u64>,
    pending_forecast: Option<u64>,
    locating: bool,
}

impl App {
    /// Creates a new App with empty state
    pub fn new(cache: WeatherCache, forecast_days: u8, geolocation_supported: bool) -> Self {
        Self {
            query: String::new(),
            settled_query: String::new(),
            suggestions: Vec::new(),
            highlighted: None,
            weather: None,
            forecast: Vec::new(),
            error: None,
            should_quit: false,
            show_help: false,
            forecast_days,
            geolocation_supported,
            cache,
            last_seq: 0,
            latest_suggestions: None,
            pending_weather: None,
            pending_forecast: None,
            locating: false,
        }
    }

    /// Whether any weather, forecast or location request is outstanding
    pub fn is_loading(&self) -> bool {
        self.pending_weather.is_some() || self.pending_forecast.is_some() || self.locating
    }

    /// Search is disabled while the query is blank or a request is running
    pub fn can_search(&self) -> bool {
        !self.query.trim().is_empty() && !self.is_loading()
    }

    pub fn geolocation_supported(&self) -> bool {
        self.geolocation_supported
    }

    /// Applies an action and returns the effects it requires
    pub fn dispatch(&mut self, action: Action) -> Vec<Effect> {
        match action {
            Action::QueryChanged(text) => {
                self.query = text.clone();
                vec![Effect::ScheduleSettle(text)]
            }
            Action::QuerySettled(text) => self.settle_query(text),
            Action::SelectSuggestion(index) => self.select_suggestion(index),
            Action::Search => {
                if !self.can_search() {
                    return Vec::new();
                }
                let location = self.query.trim().to_string();
                info!(%location, "search");
                let mut effects = self.fetch_weather(&location);
                effects.extend(self.fetch_forecast(&location));
                effects
            }
            Action::LocateMe => self.locate(),
            Action::LocationResolved(result) => self.on_location(result),
            Action::SuggestionsLoaded { seq, result } => {
                self.on_suggestions(seq, result);
                Vec::new()
            }
            Action::WeatherLoaded {
                seq,
                location,
                result,
            } => {
                self.on_weather(seq, &location, result);
                Vec::new()
            }
            Action::ForecastLoaded { seq, result } => {
                self.on_forecast(seq, result);
                Vec::new()
            }
        }
    }

    /// Starts a weather lookup, answering from the cache when it is fresh
    pub fn fetch_weather(&mut self, location: &str) -> Vec<Effect> {
        if location.is_empty() {
            return Vec::new();
        }
        self.error = None;

        if let Some(cached) = self.cache.get(location) {
            debug!(%location, "weather cache hit");
            self.weather = Some(cached);
            // Supersedes any lookup still in flight
            self.pending_weather = None;
            return Vec::new();
        }

        let seq = self.next_seq();
        self.pending_weather = Some(seq);
        vec![Effect::FetchWeather {
            seq,
            location: location.to_string(),
        }]
    }

    /// Starts a forecast lookup
    pub fn fetch_forecast(&mut self, location: &str) -> Vec<Effect> {
        if location.is_empty() {
            return Vec::new();
        }
        self.error = None;

        let seq = self.next_seq();
        self.pending_forecast = Some(seq);
        vec![Effect::FetchForecast {
            seq,
            location: location.to_string(),
            days: self.forecast_days,
        }]
    }

    fn next_seq(&mut self) -> u64 {
        self.last_seq += 1;
        self.last_seq
    }

    fn settle_query(&mut self, text: String) -> Vec<Effect> {
        if text == self.settled_query {
            return Vec::new();
        }
        self.settled_query = text.clone();

        if text.is_empty() {
            self.clear_suggestions();
            return Vec::new();
        }

        let seq = self.next_seq();
        self.latest_suggestions = Some(seq);
        vec![Effect::FetchSuggestions { seq, query: text }]
    }

    fn select_suggestion(&mut self, index: usize) -> Vec<Effect> {
        let Some(suggestion) = self.suggestions.get(index).cloned() else {
            return Vec::new();
        };
        info!(city = %suggestion.name, "suggestion selected");

        self.clear_suggestions();
        let mut effects = self.fetch_weather(&suggestion.name);
        effects.extend(self.fetch_forecast(&suggestion.name));
        effects
    }

    fn locate(&mut self) -> Vec<Effect> {
        if !self.geolocation_supported {
            self.error = Some(GEO_UNSUPPORTED_ERROR.to_string());
            return Vec::new();
        }
        if self.locating {
            return Vec::new();
        }
        self.locating = true;
        self.error = None;
        vec![Effect::LocateUser]
    }

    fn on_location(&mut self, result: Result<Coordinates, GeoError>) -> Vec<Effect> {
        if !self.locating {
            return Vec::new();
        }
        self.locating = false;

        match result {
            // Only current conditions; the forecast is left as it was
            Ok(coords) => {
                let location = coords.to_location();
                info!(%location, "located");
                self.fetch_weather(&location)
            }
            Err(e) => {
                warn!(error = %e, "location lookup failed");
                self.error = Some(GEO_FAILED_ERROR.to_string());
                Vec::new()
            }
        }
    }

    fn on_suggestions(&mut self, seq: u64, result: Result<Vec<CitySuggestion>, ApiError>) {
        if self.latest_suggestions != Some(seq) {
            debug!(seq, "dropping stale suggestions");
            return;
        }

        match result {
            Ok(list) => {
                self.suggestions = list;
                self.highlighted = None;
            }
            Err(e) => {
                warn!(query = %self.settled_query, error = %e, "unable to fetch suggestions");
                self.suggestions.clear();
                self.highlighted = None;
            }
        }
    }

    fn on_weather(&mut self, seq: u64, location: &str, result: Result<WeatherSnapshot, ApiError>) {
        if self.pending_weather != Some(seq) {
            debug!(seq, %location, "dropping stale weather");
            return;
        }
        self.pending_weather = None;

        match result {
            Ok(snapshot) => {
                if let Err(e) = self.cache.put(location, &snapshot) {
                    warn!(%location, error = %e, "failed to cache weather");
                }
                self.weather = Some(snapshot);
                self.clear_suggestions();
            }
            Err(e) => {
                warn!(%location, error = %e, "weather request failed");
                self.error = Some(WEATHER_ERROR.to_string());
                self.weather = None;
            }
        }
    }

    fn on_forecast(&mut self, seq: u64, result: Result<Vec<WeatherSnapshot>, ApiError>) {
        if self.pending_forecast != Some(seq) {
            debug!(seq, "dropping stale forecast");
            return;
        }
        self.pending_forecast = None;

        match result {
            Ok(days) => self.forecast = days,
            Err(e) => {
                warn!(error = %e, "forecast request failed");
                self.error = Some(FORECAST_ERROR.to_string());
                self.forecast.clear();
            }
        }
    }

    /// Hides the suggestion list and ignores any suggestions still in flight
    fn clear_suggestions(&mut self) {
        self.suggestions.clear();
        self.highlighted = None;
        self.latest_suggestions = None;
    }

    /// Handles keyboard input and returns the resulting effects
    ///
    /// Keybindings:
    /// - printable keys / `Backspace` / `Ctrl+U`: Edit the query
    /// - `Up`/`Down`: Move through suggestions
    /// - `Enter`: Pick the highlighted suggestion, or search the query
    /// - `Ctrl+L` or `F2`: Use current location
    /// - `F1`: Toggle help
    /// - `Esc`: Close suggestions, or quit when there are none
    /// - `Ctrl+C`: Quit
    pub fn handle_key(&mut self, key_event: KeyEvent) -> Vec<Effect> {
        let ctrl = key_event.modifiers.contains(KeyModifiers::CONTROL);

        if ctrl && key_event.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Vec::new();
        }

        // Help overlay intercepts all keys when shown
        if self.show_help {
            if matches!(key_event.code, KeyCode::Esc | KeyCode::F(1)) {
                self.show_help = false;
            }
            return Vec::new();
        }

        match key_event.code {
            KeyCode::Esc => {
                if self.suggestions.is_empty() {
                    self.should_quit = true;
                } else {
                    self.clear_suggestions();
                }
                Vec::new()
            }
            KeyCode::F(1) => {
                self.show_help = true;
                Vec::new()
            }
            KeyCode::F(2) => self.locate_if_idle(),
            KeyCode::Char('l') if ctrl => self.locate_if_idle(),
            KeyCode::Char('u') if ctrl => self.dispatch(Action::QueryChanged(String::new())),
            KeyCode::Up => {
                self.move_highlight_up();
                Vec::new()
            }
            KeyCode::Down => {
                self.move_highlight_down();
                Vec::new()
            }
            KeyCode::Enter => match self.highlighted {
                Some(index) => self.dispatch(Action::SelectSuggestion(index)),
                None => self.dispatch(Action::Search),
            },
            KeyCode::Backspace => {
                let mut text = self.query.clone();
                if text.pop().is_none() {
                    return Vec::new();
                }
                self.dispatch(Action::QueryChanged(text))
            }
            KeyCode::Char(c) if !ctrl => {
                let mut text = self.query.clone();
                text.push(c);
                self.dispatch(Action::QueryChanged(text))
            }
            _ => Vec::new(),
        }
    }

    /// The location button is disabled while a request is running
    fn locate_if_idle(&mut self) -> Vec<Effect> {
        if self.is_loading() {
            return Vec::new();
        }
        self.dispatch(Action::LocateMe)
    }

    /// Moves the highlight up, wrapping to the bottom if at top
    fn move_highlight_up(&mut self) {
        let count = self.suggestions.len();
        if count == 0 {
            return;
        }
        self.highlighted = Some(match self.highlighted {
            None | Some(0) => count - 1,
            Some(i) => i - 1,
        });
    }

    /// Moves the highlight down, wrapping to the top if at bottom
    fn move_highlight_down(&mut self) {
        let count = self.suggestions.len();
        if count == 0 {
            return;
        }
        self.highlighted = Some(match self.highlighted {
            None => 0,
            Some(i) => (i + 1) % count,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{now_ms, KeyValueStore, MemoryStore, DEFAULT_CACHE_TTL};
    use reqwest::StatusCode;

    fn key_event(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn ctrl(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }

    fn test_app() -> App {
        test_app_with_store(MemoryStore::new())
    }

    fn test_app_with_store(store: MemoryStore) -> App {
        let cache = WeatherCache::new(Box::new(store), DEFAULT_CACHE_TTL);
        App::new(cache, DEFAULT_FORECAST_DAYS, true)
    }

    fn snapshot(city: &str) -> WeatherSnapshot {
        WeatherSnapshot {
            city: city.to_string(),
            country: "GB".to_string(),
            temperature: 14.0,
            description: "Overcast".to_string(),
            humidity: 81.0,
            wind_speed: 5.5,
            date: "2024-03-01".to_string(),
        }
    }

    fn suggestion(name: &str, country: &str) -> CitySuggestion {
        CitySuggestion {
            name: name.to_string(),
            country: country.to_string(),
        }
    }

    fn server_error() -> ApiError {
        ApiError::Status(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Settles `query` and answers the suggestions request with `list`
    fn with_suggestions(app: &mut App, query: &str, list: Vec<CitySuggestion>) {
        let effects = app.dispatch(Action::QuerySettled(query.to_string()));
        let Some(Effect::FetchSuggestions { seq, .. }) = effects.first().cloned() else {
            panic!("expected a suggestions request, got {:?}", effects);
        };
        app.dispatch(Action::SuggestionsLoaded {
            seq,
            result: Ok(list),
        });
    }

    fn weather_seq(effects: &[Effect]) -> u64 {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::FetchWeather { seq, .. } => Some(*seq),
                _ => None,
            })
            .expect("weather request")
    }

    fn forecast_seq(effects: &[Effect]) -> u64 {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::FetchForecast { seq, .. } => Some(*seq),
                _ => None,
            })
            .expect("forecast request")
    }

    // ========================================================================
    // Initial state
    // ========================================================================

    #[test]
    fn test_initial_state_is_empty() {
        let app = test_app();
        assert!(app.query.is_empty());
        assert!(app.suggestions.is_empty());
        assert!(app.weather.is_none());
        assert!(app.forecast.is_empty());
        assert!(app.error.is_none());
        assert!(!app.is_loading());
        assert!(!app.can_search());
    }

    // ========================================================================
    // Query and suggestions
    // ========================================================================

    #[test]
    fn test_query_change_schedules_settle() {
        let mut app = test_app();
        let effects = app.dispatch(Action::QueryChanged("Par".to_string()));

        assert_eq!(app.query, "Par");
        assert_eq!(effects, vec![Effect::ScheduleSettle("Par".to_string())]);
        // Nothing is requested until the query settles
        assert!(app.settled_query.is_empty());
    }

    #[test]
    fn test_settled_query_requests_suggestions() {
        let mut app = test_app();
        let effects = app.dispatch(Action::QuerySettled("Paris".to_string()));

        assert_eq!(effects.len(), 1);
        assert!(matches!(
            &effects[0],
            Effect::FetchSuggestions { query, .. } if query == "Paris"
        ));
    }

    #[test]
    fn test_unchanged_settled_query_is_noop() {
        let mut app = test_app();
        app.dispatch(Action::QuerySettled("Paris".to_string()));

        let effects = app.dispatch(Action::QuerySettled("Paris".to_string()));
        assert!(effects.is_empty());
    }

    #[test]
    fn test_empty_settled_query_clears_without_request() {
        let mut app = test_app();
        with_suggestions(&mut app, "Lon", vec![suggestion("London", "GB")]);
        assert_eq!(app.suggestions.len(), 1);

        let effects = app.dispatch(Action::QuerySettled(String::new()));

        assert!(effects.is_empty());
        assert!(app.suggestions.is_empty());
    }

    #[test]
    fn test_suggestions_replace_previous_list() {
        let mut app = test_app();
        with_suggestions(&mut app, "Lon", vec![suggestion("London", "GB")]);
        with_suggestions(
            &mut app,
            "Lond",
            vec![suggestion("Londonderry", "GB"), suggestion("London", "CA")],
        );

        assert_eq!(app.suggestions.len(), 2);
        assert_eq!(app.suggestions[0].name, "Londonderry");
    }

    #[test]
    fn test_stale_suggestions_are_dropped() {
        let mut app = test_app();
        let first = app.dispatch(Action::QuerySettled("Par".to_string()));
        let second = app.dispatch(Action::QuerySettled("Paris".to_string()));

        let Effect::FetchSuggestions { seq: old_seq, .. } = first[0].clone() else {
            panic!("expected suggestions request");
        };
        let Effect::FetchSuggestions { seq: new_seq, .. } = second[0].clone() else {
            panic!("expected suggestions request");
        };

        app.dispatch(Action::SuggestionsLoaded {
            seq: new_seq,
            result: Ok(vec![suggestion("Paris", "FR")]),
        });
        // The older request resolves last and must not overwrite
        app.dispatch(Action::SuggestionsLoaded {
            seq: old_seq,
            result: Ok(vec![suggestion("Parma", "IT"), suggestion("Parla", "ES")]),
        });

        assert_eq!(app.suggestions, vec![suggestion("Paris", "FR")]);
    }

    #[test]
    fn test_suggestions_arriving_after_empty_query_are_dropped() {
        let mut app = test_app();
        let effects = app.dispatch(Action::QuerySettled("Ber".to_string()));
        let Effect::FetchSuggestions { seq, .. } = effects[0].clone() else {
            panic!("expected suggestions request");
        };

        app.dispatch(Action::QuerySettled(String::new()));
        app.dispatch(Action::SuggestionsLoaded {
            seq,
            result: Ok(vec![suggestion("Berlin", "DE")]),
        });

        assert!(app.suggestions.is_empty());
    }

    #[test]
    fn test_suggestion_failure_is_not_surfaced() {
        let mut app = test_app();
        with_suggestions(&mut app, "Lon", vec![suggestion("London", "GB")]);

        let effects = app.dispatch(Action::QuerySettled("Lond".to_string()));
        let Effect::FetchSuggestions { seq, .. } = effects[0].clone() else {
            panic!("expected suggestions request");
        };
        app.dispatch(Action::SuggestionsLoaded {
            seq,
            result: Err(server_error()),
        });

        assert!(app.error.is_none());
        assert!(app.suggestions.is_empty());
    }

    // ========================================================================
    // Suggestion selection
    // ========================================================================

    #[test]
    fn test_select_suggestion_fetches_weather_and_forecast() {
        let mut app = test_app();
        with_suggestions(&mut app, "Lon", vec![suggestion("London", "GB")]);

        let effects = app.dispatch(Action::SelectSuggestion(0));

        // Cleared before either request resolves
        assert!(app.suggestions.is_empty());
        assert_eq!(effects.len(), 2);
        assert!(matches!(
            &effects[0],
            Effect::FetchWeather { location, .. } if location == "London"
        ));
        assert!(matches!(
            &effects[1],
            Effect::FetchForecast { location, days: 7, .. } if location == "London"
        ));
        assert!(app.is_loading());
    }

    #[test]
    fn test_select_out_of_range_is_noop() {
        let mut app = test_app();
        with_suggestions(&mut app, "Lon", vec![suggestion("London", "GB")]);

        assert!(app.dispatch(Action::SelectSuggestion(5)).is_empty());
        assert_eq!(app.suggestions.len(), 1);
    }

    #[test]
    fn test_suggestions_in_flight_during_selection_are_dropped() {
        let mut app = test_app();
        with_suggestions(&mut app, "Lon", vec![suggestion("London", "GB")]);
        let pending = app.dispatch(Action::QuerySettled("Lond".to_string()));
        let Effect::FetchSuggestions { seq, .. } = pending[0].clone() else {
            panic!("expected suggestions request");
        };

        app.dispatch(Action::SelectSuggestion(0));
        app.dispatch(Action::SuggestionsLoaded {
            seq,
            result: Ok(vec![suggestion("Londonderry", "GB")]),
        });

        assert!(app.suggestions.is_empty());
    }

    // ========================================================================
    // Weather fetch
    // ========================================================================

    #[test]
    fn test_fetch_weather_empty_location_is_noop() {
        let mut app = test_app();
        app.error = Some("previous".to_string());

        assert!(app.fetch_weather("").is_empty());
        assert!(!app.is_loading());
        assert_eq!(app.error.as_deref(), Some("previous"));
    }

    #[test]
    fn test_fetch_weather_sets_loading_and_clears_error() {
        let mut app = test_app();
        app.error = Some(WEATHER_ERROR.to_string());

        let effects = app.fetch_weather("Paris");

        assert_eq!(effects.len(), 1);
        assert!(app.is_loading());
        assert!(app.error.is_none());
    }

    #[test]
    fn test_fresh_cache_entry_skips_network() {
        let mut store = MemoryStore::new();
        let cached = snapshot("Paris");
        let entry = serde_json::json!({ "data": cached, "timestamp": now_ms() });
        store.set("weather_Paris", &entry.to_string()).unwrap();
        let mut app = test_app_with_store(store);

        let effects = app.fetch_weather("Paris");

        assert!(effects.is_empty(), "no network call on a fresh entry");
        assert_eq!(app.weather, Some(cached));
        assert!(!app.is_loading());
    }

    #[test]
    fn test_expired_cache_entry_triggers_network() {
        let mut store = MemoryStore::new();
        let eleven_minutes_ago = now_ms() - 11 * 60 * 1000;
        let entry = serde_json::json!({ "data": snapshot("Paris"), "timestamp": eleven_minutes_ago });
        store.set("weather_Paris", &entry.to_string()).unwrap();
        let mut app = test_app_with_store(store);

        let effects = app.fetch_weather("Paris");

        assert!(matches!(
            &effects[..],
            [Effect::FetchWeather { location, .. }] if location == "Paris"
        ));
        assert!(app.weather.is_none());
    }

    #[test]
    fn test_weather_success_updates_state_and_cache() {
        let mut app = test_app();
        with_suggestions(&mut app, "Par", vec![suggestion("Paris", "FR")]);
        let effects = app.fetch_weather("Paris");
        let seq = weather_seq(&effects);

        app.dispatch(Action::WeatherLoaded {
            seq,
            location: "Paris".to_string(),
            result: Ok(snapshot("Paris")),
        });

        assert_eq!(app.weather, Some(snapshot("Paris")));
        assert!(app.suggestions.is_empty());
        assert!(!app.is_loading());

        // Second lookup is served from the cache
        assert!(app.fetch_weather("Paris").is_empty());
    }

    #[test]
    fn test_weather_failure_sets_error_and_clears_weather() {
        let mut app = test_app();
        app.weather = Some(snapshot("Oslo"));
        let seq = weather_seq(&app.fetch_weather("Atlantis"));

        app.dispatch(Action::WeatherLoaded {
            seq,
            location: "Atlantis".to_string(),
            result: Err(server_error()),
        });

        assert!(app.weather.is_none());
        assert_eq!(app.error.as_deref(), Some(WEATHER_ERROR));
        assert!(!app.is_loading());
    }

    #[test]
    fn test_stale_weather_is_dropped() {
        let mut app = test_app();
        let old_seq = weather_seq(&app.fetch_weather("Paris"));
        let new_seq = weather_seq(&app.fetch_weather("Rome"));

        app.dispatch(Action::WeatherLoaded {
            seq: new_seq,
            location: "Rome".to_string(),
            result: Ok(snapshot("Rome")),
        });
        app.dispatch(Action::WeatherLoaded {
            seq: old_seq,
            location: "Paris".to_string(),
            result: Ok(snapshot("Paris")),
        });

        assert_eq!(app.weather.as_ref().map(|w| w.city.as_str()), Some("Rome"));
    }

    #[test]
    fn test_cache_hit_supersedes_in_flight_request() {
        let mut app = test_app();
        let seq = weather_seq(&app.fetch_weather("Rome"));

        app.cache.put("Paris", &snapshot("Paris")).unwrap();
        assert!(app.fetch_weather("Paris").is_empty());
        assert!(!app.is_loading());

        app.dispatch(Action::WeatherLoaded {
            seq,
            location: "Rome".to_string(),
            result: Ok(snapshot("Rome")),
        });
        assert_eq!(app.weather, Some(snapshot("Paris")));
    }

    // ========================================================================
    // Forecast fetch
    // ========================================================================

    #[test]
    fn test_fetch_forecast_empty_location_is_noop() {
        let mut app = test_app();
        assert!(app.fetch_forecast("").is_empty());
        assert!(!app.is_loading());
    }

    #[test]
    fn test_forecast_success_replaces_list() {
        let mut app = test_app();
        app.forecast = vec![snapshot("Old")];
        let seq = forecast_seq(&app.fetch_forecast("Paris"));

        app.dispatch(Action::ForecastLoaded {
            seq,
            result: Ok(vec![snapshot("Paris"), snapshot("Paris"), snapshot("Paris")]),
        });

        assert_eq!(app.forecast.len(), 3);
        assert!(app.forecast.iter().all(|d| d.city == "Paris"));
    }

    #[test]
    fn test_forecast_failure_sets_error_and_clears_list() {
        let mut app = test_app();
        app.forecast = vec![snapshot("Old")];
        let seq = forecast_seq(&app.fetch_forecast("Paris"));

        app.dispatch(Action::ForecastLoaded {
            seq,
            result: Err(server_error()),
        });

        assert!(app.forecast.is_empty());
        assert_eq!(app.error.as_deref(), Some(FORECAST_ERROR));
    }

    #[test]
    fn test_forecast_is_never_cached() {
        let mut app = test_app();
        let seq = forecast_seq(&app.fetch_forecast("Paris"));
        app.dispatch(Action::ForecastLoaded {
            seq,
            result: Ok(vec![snapshot("Paris")]),
        });

        assert_eq!(app.fetch_forecast("Paris").len(), 1);
    }

    #[test]
    fn test_loading_stays_set_until_both_requests_land() {
        let mut app = test_app();
        app.query = "Paris".to_string();
        let effects = app.dispatch(Action::Search);
        let w = weather_seq(&effects);
        let f = forecast_seq(&effects);

        app.dispatch(Action::WeatherLoaded {
            seq: w,
            location: "Paris".to_string(),
            result: Ok(snapshot("Paris")),
        });
        assert!(app.is_loading());

        app.dispatch(Action::ForecastLoaded {
            seq: f,
            result: Ok(vec![]),
        });
        assert!(!app.is_loading());
    }

    #[test]
    fn test_later_error_overwrites_earlier() {
        let mut app = test_app();
        app.query = "Paris".to_string();
        let effects = app.dispatch(Action::Search);

        app.dispatch(Action::WeatherLoaded {
            seq: weather_seq(&effects),
            location: "Paris".to_string(),
            result: Err(server_error()),
        });
        app.dispatch(Action::ForecastLoaded {
            seq: forecast_seq(&effects),
            result: Err(server_error()),
        });

        assert_eq!(app.error.as_deref(), Some(FORECAST_ERROR));
    }

    // ========================================================================
    // Search
    // ========================================================================

    #[test]
    fn test_search_uses_trimmed_query() {
        let mut app = test_app();
        app.query = "  Lisbon ".to_string();

        let effects = app.dispatch(Action::Search);

        assert!(matches!(
            &effects[0],
            Effect::FetchWeather { location, .. } if location == "Lisbon"
        ));
        assert!(matches!(
            &effects[1],
            Effect::FetchForecast { location, .. } if location == "Lisbon"
        ));
    }

    #[test]
    fn test_search_disabled_for_blank_query() {
        let mut app = test_app();
        app.query = "   ".to_string();
        assert!(app.dispatch(Action::Search).is_empty());
    }

    #[test]
    fn test_search_disabled_while_loading() {
        let mut app = test_app();
        app.query = "Paris".to_string();
        app.dispatch(Action::Search);

        assert!(!app.can_search());
        assert!(app.dispatch(Action::Search).is_empty());
    }

    // ========================================================================
    // Geolocation
    // ========================================================================

    #[test]
    fn test_locate_unsupported_sets_error_without_loading() {
        let cache = WeatherCache::new(Box::new(MemoryStore::new()), DEFAULT_CACHE_TTL);
        let mut app = App::new(cache, DEFAULT_FORECAST_DAYS, false);

        let effects = app.dispatch(Action::LocateMe);

        assert!(effects.is_empty());
        assert_eq!(app.error.as_deref(), Some(GEO_UNSUPPORTED_ERROR));
        assert!(!app.is_loading());
    }

    #[test]
    fn test_locate_success_fetches_weather_only() {
        let mut app = test_app();
        assert_eq!(app.dispatch(Action::LocateMe), vec![Effect::LocateUser]);
        assert!(app.is_loading());

        let effects = app.dispatch(Action::LocationResolved(Ok(Coordinates::new(51.5, -0.12))));

        assert_eq!(effects.len(), 1);
        assert!(matches!(
            &effects[0],
            Effect::FetchWeather { location, .. } if location == "51.5,-0.12"
        ));
    }

    #[test]
    fn test_locate_failure_sets_error_and_clears_loading() {
        let mut app = test_app();
        app.dispatch(Action::LocateMe);

        let effects = app.dispatch(Action::LocationResolved(Err(GeoError::LookupFailed(
            "denied".to_string(),
        ))));

        assert!(effects.is_empty());
        assert_eq!(app.error.as_deref(), Some(GEO_FAILED_ERROR));
        assert!(!app.is_loading());
    }

    #[test]
    fn test_locate_twice_issues_one_lookup() {
        let mut app = test_app();
        app.dispatch(Action::LocateMe);
        assert!(app.dispatch(Action::LocateMe).is_empty());
    }

    // ========================================================================
    // Keyboard handling
    // ========================================================================

    #[test]
    fn test_typing_edits_query() {
        let mut app = test_app();
        app.handle_key(key_event(KeyCode::Char('R')));
        app.handle_key(key_event(KeyCode::Char('o')));
        let effects = app.handle_key(key_event(KeyCode::Char('m')));

        assert_eq!(app.query, "Rom");
        assert_eq!(effects, vec![Effect::ScheduleSettle("Rom".to_string())]);

        app.handle_key(key_event(KeyCode::Backspace));
        assert_eq!(app.query, "Ro");
    }

    #[test]
    fn test_backspace_on_empty_query_is_noop() {
        let mut app = test_app();
        assert!(app.handle_key(key_event(KeyCode::Backspace)).is_empty());
    }

    #[test]
    fn test_ctrl_u_clears_query() {
        let mut app = test_app();
        app.query = "Paris".to_string();
        let effects = app.handle_key(ctrl('u'));

        assert!(app.query.is_empty());
        assert_eq!(effects, vec![Effect::ScheduleSettle(String::new())]);
    }

    #[test]
    fn test_arrow_keys_wrap_through_suggestions() {
        let mut app = test_app();
        with_suggestions(
            &mut app,
            "San",
            vec![
                suggestion("San Francisco", "US"),
                suggestion("Santiago", "CL"),
                suggestion("Santander", "ES"),
            ],
        );

        app.handle_key(key_event(KeyCode::Down));
        assert_eq!(app.highlighted, Some(0));
        app.handle_key(key_event(KeyCode::Up));
        assert_eq!(app.highlighted, Some(2));
        app.handle_key(key_event(KeyCode::Down));
        assert_eq!(app.highlighted, Some(0));
    }

    #[test]
    fn test_arrow_keys_without_suggestions() {
        let mut app = test_app();
        app.handle_key(key_event(KeyCode::Down));
        assert!(app.highlighted.is_none());
    }

    #[test]
    fn test_enter_selects_highlighted_suggestion() {
        let mut app = test_app();
        with_suggestions(
            &mut app,
            "San",
            vec![suggestion("San Francisco", "US"), suggestion("Santiago", "CL")],
        );
        app.handle_key(key_event(KeyCode::Down));
        app.handle_key(key_event(KeyCode::Down));

        let effects = app.handle_key(key_event(KeyCode::Enter));

        assert!(matches!(
            &effects[0],
            Effect::FetchWeather { location, .. } if location == "Santiago"
        ));
    }

    #[test]
    fn test_enter_without_highlight_searches_query() {
        let mut app = test_app();
        app.query = "Madrid".to_string();
        let effects = app.handle_key(key_event(KeyCode::Enter));
        assert_eq!(effects.len(), 2);
    }

    #[test]
    fn test_ctrl_l_and_f2_locate() {
        let mut app = test_app();
        assert_eq!(app.handle_key(ctrl('l')), vec![Effect::LocateUser]);

        let mut app = test_app();
        assert_eq!(app.handle_key(key_event(KeyCode::F(2))), vec![Effect::LocateUser]);
    }

    #[test]
    fn test_locate_key_disabled_while_loading() {
        let mut app = test_app();
        app.fetch_weather("Paris");
        assert!(app.handle_key(ctrl('l')).is_empty());
    }

    #[test]
    fn test_esc_closes_suggestions_then_quits() {
        let mut app = test_app();
        with_suggestions(&mut app, "Lon", vec![suggestion("London", "GB")]);

        app.handle_key(key_event(KeyCode::Esc));
        assert!(app.suggestions.is_empty());
        assert!(!app.should_quit);

        app.handle_key(key_event(KeyCode::Esc));
        assert!(app.should_quit);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut app = test_app();
        app.handle_key(ctrl('c'));
        assert!(app.should_quit);
    }

    #[test]
    fn test_help_overlay_intercepts_keys() {
        let mut app = test_app();
        app.handle_key(key_event(KeyCode::F(1)));
        assert!(app.show_help);

        assert!(app.handle_key(key_event(KeyCode::Char('x'))).is_empty());
        assert!(app.query.is_empty());

        app.handle_key(key_event(KeyCode::Esc));
        assert!(!app.show_help);
        assert!(!app.should_quit);
    }
}
