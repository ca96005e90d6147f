//! Effect execution
//!
//! Runs the effects returned by [`App::dispatch`] on background tokio tasks
//! and reports their outcomes back to the main loop as [`Action`]s over an
//! unbounded channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::debug;

use crate::app::{Action, App, Effect};
use crate::data::{LocationProvider, WeatherApiClient};
use crate::debounce::Debouncer;

/// Executes effects and collects their results
pub struct EffectRunner {
    client: WeatherApiClient,
    locator: Arc<dyn LocationProvider>,
    debouncer: Debouncer<Action>,
    receiver: mpsc::UnboundedReceiver<Action>,
    sender: mpsc::UnboundedSender<Action>,
}

impl EffectRunner {
    /// Creates a runner that settles queries after `debounce` of inactivity
    pub fn new(
        client: WeatherApiClient,
        locator: Arc<dyn LocationProvider>,
        debounce: Duration,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        Self {
            client,
            locator,
            debouncer: Debouncer::new(debounce, sender.clone()),
            receiver,
            sender,
        }
    }

    /// Starts an effect; its result arrives later as an action
    ///
    /// Must be called from within a tokio runtime.
    pub fn run(&mut self, effect: Effect) {
        debug!(?effect, "running effect");
        let tx = self.sender.clone();

        match effect {
            Effect::ScheduleSettle(text) => {
                self.debouncer.schedule(Action::QuerySettled(text));
            }
            Effect::FetchSuggestions { seq, query } => {
                let client = self.client.clone();
                tokio::spawn(async move {
                    let result = client.fetch_suggestions(&query).await;
                    let _ = tx.send(Action::SuggestionsLoaded { seq, result });
                });
            }
            Effect::FetchWeather { seq, location } => {
                let client = self.client.clone();
                tokio::spawn(async move {
                    let result = client.fetch_weather(&location).await;
                    let _ = tx.send(Action::WeatherLoaded {
                        seq,
                        location,
                        result,
                    });
                });
            }
            Effect::FetchForecast {
                seq,
                location,
                days,
            } => {
                let client = self.client.clone();
                tokio::spawn(async move {
                    let result = client.fetch_forecast(&location, days).await;
                    let _ = tx.send(Action::ForecastLoaded { seq, result });
                });
            }
            Effect::LocateUser => {
                let locator = Arc::clone(&self.locator);
                tokio::spawn(async move {
                    let result = locator.current_position().await;
                    let _ = tx.send(Action::LocationResolved(result));
                });
            }
        }
    }

    pub fn run_all(&mut self, effects: impl IntoIterator<Item = Effect>) {
        for effect in effects {
            self.run(effect);
        }
    }

    /// Dispatches an action to the app and runs whatever it asks for
    pub fn apply(&mut self, app: &mut App, action: Action) {
        let effects = app.dispatch(action);
        self.run_all(effects);
    }

    /// Applies every action that has already arrived, without blocking
    ///
    /// Returns the number of actions applied.
    pub fn pump(&mut self, app: &mut App) -> usize {
        let mut applied = 0;
        while let Ok(action) = self.receiver.try_recv() {
            self.apply(app, action);
            applied += 1;
        }
        applied
    }

    /// Waits for the next completed effect and applies it
    pub async fn step(&mut self, app: &mut App) {
        // The runner holds a sender, so the channel never closes
        if let Some(action) = self.receiver.recv().await {
            self.apply(app, action);
        }
    }

    /// Sender for injecting actions from outside the runner
    pub fn sender(&self) -> mpsc::UnboundedSender<Action> {
        self.sender.clone()
    }
}
