//! Cancelable deferred delivery
//!
//! A `Debouncer` forwards a value to a channel once no newer value has been
//! scheduled for the configured delay. Every call to `schedule` cancels the
//! previously pending delivery.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Delivers only the last value of a burst, after a quiet period
#[derive(Debug)]
pub struct Debouncer<T> {
    delay: Duration,
    sink: mpsc::UnboundedSender<T>,
    pending: Option<JoinHandle<()>>,
}

impl<T: Send + 'static> Debouncer<T> {
    pub fn new(delay: Duration, sink: mpsc::UnboundedSender<T>) -> Self {
        Self {
            delay,
            sink,
            pending: None,
        }
    }

    /// Schedules `value` for delivery after the delay, replacing any pending value
    ///
    /// Must be called from within a tokio runtime.
    pub fn schedule(&mut self, value: T) {
        self.cancel();

        let sink = self.sink.clone();
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the app is shutting down
            let _ = sink.send(value);
        }));
    }

    /// Drops the pending value, if any
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Whether a value is waiting to be delivered
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl<T> Drop for Debouncer<T> {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
