//! Shared state for the webhook server.

use std::time::Instant;

use relay_alerts::AlertDispatcher;
use relay_registry::SharedRegistry;

/// State shared by all request handlers.
#[derive(Debug)]
pub struct AppState {
    dispatcher: AlertDispatcher,
    start_time: Instant,
}

impl AppState {
    /// Creates the state around `dispatcher`.
    #[must_use]
    pub fn new(dispatcher: AlertDispatcher) -> Self {
        Self {
            dispatcher,
            start_time: Instant::now(),
        }
    }

    /// The alert dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &AlertDispatcher {
        &self.dispatcher
    }

    /// The instance registry.
    #[must_use]
    pub fn registry(&self) -> &SharedRegistry {
        self.dispatcher.registry()
    }

    /// Seconds since the state was created.
    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
