//! # Request rate limiting
//!
//! [`RateLimiter`] keeps the client inside the remote API's free-tier limits with two
//! guards, checked in order before every request:
//!
//! 1. **Window**: at most `max_requests_per_window` requests per `window` (60 s by
//!    default). A window older than `window` is reset; a full window that has not yet
//!    elapsed is waited out, then reset.
//! 2. **Interval**: at least `min_interval` between consecutive requests.
//!
//! The limiter is a plain owned value held by the [`Assistant`](crate::assistant::Assistant);
//! nothing about it is global. Time comes from `tokio::time::Instant`, so tests can run it
//! under a paused clock.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::console::Console;

/// Limits, as found in the `rate_limit` section of the config file.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Minimum seconds between two requests.
    pub min_interval_secs: u64,
    /// Requests allowed per window.
    pub max_requests_per_window: u32,
    /// Window length in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            min_interval_secs: 4,
            max_requests_per_window: 15,
            window_secs: 60,
        }
    }
}

/// A wait the limiter requires before the next request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// The window is full; wait for it to end.
    Window(Duration),
    /// The previous request was too recent.
    Interval(Duration),
}

/// Rolling-window request counter with a minimum spacing between requests.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    min_interval: Duration,
    max_requests: u32,
    window: Duration,
    window_start: Instant,
    requests_in_window: u32,
    last_request: Option<Instant>,
    next_available: Option<Instant>,
}

impl RateLimiter {
    /// Creates a limiter whose first window starts now.
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            min_interval: Duration::from_secs(config.min_interval_secs),
            max_requests: config.max_requests_per_window,
            window: Duration::from_secs(config.window_secs),
            window_start: Instant::now(),
            requests_in_window: 0,
            last_request: None,
            next_available: None,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn requests_in_window(&self) -> u32 {
        self.requests_in_window
    }

    /// Earliest instant the next request may go out, once one has been recorded.
    pub fn next_available(&self) -> Option<Instant> {
        self.next_available
    }

    /// The wait required before a request at `now`, or `None` if it may proceed.
    ///
    /// An elapsed window is reset as a side effect.
    pub fn pending_gate(&mut self, now: Instant) -> Option<Gate> {
        let window_age = now.saturating_duration_since(self.window_start);
        if window_age >= self.window {
            self.reset_window(now);
        } else if self.max_requests > 0 && self.requests_in_window >= self.max_requests {
            return Some(Gate::Window(self.window - window_age));
        }

        if let Some(last) = self.last_request {
            let since_last = now.saturating_duration_since(last);
            if since_last < self.min_interval {
                return Some(Gate::Interval(self.min_interval - since_last));
            }
        }
        None
    }

    /// Starts a fresh window at `now`.
    pub fn reset_window(&mut self, now: Instant) {
        self.requests_in_window = 0;
        self.window_start = now;
    }

    /// Counts a request issued at `now`.
    pub fn record(&mut self, now: Instant) {
        self.last_request = Some(now);
        self.requests_in_window += 1;
        self.next_available = Some(now + self.min_interval);
    }

    /// Blocks until a request is allowed, showing a countdown on `console`, then records it.
    pub async fn acquire(&mut self, console: &Console) {
        while let Some(gate) = self.pending_gate(Instant::now()) {
            match gate {
                Gate::Window(wait) => {
                    info!("Request cap reached, waiting {:?} for the window", wait);
                    console.warn(&format!(
                        "\nPer-minute request limit reached. Wait {} seconds...",
                        wait.as_secs_f64().round()
                    ));
                    console.wait(wait, "Waiting for the per-minute limit:").await;
                    self.reset_window(Instant::now());
                }
                Gate::Interval(wait) => {
                    debug!("Spacing requests, waiting {:?}", wait);
                    console.status(&format!(
                        "\nWaiting between requests: {} seconds",
                        wait.as_secs_f64().ceil()
                    ));
                    console.wait(wait, "Waiting between requests:").await;
                }
            }
        }
        self.record(Instant::now());
    }
}
