//! # Console output
//!
//! Everything the user sees besides the answers themselves goes through [`Console`]: status
//! lines, warnings, and the in-place [`Countdown`] shown while the rate limiter or the
//! quota handler waits.
//!
//! A countdown is a single loop of short `tokio::time::sleep`s against a fixed deadline, so
//! the wait is exact regardless of how long drawing takes. Cancelling a countdown through
//! its [`CountdownCanceller`] only stops the drawing; the wait still runs to its deadline.

use crossterm::{
    ExecutableCommand,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};
use std::{
    io::{Write, stdout},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::time::{Instant, sleep};
use tracing::warn;

/// How often a countdown redraws.
pub const COUNTDOWN_TICK: Duration = Duration::from_millis(250);

/// Terminal sink for status messages and countdowns.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    quiet: bool,
}

impl Console {
    /// Writes to standard output.
    pub fn stdout() -> Self {
        Self { quiet: false }
    }

    /// Discards all output. Waits still happen.
    pub fn quiet() -> Self {
        Self { quiet: true }
    }

    /// Prints a status line.
    pub fn status(&self, message: &str) {
        if !self.quiet {
            println!("{message}");
        }
    }

    /// Prints a highlighted warning line.
    pub fn warn(&self, message: &str) {
        if self.quiet {
            return;
        }
        let mut out = stdout();
        let _ = out.execute(SetForegroundColor(Color::Yellow));
        let _ = out.execute(Print(format!("{message}\n")));
        let _ = out.execute(ResetColor);
        let _ = out.flush();
    }

    /// Creates a countdown bound to this console.
    pub fn countdown(&self, total: Duration, message: impl Into<String>) -> Countdown {
        Countdown {
            total,
            message: message.into(),
            tick: COUNTDOWN_TICK,
            cancelled: Arc::new(AtomicBool::new(false)),
            display: !self.quiet,
        }
    }

    /// Waits `total`, drawing a countdown labelled `message`.
    pub async fn wait(&self, total: Duration, message: &str) {
        self.countdown(total, message).run().await;
    }
}

/// Stops a running [`Countdown`]'s display.
#[derive(Debug, Clone)]
pub struct CountdownCanceller(Arc<AtomicBool>);

impl CountdownCanceller {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// A visual tick-down over a fixed wait.
#[derive(Debug)]
pub struct Countdown {
    total: Duration,
    message: String,
    tick: Duration,
    cancelled: Arc<AtomicBool>,
    display: bool,
}

impl Countdown {
    /// Overrides the redraw interval.
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick.max(Duration::from_millis(1));
        self
    }

    /// Handle that stops the display early.
    pub fn canceller(&self) -> CountdownCanceller {
        CountdownCanceller(Arc::clone(&self.cancelled))
    }

    /// Waits for the full duration, redrawing every tick until cancelled.
    ///
    /// A duration too long for the clock to represent returns immediately.
    pub async fn run(self) {
        let Some(deadline) = Instant::now().checked_add(self.total) else {
            warn!("Countdown of {:?} is out of range, skipping", self.total);
            return;
        };
        let mut drawing = self.display;

        loop {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let remaining = deadline - now;

            if drawing && self.cancelled.load(Ordering::Relaxed) {
                clear_line();
                drawing = false;
            }
            if drawing {
                let secs = remaining.as_millis().div_ceil(1000);
                let mut out = stdout();
                let _ = out.execute(Print(format!("\r{} {secs} seconds left...", self.message)));
                let _ = out.flush();
            }

            sleep(remaining.min(self.tick)).await;
        }

        if drawing {
            clear_line();
        }
    }
}

fn clear_line() {
    let mut out = stdout();
    let _ = out.execute(Clear(ClearType::CurrentLine));
    let _ = out.execute(Print("\r"));
    let _ = out.flush();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn countdown_waits_full_duration() {
        let started = Instant::now();
        Console::quiet().wait(Duration::from_secs(7), "waiting:").await;
        assert!(started.elapsed() >= Duration::from_secs(7));
        assert!(started.elapsed() < Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_countdown_still_waits() {
        let countdown = Console::quiet().countdown(Duration::from_secs(3), "waiting:");
        let canceller = countdown.canceller();
        canceller.cancel();
        let started = Instant::now();
        countdown.run().await;
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_duration_returns_immediately() {
        let started = Instant::now();
        Console::quiet().wait(Duration::ZERO, "none").await;
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn unrepresentable_duration_does_not_panic() {
        let started = Instant::now();
        Console::quiet().wait(Duration::MAX, "forever").await;
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[test]
    fn tick_has_a_floor() {
        let countdown = Console::quiet()
            .countdown(Duration::from_secs(1), "x")
            .with_tick(Duration::ZERO);
        assert_eq!(countdown.tick, Duration::from_millis(1));
    }
}
