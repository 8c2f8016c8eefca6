//! # Keep-alive timer.
//!
//! A repeating background task that posts [`Broadcast::keep_alive`] every
//! interval while at least one interpreter is live. Each tick is
//! fire-and-forget: a slow or failing delivery never delays the next tick.
//!
//! ## Rules
//! - `start` replaces any running timer (at most one timer exists)
//! - `cancel` is idempotent
//! - first tick fires one full interval after `start`

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::core::broadcast::{Broadcast, Broadcaster};
use crate::events::{Bus, Event, EventKind};

/// Handle to the (optional) running timer.
#[derive(Debug, Default)]
pub struct KeepAlive {
    token: Option<CancellationToken>,
}

impl KeepAlive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts the timer, cancelling a previous one if present.
    pub fn start(&mut self, period: Duration, broadcaster: Arc<dyn Broadcaster>, bus: Bus) {
        self.cancel();
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let period = period.max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        let b = Arc::clone(&broadcaster);
                        let bus = bus.clone();
                        tokio::spawn(async move { tick(b, bus).await });
                    }
                }
            }
        });
        self.token = Some(token);
    }

    /// Stops the timer. Returns whether one was running.
    pub fn cancel(&mut self) -> bool {
        match self.token.take() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.token.is_some()
    }
}

impl Drop for KeepAlive {
    fn drop(&mut self) {
        self.cancel();
    }
}

async fn tick(broadcaster: Arc<dyn Broadcaster>, bus: Bus) {
    let msg = Broadcast::keep_alive();
    let ev = match broadcaster.deliver(msg).await {
        Ok(()) => Event::new(EventKind::BroadcastSent),
        Err(e) => Event::new(EventKind::BroadcastFailed).with_reason(e.to_string()),
    };
    bus.publish(ev.with_signal(msg.signal.name(), msg.wparam));
}
