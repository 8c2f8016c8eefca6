use std::borrow::Cow;
use std::sync::Arc;

use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        Config,
        broadcast::{Broadcaster, InterpreterBroadcaster},
        compiler::PROLOGUE,
        launcher::{InterpreterLauncher, Launcher},
    },
    error::SupervisorError,
    events::Bus,
    subscribers::{Subscribe, SubscriberSet},
};
use super::supervisor::Supervisor;

/// Builder for constructing a [`Supervisor`] with optional overrides.
pub struct SupervisorBuilder {
    cfg: Config,
    subscribers: Vec<Arc<dyn Subscribe>>,
    launcher: Option<Arc<dyn Launcher>>,
    broadcaster: Option<Arc<dyn Broadcaster>>,
    prologue: Cow<'static, str>,
}

impl SupervisorBuilder {
    /// Creates a new builder with the given configuration.
    pub fn new(cfg: Config) -> Self {
        Self {
            cfg,
            subscribers: Vec::new(),
            launcher: None,
            broadcaster: None,
            prologue: Cow::Borrowed(PROLOGUE),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive runtime events (rule changes, process lifecycle,
    /// broadcasts) through dedicated workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Replaces the process launcher (defaults to [`InterpreterLauncher`]).
    pub fn with_launcher(mut self, launcher: Arc<dyn Launcher>) -> Self {
        self.launcher = Some(launcher);
        self
    }

    /// Replaces the broadcaster (defaults to [`InterpreterBroadcaster`]).
    pub fn with_broadcaster(mut self, broadcaster: Arc<dyn Broadcaster>) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    /// Replaces the fixed script prologue.
    pub fn with_prologue(mut self, prologue: impl Into<Cow<'static, str>>) -> Self {
        self.prologue = prologue.into();
        self
    }

    /// Builds the supervisor and spawns its loop.
    ///
    /// The interpreter is located only if a default launcher or broadcaster
    /// is needed; that lookup is the one place [`SupervisorError::NotFound`]
    /// comes from. Must be called inside a tokio runtime.
    pub fn build(self) -> Result<Supervisor, SupervisorError> {
        let (launcher, broadcaster) = match (self.launcher, self.broadcaster) {
            (Some(l), Some(b)) => (l, b),
            (l, b) => {
                let interpreter = self.cfg.resolve_interpreter()?;
                let l = l.unwrap_or_else(|| Arc::new(InterpreterLauncher::new(&interpreter)));
                let b = b.unwrap_or_else(|| Arc::new(InterpreterBroadcaster::new(&interpreter)));
                (l, b)
            }
        };

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let runtime_token = CancellationToken::new();
        if !self.subscribers.is_empty() {
            let subs = SubscriberSet::new(self.subscribers, bus.clone());
            subscriber_listener(&bus, subs, runtime_token.clone());
        }

        Ok(Supervisor::spawn(
            self.cfg,
            bus,
            launcher,
            broadcaster,
            self.prologue,
            runtime_token,
        ))
    }
}

/// Forwards bus events to the subscriber set (fire-and-forget).
///
/// The set holds a bus sender itself, so the channel never closes while it
/// lives; the runtime token ends the listener instead. Events already queued
/// at that point are still delivered before the workers are drained.
fn subscriber_listener(bus: &Bus, subs: SubscriberSet, token: CancellationToken) {
    let mut rx = bus.subscribe();
    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                res = rx.recv() => match res {
                    Ok(ev) => subs.emit(ev),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                },
            }
        }
        loop {
            match rx.try_recv() {
                Ok(ev) => subs.emit(ev),
                Err(TryRecvError::Lagged(_)) => continue,
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
        subs.shutdown().await;
    });
}
