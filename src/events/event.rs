//! # Runtime events emitted by the supervisor.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Rule events**: registry changes (upserted, removed, rejected)
//! - **Process events**: interpreter lifecycle (compiled, spawned, exited)
//! - **Signal events**: keep-alive timer and broadcast delivery
//! - **Subscriber events**: fan-out overflow and panics
//!
//! The [`Event`] struct carries additional metadata such as timestamps, pid,
//! signal name and reasons.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//!
//! ## Example
//! ```rust
//! use keyvisor::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::ProcessExited)
//!     .with_pid(4242)
//!     .with_exit_code(Some(0));
//!
//! assert_eq!(ev.kind, EventKind::ProcessExited);
//! assert_eq!(ev.pid, Some(4242));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

use crate::rules::RuleKind;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `subscriber`: subscriber name
    /// - `reason`: "full" or "closed"
    SubscriberOverflow,

    // === Rule events ===
    /// A rule was inserted or replaced.
    ///
    /// Sets:
    /// - `rule`, `keys`
    RuleUpserted,

    /// A rule was removed (only when something was actually removed).
    ///
    /// Sets:
    /// - `rule`, `keys`
    RuleRemoved,

    /// An upsert or edit was refused.
    ///
    /// Sets:
    /// - `rule`, `keys` (when known)
    /// - `reason`: error message
    RuleRejected,

    // === Process events ===
    /// Registry compiled and written to the script path.
    ///
    /// Sets:
    /// - `reason`: script path
    ScriptCompiled,

    /// Interpreter process started.
    ///
    /// Sets:
    /// - `pid`
    ProcessSpawned,

    /// Launching the interpreter failed.
    ///
    /// Sets:
    /// - `reason`: error message
    SpawnFailed,

    /// Interpreter process exited.
    ///
    /// Sets:
    /// - `pid`
    /// - `exit_code` (absent when killed by a signal)
    ProcessExited,

    // === Signal events ===
    /// Keep-alive timer (re)started.
    KeepAliveStarted,

    /// Keep-alive timer torn down and process records cleared.
    KeepAliveStopped,

    /// A broadcast was delivered.
    ///
    /// Sets:
    /// - `signal`, `wparam`
    BroadcastSent,

    /// A broadcast failed or timed out.
    ///
    /// Sets:
    /// - `signal`, `wparam`
    /// - `reason`: error message
    BroadcastFailed,
}

/// Runtime event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Interpreter process id.
    pub pid: Option<u32>,
    /// Interpreter exit code.
    pub exit_code: Option<i32>,
    /// Registered broadcast message name.
    pub signal: Option<&'static str>,
    /// First broadcast parameter.
    pub wparam: Option<u32>,
    /// Keyspace of the affected rule.
    pub rule: Option<RuleKind>,
    /// Keys of the affected rule.
    pub keys: Option<Arc<str>>,
    /// Subscriber name (subscriber events only).
    pub subscriber: Option<&'static str>,
    /// Human-readable reason (errors, paths, overflow details).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            pid: None,
            exit_code: None,
            signal: None,
            wparam: None,
            rule: None,
            keys: None,
            subscriber: None,
            reason: None,
        }
    }

    #[inline]
    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    #[inline]
    pub fn with_exit_code(mut self, code: Option<i32>) -> Self {
        self.exit_code = code;
        self
    }

    #[inline]
    pub fn with_signal(mut self, signal: &'static str, wparam: u32) -> Self {
        self.signal = Some(signal);
        self.wparam = Some(wparam);
        self
    }

    #[inline]
    pub fn with_rule(mut self, kind: RuleKind, keys: impl Into<Arc<str>>) -> Self {
        self.rule = Some(kind);
        self.keys = Some(keys.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        let mut ev = Event::new(EventKind::SubscriberOverflow).with_reason(reason);
        ev.subscriber = Some(subscriber);
        ev
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        let mut ev = Event::new(EventKind::SubscriberPanicked).with_reason(info);
        ev.subscriber = Some(subscriber);
        ev
    }
}
