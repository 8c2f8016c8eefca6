//! # keyvisor
//!
//! **Keyvisor** manages keyboard automation rules for an external
//! AutoHotkey v2 interpreter and supervises the interpreter process that runs them.
//!
//! It keeps hotkeys and hotstrings in an in-memory registry, compiles them
//! into a script behind a fixed prologue, launches the interpreter on that
//! script and keeps it alive with a periodic broadcast. Kill and restart are
//! delivered the same way. A command gateway wraps every operation in a
//! uniform `{success, message}` envelope.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   caller (JSON lines, in-process)
//!            │
//!            ▼
//!     ┌──────────────┐   Request ─► CommandEnvelope
//!     │   Gateway    │
//!     └──────┬───────┘
//!            │ mpsc<Command> + oneshot reply
//!            ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Supervisor loop (single owner of all state)                      │
//! │  - RuleRegistry (hotkeys, hotstrings; insertion ordered)          │
//! │  - ProcessTable (pid → live)                                      │
//! │  - KeepAlive (repeating broadcast while anything is live)         │
//! └──────┬──────────────────┬──────────────────┬───────────────┬──────┘
//!        ▼                  ▼                  ▼               │
//!   compile + write     Launcher           Broadcaster         │
//!   script file        (interpreter)    (KeepAlive / KillAhk)  │
//!                           │                                  │
//!                exit watcher ─► exit message back to loop     │
//!                                                              ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! │                 (capacity: Config::bus_capacity)                  │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                       ┌────────────────────────┐
//!                       │  subscriber_listener   │
//!                       └───────────┬────────────┘
//!                                   ▼
//!                             SubscriberSet
//!                           (per-sub queues)
//!                         ┌─────────┼─────────┐
//!                         ▼         ▼         ▼
//!                      LogWriter  sub2  ...  subN
//! ```
//!
//! ### Process lifecycle
//! ```text
//! run()      ─► compile ─► write script ─► launch ─► record (pid, live) ─► keep-alive on
//! exit(pid)  ─► record (pid, not live) ─► none live? ─► keep-alive off, records cleared
//! kill()     ─► KillAhk(9) delivered? ─► all records not live ─► cleanup
//! restart()  ─► KillAhk(30) delivered (the script reloads itself)
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                          |
//! |-------------------|----------------------------------------------------------|---------------------------------------------|
//! | **Rules**         | Typed hotkey/hotstring rules with strict JSON schema.    | [`HotkeyRule`], [`HotstringRule`]           |
//! | **Compilation**   | Deterministic script rendering.                          | [`compile`], [`RuleRegistry`]               |
//! | **Supervision**   | Interpreter lifecycle, keep-alive, kill, restart.        | [`Supervisor`], [`Launcher`], [`Broadcaster`] |
//! | **Gateway**       | Envelope-returning command surface and line server.      | [`Gateway`], [`CommandEnvelope`], [`serve`] |
//! | **Subscriber API**| Hook into runtime events.                                | [`Subscribe`]                               |
//! | **Errors**        | Typed errors with stable labels.                         | [`RuleError`], [`SupervisorError`]          |
//! | **Configuration** | Centralized runtime settings.                            | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging`: exports the built-in tracing-backed [`LogWriter`].
//! - `cli`: builds the `keyvisor` binary (JSON lines over stdin/stdout).
//!
//! ## Example
//! ```rust
//! use keyvisor::{HotstringBuilder, HotstringOption, RuleRegistry, compile};
//!
//! let mut reg = RuleRegistry::new();
//! let btw = HotstringBuilder::new("btw", "by the way")
//!     .option(HotstringOption::Immediate)
//!     .build()
//!     .unwrap();
//! reg.upsert_hotstring(btw, false).unwrap();
//!
//! assert!(compile(&reg).contains(":*:btw::by the way"));
//! ```
mod core;
mod error;
mod events;
mod rules;
mod subscribers;

pub mod gateway;

// ---- Public re-exports ----

pub use crate::core::broadcast::{Broadcast, Broadcaster, InterpreterBroadcaster, Signal};
pub use crate::core::compiler::{PROLOGUE, compile, compile_with};
pub use crate::core::launcher::{BoxExitFuture, InterpreterLauncher, Launcher, Spawned};
pub use crate::core::shutdown::wait_for_shutdown_signal;
pub use crate::core::{Config, RuleRegistry, SCRIPT_FILE_NAME, Snapshot, Supervisor, SupervisorBuilder};
pub use error::{Error, RuleError, SupervisorError};
pub use events::{Bus, Event, EventKind};
pub use gateway::{CommandEnvelope, Gateway, Request, serve};
pub use rules::codes::{Describe, HotkeyModifier, HotstringOption, Side, Slot};
pub use rules::{
    ChordKey, HotkeyBuilder, HotkeyRule, HotstringBuilder, HotstringRule, ModifierGroups,
    RuleKind,
};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: built-in tracing-backed subscriber.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
