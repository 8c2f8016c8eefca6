//! # Supervisor: owns the rule registry and the interpreter lifecycle.
//!
//! All mutable state (registry, process table, keep-alive timer) lives inside
//! one loop task. Callers talk to it through a cloneable [`Supervisor`] handle
//! that sends [`Command`]s with a oneshot reply; process exits arrive on a
//! second queue fed by per-process watcher tasks. Nothing else mutates state.
//!
//! ## High-level architecture
//! ```text
//!   Gateway ── Supervisor (handle) ── mpsc<Command> ──┐
//!                                                     ▼
//!                                        ┌──────────────────────────┐
//!   exit watcher(pid) ── mpsc<Exit> ────►│ SupervisorLoop           │
//!                                        │  - RuleRegistry          │
//!                                        │  - ProcessTable          │
//!                                        │  - KeepAlive             │
//!                                        └──┬──────────┬────────────┘
//!                                           ▼          ▼
//!                                     Launcher     Broadcaster
//! ```
//!
//! ## Lifecycle
//! ```text
//! Idle ──run()──► compile → write script → launch
//!                     ├─ Err ─► SpawnFailed (still Idle)
//!                     └─ Ok(pid) ─► record (pid, live) → (re)start keep-alive → Running
//!
//! Running ──kill()────► sync KillAhk(9)  ─ Ok ─► mark all exited → cleanup → Idle
//!                                        └ Err ─► records untouched
//! Running ──restart()─► sync KillAhk(30) (no respawn here)
//! exit(pid) ──────────► mark exited → cleanup
//!
//! cleanup: if no live record → cancel keep-alive, clear records
//! ```

use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::core::alive::ProcessTable;
use crate::core::broadcast::{Broadcast, Broadcaster};
use crate::core::builder::SupervisorBuilder;
use crate::core::compiler::{compile_with, with_watchdog};
use crate::core::config::Config;
use crate::core::keepalive::KeepAlive;
use crate::core::launcher::{BoxExitFuture, Launcher};
use crate::core::registry::RuleRegistry;
use crate::error::{Error, RuleError, SupervisorError};
use crate::events::{Bus, Event, EventKind};
use crate::rules::{HotkeyRule, HotstringRule, RuleKind};

type Reply<T> = oneshot::Sender<T>;

/// Requests handled by the supervisor loop.
pub(crate) enum Command {
    UpsertHotkey {
        rule: HotkeyRule,
        overwrite: bool,
        reply: Reply<Result<(), RuleError>>,
    },
    UpsertHotstring {
        rule: HotstringRule,
        overwrite: bool,
        reply: Reply<Result<(), RuleError>>,
    },
    ReplaceHotkey {
        rule: HotkeyRule,
        reply: Reply<Result<(), RuleError>>,
    },
    ReplaceHotstring {
        rule: HotstringRule,
        reply: Reply<Result<(), RuleError>>,
    },
    Remove {
        kind: RuleKind,
        keys: String,
        reply: Reply<bool>,
    },
    ListHotkeys {
        reply: Reply<Vec<HotkeyRule>>,
    },
    ListHotstrings {
        reply: Reply<Vec<HotstringRule>>,
    },
    Run {
        reply: Reply<Result<u32, SupervisorError>>,
    },
    Kill {
        reply: Reply<Result<(), SupervisorError>>,
    },
    Restart {
        reply: Reply<Result<(), SupervisorError>>,
    },
    Status {
        reply: Reply<Option<u32>>,
    },
    Snapshot {
        reply: Reply<Snapshot>,
    },
}

/// Exit notification posted by a watcher task.
struct Exit {
    pid: u32,
    code: Option<i32>,
}

/// Point-in-time view of the supervisor's process state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// `(pid, live)` in spawn order.
    pub processes: Vec<(u32, bool)>,
    /// Whether the keep-alive timer exists.
    pub keep_alive: bool,
}

/// Cloneable handle to the supervisor loop.
///
/// Construct with [`Supervisor::builder`]. Every method is a round trip to the
/// loop, so calls are serialized in the order they are received.
#[derive(Clone)]
pub struct Supervisor {
    tx: mpsc::Sender<Command>,
    bus: Bus,
    token: CancellationToken,
}

impl Supervisor {
    /// Starts building a supervisor with the given configuration.
    pub fn builder(cfg: Config) -> SupervisorBuilder {
        SupervisorBuilder::new(cfg)
    }

    /// Spawns the loop. Called by the builder.
    pub(crate) fn spawn(
        cfg: Config,
        bus: Bus,
        launcher: Arc<dyn Launcher>,
        broadcaster: Arc<dyn Broadcaster>,
        prologue: Cow<'static, str>,
        token: CancellationToken,
    ) -> Self {
        let (tx, rx) = mpsc::channel(cfg.command_capacity_clamped());
        let (exit_tx, exit_rx) = mpsc::unbounded_channel();

        let core = SupervisorLoop {
            cfg,
            bus: bus.clone(),
            launcher,
            broadcaster,
            prologue,
            registry: RuleRegistry::new(),
            procs: ProcessTable::new(),
            keep_alive: KeepAlive::new(),
            exit_tx,
        };
        tokio::spawn(core.run(rx, exit_rx, token.clone()));

        Self { tx, bus, token }
    }

    /// The event bus this supervisor publishes on.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Stops the loop. Pending and later calls fail with [`SupervisorError::Closed`].
    ///
    /// Subscribers receive the events already on the bus, then their workers end.
    ///
    /// Running interpreters are left alone; call [`kill`](Self::kill) first to stop them.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(Reply<T>) -> Command,
    ) -> Result<T, SupervisorError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(make(reply))
            .await
            .map_err(|_| SupervisorError::Closed)?;
        rx.await.map_err(|_| SupervisorError::Closed)
    }

    pub async fn upsert_hotkey(&self, rule: HotkeyRule, overwrite: bool) -> Result<(), Error> {
        self.request(|reply| Command::UpsertHotkey {
            rule,
            overwrite,
            reply,
        })
        .await??;
        Ok(())
    }

    pub async fn upsert_hotstring(
        &self,
        rule: HotstringRule,
        overwrite: bool,
    ) -> Result<(), Error> {
        self.request(|reply| Command::UpsertHotstring {
            rule,
            overwrite,
            reply,
        })
        .await??;
        Ok(())
    }

    /// Replaces an existing hotkey ([`RuleError::Missing`] if none is bound).
    pub async fn replace_hotkey(&self, rule: HotkeyRule) -> Result<(), Error> {
        self.request(|reply| Command::ReplaceHotkey { rule, reply })
            .await??;
        Ok(())
    }

    /// Replaces an existing hotstring ([`RuleError::Missing`] if none is bound).
    pub async fn replace_hotstring(&self, rule: HotstringRule) -> Result<(), Error> {
        self.request(|reply| Command::ReplaceHotstring { rule, reply })
            .await??;
        Ok(())
    }

    /// Removes a rule. Returns whether anything was removed.
    pub async fn remove(&self, kind: RuleKind, keys: &str) -> Result<bool, SupervisorError> {
        let keys = keys.to_string();
        self.request(|reply| Command::Remove { kind, keys, reply })
            .await
    }

    pub async fn list_hotkeys(&self) -> Result<Vec<HotkeyRule>, SupervisorError> {
        self.request(|reply| Command::ListHotkeys { reply }).await
    }

    pub async fn list_hotstrings(&self) -> Result<Vec<HotstringRule>, SupervisorError> {
        self.request(|reply| Command::ListHotstrings { reply })
            .await
    }

    /// Compiles the registry, writes the script and launches the interpreter.
    ///
    /// Returns the new pid.
    pub async fn run(&self) -> Result<u32, SupervisorError> {
        self.request(|reply| Command::Run { reply }).await?
    }

    /// Broadcasts a kill and, once delivered, forgets all recorded processes.
    pub async fn kill(&self) -> Result<(), SupervisorError> {
        self.request(|reply| Command::Kill { reply }).await?
    }

    /// Broadcasts a restart request to the running script.
    pub async fn restart(&self) -> Result<(), SupervisorError> {
        self.request(|reply| Command::Restart { reply }).await?
    }

    /// First live pid in spawn order, if any.
    pub async fn status(&self) -> Result<Option<u32>, SupervisorError> {
        self.request(|reply| Command::Status { reply }).await
    }

    pub async fn snapshot(&self) -> Result<Snapshot, SupervisorError> {
        self.request(|reply| Command::Snapshot { reply }).await
    }
}

/// The single execution context owning all supervisor state.
struct SupervisorLoop {
    cfg: Config,
    bus: Bus,
    launcher: Arc<dyn Launcher>,
    broadcaster: Arc<dyn Broadcaster>,
    prologue: Cow<'static, str>,
    registry: RuleRegistry,
    procs: ProcessTable,
    keep_alive: KeepAlive,
    exit_tx: mpsc::UnboundedSender<Exit>,
}

impl SupervisorLoop {
    async fn run(
        mut self,
        mut rx: mpsc::Receiver<Command>,
        mut exit_rx: mpsc::UnboundedReceiver<Exit>,
        token: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                Some(exit) = exit_rx.recv() => self.on_exit(exit),
                cmd = rx.recv() => match cmd {
                    Some(cmd) => self.handle(cmd).await,
                    None => break,
                },
            }
        }
        if self.keep_alive.cancel() {
            self.bus.publish(Event::new(EventKind::KeepAliveStopped));
        }
    }

    async fn handle(&mut self, cmd: Command) {
        // A dropped reply receiver means the caller went away; nothing to report.
        match cmd {
            Command::UpsertHotkey {
                rule,
                overwrite,
                reply,
            } => {
                let keys = rule.keys().to_string();
                let res = self.registry.upsert_hotkey(rule, overwrite);
                self.publish_rule_result(RuleKind::Hotkey, keys, &res);
                let _ = reply.send(res);
            }
            Command::UpsertHotstring {
                rule,
                overwrite,
                reply,
            } => {
                let keys = rule.keys().to_string();
                let res = self.registry.upsert_hotstring(rule, overwrite);
                self.publish_rule_result(RuleKind::Hotstring, keys, &res);
                let _ = reply.send(res);
            }
            Command::ReplaceHotkey { rule, reply } => {
                let keys = rule.keys().to_string();
                let res = self.registry.replace_hotkey(rule);
                self.publish_rule_result(RuleKind::Hotkey, keys, &res);
                let _ = reply.send(res);
            }
            Command::ReplaceHotstring { rule, reply } => {
                let keys = rule.keys().to_string();
                let res = self.registry.replace_hotstring(rule);
                self.publish_rule_result(RuleKind::Hotstring, keys, &res);
                let _ = reply.send(res);
            }
            Command::Remove { kind, keys, reply } => {
                let removed = self.registry.remove(kind, &keys);
                if removed {
                    self.bus
                        .publish(Event::new(EventKind::RuleRemoved).with_rule(kind, keys));
                }
                let _ = reply.send(removed);
            }
            Command::ListHotkeys { reply } => {
                let _ = reply.send(self.registry.list_hotkeys());
            }
            Command::ListHotstrings { reply } => {
                let _ = reply.send(self.registry.list_hotstrings());
            }
            Command::Run { reply } => {
                let res = self.start().await;
                let _ = reply.send(res);
            }
            Command::Kill { reply } => {
                let res = self.kill().await;
                let _ = reply.send(res);
            }
            Command::Restart { reply } => {
                let res = self.broadcast_sync(Broadcast::restart()).await;
                let _ = reply.send(res);
            }
            Command::Status { reply } => {
                let _ = reply.send(self.procs.first_live());
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(Snapshot {
                    processes: self.procs.snapshot(),
                    keep_alive: self.keep_alive.is_running(),
                });
            }
        }
    }

    fn publish_rule_result(&self, kind: RuleKind, keys: String, res: &Result<(), RuleError>) {
        let ev = match res {
            Ok(()) => Event::new(EventKind::RuleUpserted),
            Err(e) => Event::new(EventKind::RuleRejected).with_reason(e.to_string()),
        };
        self.bus.publish(ev.with_rule(kind, keys));
    }

    async fn start(&mut self) -> Result<u32, SupervisorError> {
        if self.cfg.single_instance {
            if let Some(pid) = self.procs.first_live() {
                return Err(SupervisorError::AlreadyRunning { pid });
            }
        }

        let prologue = with_watchdog(&self.prologue, self.cfg.watchdog());
        let script = compile_with(&prologue, &self.registry);
        let path = self.cfg.script_path.clone();
        write_script(&path, script).await?;
        self.bus.publish(
            Event::new(EventKind::ScriptCompiled).with_reason(path.display().to_string()),
        );

        let spawned = match self.launcher.launch(&path).await {
            Ok(s) => s,
            Err(e) => {
                self.bus
                    .publish(Event::new(EventKind::SpawnFailed).with_reason(e.to_string()));
                return Err(e);
            }
        };

        let pid = spawned.pid;
        self.procs.insert_live(pid);
        self.watch_exit(pid, spawned.exit);
        self.bus
            .publish(Event::new(EventKind::ProcessSpawned).with_pid(pid));

        self.keep_alive.start(
            self.cfg.keep_alive_interval,
            Arc::clone(&self.broadcaster),
            self.bus.clone(),
        );
        self.bus.publish(Event::new(EventKind::KeepAliveStarted));
        Ok(pid)
    }

    /// Posts the exit of `pid` back onto the loop once it happens.
    fn watch_exit(&self, pid: u32, exit: BoxExitFuture) {
        let tx = self.exit_tx.clone();
        tokio::spawn(async move {
            let code = exit.await;
            let _ = tx.send(Exit { pid, code });
        });
    }

    fn on_exit(&mut self, exit: Exit) {
        self.procs.mark_exited(exit.pid);
        self.bus.publish(
            Event::new(EventKind::ProcessExited)
                .with_pid(exit.pid)
                .with_exit_code(exit.code),
        );
        self.cleanup();
    }

    async fn kill(&mut self) -> Result<(), SupervisorError> {
        self.broadcast_sync(Broadcast::kill()).await?;
        self.procs.mark_all_exited();
        self.cleanup();
        Ok(())
    }

    /// Tears down the keep-alive timer and records once nothing is live.
    fn cleanup(&mut self) {
        if self.procs.any_live() {
            return;
        }
        if self.keep_alive.cancel() {
            self.bus.publish(Event::new(EventKind::KeepAliveStopped));
        }
        self.procs.clear();
    }

    /// Delivers `msg` and waits for the result, bounded by `broadcast_timeout`.
    async fn broadcast_sync(&self, msg: Broadcast) -> Result<(), SupervisorError> {
        let delivery = self.broadcaster.deliver(msg);
        let res = match self.cfg.broadcast_bound() {
            Some(bound) => match time::timeout(bound, delivery).await {
                Ok(res) => res,
                Err(_elapsed) => Err(SupervisorError::Timeout {
                    signal: msg.signal.name(),
                    timeout: bound,
                }),
            },
            None => delivery.await,
        };

        let ev = match &res {
            Ok(()) => Event::new(EventKind::BroadcastSent),
            Err(e) => Event::new(EventKind::BroadcastFailed).with_reason(e.to_string()),
        };
        self.bus
            .publish(ev.with_signal(msg.signal.name(), msg.wparam));
        res
    }
}

async fn write_script(path: &Path, script: String) -> Result<(), SupervisorError> {
    tokio::fs::write(path, script)
        .await
        .map_err(|e| SupervisorError::Script {
            path: path.to_path_buf(),
            error: e.to_string(),
        })
}
