//! # Command gateway.
//!
//! The external request/response surface. Every operation maps to one
//! supervisor call and comes back as a [`CommandEnvelope`]; no error escapes.
//!
//! ```text
//!  Request ──► Gateway::handle ──► Supervisor (loop) ──► Result
//!                                                          │
//!         CommandEnvelope { success, message } ◄───────────┘
//! ```
//!
//! ## Rules
//! - reads (`get_hotkeys`, `get_hotstrings`, `get_status`) have no side effects
//! - rule input is validated into typed rules here; schema mismatch is a failed envelope
//! - without a supervisor (interpreter not found) every command fails as unavailable
//! - `get_status` answers `"-1"` when nothing is running

mod envelope;
mod request;
mod server;

pub use envelope::CommandEnvelope;
pub use request::Request;
pub use server::serve;

use std::future::Future;

use serde::Serialize;
use tracing::debug;

use crate::core::Supervisor;
use crate::rules::{HotkeyRule, HotstringRule, RuleKind};
use request::rule_text;

/// `get_status` answer when no interpreter is live.
pub const NO_PROCESS: &str = "-1";

/// Maps commands onto a supervisor, or refuses all of them if there is none.
#[derive(Clone)]
pub struct Gateway {
    sup: Result<Supervisor, String>,
}

impl Gateway {
    pub fn new(sup: Supervisor) -> Self {
        Self { sup: Ok(sup) }
    }

    /// Builds a gateway from the outcome of supervisor construction.
    ///
    /// A construction error is kept as text and reported by every command.
    pub fn from_result<E: std::fmt::Display>(sup: Result<Supervisor, E>) -> Self {
        Self {
            sup: sup.map_err(|e| e.to_string()),
        }
    }

    pub fn supervisor(&self) -> Option<&Supervisor> {
        self.sup.as_ref().ok()
    }

    /// Runs `f` against the supervisor, or fails as unavailable without one.
    async fn with_sup<'a, F, Fut>(&'a self, f: F) -> CommandEnvelope
    where
        F: FnOnce(&'a Supervisor) -> Fut,
        Fut: Future<Output = CommandEnvelope>,
    {
        match &self.sup {
            Ok(sup) => f(sup).await,
            Err(e) => CommandEnvelope::fail(format!("interpreter unavailable: {e}")),
        }
    }

    /// Dispatches one wire request.
    pub async fn handle(&self, req: Request) -> CommandEnvelope {
        debug!(target: "keyvisor::gateway", command = req.name(), "request");
        match req {
            Request::GetHotkeys => self.list_hotkeys().await,
            Request::GetHotstrings => self.list_hotstrings().await,
            Request::AddHotkey { rule, overwrite } => {
                self.add_hotkey(&rule_text(rule), overwrite).await
            }
            Request::AddHotstring { rule, overwrite } => {
                self.add_hotstring(&rule_text(rule), overwrite).await
            }
            Request::EditHotkey { rule } => self.edit_hotkey(&rule_text(rule)).await,
            Request::EditHotstring { rule } => self.edit_hotstring(&rule_text(rule)).await,
            Request::DeleteHotkey { keys } => self.delete(RuleKind::Hotkey, &keys).await,
            Request::DeleteHotstring { keys } => self.delete(RuleKind::Hotstring, &keys).await,
            Request::RunDefault => self.run().await,
            Request::KillAll => self.kill().await,
            Request::Restart => self.restart().await,
            Request::GetStatus => self.status().await,
        }
    }

    pub async fn list_hotkeys(&self) -> CommandEnvelope {
        self.with_sup(|sup| async move {
            match sup.list_hotkeys().await {
                Ok(rules) => to_json(&rules),
                Err(e) => CommandEnvelope::fail(e.to_string()),
            }
        })
        .await
    }

    pub async fn list_hotstrings(&self) -> CommandEnvelope {
        self.with_sup(|sup| async move {
            match sup.list_hotstrings().await {
                Ok(rules) => to_json(&rules),
                Err(e) => CommandEnvelope::fail(e.to_string()),
            }
        })
        .await
    }

    /// Parses `json` as a hotkey rule and stores it.
    pub async fn add_hotkey(&self, json: &str, overwrite: bool) -> CommandEnvelope {
        self.with_sup(|sup| async move {
            let rule = match HotkeyRule::from_json(json) {
                Ok(rule) => rule,
                Err(e) => return CommandEnvelope::fail(e.to_string()),
            };
            let keys = rule.keys().to_string();
            match sup.upsert_hotkey(rule, overwrite).await {
                Ok(()) => saved(RuleKind::Hotkey, &keys),
                Err(e) => CommandEnvelope::fail(e.to_string()),
            }
        })
        .await
    }

    /// Parses `json` as a hotstring rule and stores it.
    pub async fn add_hotstring(&self, json: &str, overwrite: bool) -> CommandEnvelope {
        self.with_sup(|sup| async move {
            let rule = match HotstringRule::from_json(json) {
                Ok(rule) => rule,
                Err(e) => return CommandEnvelope::fail(e.to_string()),
            };
            let keys = rule.keys().to_string();
            match sup.upsert_hotstring(rule, overwrite).await {
                Ok(()) => saved(RuleKind::Hotstring, &keys),
                Err(e) => CommandEnvelope::fail(e.to_string()),
            }
        })
        .await
    }

    pub async fn edit_hotkey(&self, json: &str) -> CommandEnvelope {
        self.with_sup(|sup| async move {
            let rule = match HotkeyRule::from_json(json) {
                Ok(rule) => rule,
                Err(e) => return CommandEnvelope::fail(e.to_string()),
            };
            let keys = rule.keys().to_string();
            match sup.replace_hotkey(rule).await {
                Ok(()) => saved(RuleKind::Hotkey, &keys),
                Err(e) => CommandEnvelope::fail(e.to_string()),
            }
        })
        .await
    }

    pub async fn edit_hotstring(&self, json: &str) -> CommandEnvelope {
        self.with_sup(|sup| async move {
            let rule = match HotstringRule::from_json(json) {
                Ok(rule) => rule,
                Err(e) => return CommandEnvelope::fail(e.to_string()),
            };
            let keys = rule.keys().to_string();
            match sup.replace_hotstring(rule).await {
                Ok(()) => saved(RuleKind::Hotstring, &keys),
                Err(e) => CommandEnvelope::fail(e.to_string()),
            }
        })
        .await
    }

    /// Removes a rule. Removing keys that are not bound still succeeds.
    pub async fn delete(&self, kind: RuleKind, keys: &str) -> CommandEnvelope {
        self.with_sup(|sup| async move {
            match sup.remove(kind, keys).await {
                Ok(true) => CommandEnvelope::ok(format!("{kind} {keys:?} removed")),
                Ok(false) => CommandEnvelope::ok(format!("no {kind} bound to {keys:?}")),
                Err(e) => CommandEnvelope::fail(e.to_string()),
            }
        })
        .await
    }

    pub async fn run(&self) -> CommandEnvelope {
        self.with_sup(|sup| async move {
            match sup.run().await {
                Ok(pid) => CommandEnvelope::ok(pid.to_string()),
                Err(e) => CommandEnvelope::fail(e.to_string()),
            }
        })
        .await
    }

    pub async fn kill(&self) -> CommandEnvelope {
        self.with_sup(|sup| async move {
            match sup.kill().await {
                Ok(()) => CommandEnvelope::ok("kill broadcast delivered"),
                Err(e) => CommandEnvelope::fail(e.to_string()),
            }
        })
        .await
    }

    pub async fn restart(&self) -> CommandEnvelope {
        self.with_sup(|sup| async move {
            match sup.restart().await {
                Ok(()) => CommandEnvelope::ok("restart broadcast delivered"),
                Err(e) => CommandEnvelope::fail(e.to_string()),
            }
        })
        .await
    }

    pub async fn status(&self) -> CommandEnvelope {
        self.with_sup(|sup| async move {
            match sup.status().await {
                Ok(Some(pid)) => CommandEnvelope::ok(pid.to_string()),
                Ok(None) => CommandEnvelope::ok(NO_PROCESS),
                Err(e) => CommandEnvelope::fail(e.to_string()),
            }
        })
        .await
    }
}

fn saved(kind: RuleKind, keys: &str) -> CommandEnvelope {
    CommandEnvelope::ok(format!("{kind} {keys:?} saved"))
}

fn to_json<T: Serialize>(value: &T) -> CommandEnvelope {
    match serde_json::to_string(value) {
        Ok(json) => CommandEnvelope::ok(json),
        Err(e) => CommandEnvelope::fail(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Config;
    use crate::core::broadcast::Broadcast;
    use crate::core::testing::{FakeBroadcaster, FakeLauncher, Mode};
    use crate::error::SupervisorError;
    use serde_json::{Value, json};
    use std::path::PathBuf;
    use std::sync::Arc;

    struct Fixture {
        gw: Gateway,
        launcher: Arc<FakeLauncher>,
        broadcaster: Arc<FakeBroadcaster>,
        _dir: tempfile::TempDir,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            script_path: dir.path().join("script.ahk"),
            ..Config::default()
        };
        let launcher = Arc::new(FakeLauncher::default());
        let broadcaster = Arc::new(FakeBroadcaster::new());
        let sup = Supervisor::builder(cfg)
            .with_launcher(launcher.clone())
            .with_broadcaster(broadcaster.clone())
            .build()
            .unwrap();
        Fixture {
            gw: Gateway::new(sup),
            launcher,
            broadcaster,
            _dir: dir,
        }
    }

    fn parse(env: &CommandEnvelope) -> Value {
        assert!(env.success, "{}", env.message);
        serde_json::from_str(&env.message).unwrap()
    }

    #[tokio::test]
    async fn test_hotstring_add_list_remove_list() {
        let f = fixture();
        let rule = r#"{"keys":"btw","action":"by the way","options":["*"]}"#;

        let env = f.gw.add_hotstring(rule, false).await;
        assert!(env.success, "{}", env.message);

        let listed = parse(&f.gw.list_hotstrings().await);
        assert_eq!(
            listed,
            json!([{"keys": "btw", "action": "by the way", "options": ["*"]}])
        );

        assert!(f.gw.delete(RuleKind::Hotstring, "btw").await.success);
        assert_eq!(parse(&f.gw.list_hotstrings().await), json!([]));
    }

    #[tokio::test]
    async fn test_duplicate_without_overwrite_fails_and_keeps_prior() {
        let f = fixture();
        f.gw.add_hotstring(r#"{"keys":"btw","action":"by the way"}"#, false)
            .await;

        let env = f
            .gw
            .add_hotstring(r#"{"keys":"btw","action":"changed"}"#, false)
            .await;
        assert!(!env.success);
        assert!(env.message.contains("already exists"));

        let listed = parse(&f.gw.list_hotstrings().await);
        assert_eq!(listed[0]["action"], "by the way");

        let env = f
            .gw
            .add_hotstring(r#"{"keys":"btw","action":"changed"}"#, true)
            .await;
        assert!(env.success);
        assert_eq!(parse(&f.gw.list_hotstrings().await)[0]["action"], "changed");
    }

    #[tokio::test]
    async fn test_malformed_rule_is_failed_envelope() {
        let f = fixture();
        let env = f.gw.add_hotkey(r#"{"keys":"h","action":"x"}"#, false).await;
        assert!(!env.success);
        assert!(env.message.starts_with("malformed hotkey"));

        let env = f.gw.add_hotstring("not json", false).await;
        assert!(!env.success);
    }

    #[tokio::test]
    async fn test_edit_requires_existing_rule() {
        let f = fixture();
        let rule = r#"{"keys":"h","action":"Send(\"hi\")","modifiers":["","^",""]}"#;

        let env = f.gw.edit_hotkey(rule).await;
        assert!(!env.success);
        assert!(env.message.starts_with("no hotkey bound to"));

        assert!(f.gw.add_hotkey(rule, false).await.success);
        assert!(f.gw.edit_hotkey(rule).await.success);
    }

    #[tokio::test]
    async fn test_status_run_kill() {
        let f = fixture();
        assert_eq!(f.gw.status().await, CommandEnvelope::ok(NO_PROCESS));

        let env = f.gw.run().await;
        assert!(env.success);
        let pid: u32 = env.message.parse().unwrap();
        assert_eq!(f.gw.status().await, CommandEnvelope::ok(pid.to_string()));
        assert_eq!(f.launcher.scripts.lock().unwrap().len(), 1);

        f.broadcaster.set(Mode::Fail);
        assert!(!f.gw.kill().await.success);
        assert_eq!(f.gw.status().await, CommandEnvelope::ok(pid.to_string()));

        f.broadcaster.set(Mode::Deliver);
        assert!(f.gw.kill().await.success);
        assert_eq!(f.gw.status().await, CommandEnvelope::ok(NO_PROCESS));
    }

    #[tokio::test]
    async fn test_handle_dispatches_wire_requests() {
        let f = fixture();
        let req: Request = serde_json::from_value(json!({
            "command": "add_hotkey",
            "rule": {"keys": "h", "action": "Send(\"hi\")", "modifiers": ["", "^", ""]},
        }))
        .unwrap();
        assert!(f.gw.handle(req).await.success);

        let listed = parse(&f.gw.handle(Request::GetHotkeys).await);
        assert_eq!(listed[0]["modifiers"], json!(["", "^", ""]));

        let env = f
            .gw
            .handle(Request::DeleteHotkey { keys: "h".into() })
            .await;
        assert_eq!(env, CommandEnvelope::ok(r#"hotkey "h" removed"#));
    }

    #[tokio::test]
    async fn test_handle_restart_and_edit_hotstring() {
        let f = fixture();

        let env = f.gw.handle(Request::Restart).await;
        assert!(env.success, "{}", env.message);

        assert!(f.gw.handle(Request::RunDefault).await.success);
        let env = f.gw.handle(Request::Restart).await;
        assert_eq!(env, CommandEnvelope::ok("restart broadcast delivered"));
        assert_eq!(
            f.broadcaster.sent().iter().filter(|b| **b == Broadcast::restart()).count(),
            2
        );

        let edit = Request::EditHotstring {
            rule: json!({"keys": "btw", "action": "by the way"}),
        };
        let env = f.gw.handle(edit.clone()).await;
        assert!(!env.success);
        assert_eq!(env.message, r#"no hotstring bound to "btw""#);

        let add = Request::AddHotstring {
            rule: json!({"keys": "btw", "action": "by the way"}),
            overwrite: false,
        };
        assert!(f.gw.handle(add).await.success);

        let edit = Request::EditHotstring {
            rule: json!({"keys": "btw", "action": "between", "options": ["C"]}),
        };
        assert_eq!(
            f.gw.handle(edit).await,
            CommandEnvelope::ok(r#"hotstring "btw" saved"#)
        );
        assert_eq!(
            parse(&f.gw.handle(Request::GetHotstrings).await),
            json!([{"keys": "btw", "action": "between", "options": ["C"]}])
        );
    }

    #[tokio::test]
    async fn test_unavailable_gateway_refuses_everything() {
        let gw = Gateway::from_result(Err::<Supervisor, _>(SupervisorError::NotFound {
            candidates: vec![PathBuf::from("AutoHotkey64.exe")],
        }));
        assert!(gw.supervisor().is_none());

        for req in [Request::GetStatus, Request::GetHotkeys, Request::RunDefault] {
            let env = gw.handle(req).await;
            assert!(!env.success);
            assert!(env.message.starts_with("interpreter unavailable"));
        }
    }
}
