//! # Out-of-band lifecycle signals to the interpreter.
//!
//! A [`Broadcast`] is a registered window message name plus two numeric
//! parameters, posted to every top-level window. The interpreter script's
//! prologue registers handlers for the same names.
//!
//! ```text
//! Signal::KeepAlive  "KeepAlive"  (0, 0)     reset the script's watchdog
//! Signal::Kill       "KillAhk"    (9, 0)     exit
//!                                 (30, 0)    reload
//! ```
//!
//! [`InterpreterBroadcaster`] posts the message by feeding a one-line script to
//! the interpreter on stdin (`AutoHotkey64.exe *`). Whether a caller waits for
//! delivery (synchronous) or not (fire-and-forget) is decided by the
//! supervisor, not here.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::SupervisorError;

/// `wParam` of a kill broadcast.
pub const KILL_CODE: u32 = 9;
/// `wParam` of a restart broadcast.
pub const RESTART_CODE: u32 = 30;
/// `HWND_BROADCAST`.
const BROADCAST_TARGET: &str = "0xFFFF";

/// Registered message names understood by the prologue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    KeepAlive,
    Kill,
}

impl Signal {
    pub fn name(self) -> &'static str {
        match self {
            Signal::KeepAlive => "KeepAlive",
            Signal::Kill => "KillAhk",
        }
    }
}

/// One message to post.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Broadcast {
    pub signal: Signal,
    pub wparam: u32,
    pub lparam: u32,
}

impl Broadcast {
    pub fn keep_alive() -> Self {
        Self {
            signal: Signal::KeepAlive,
            wparam: 0,
            lparam: 0,
        }
    }

    pub fn kill() -> Self {
        Self {
            signal: Signal::Kill,
            wparam: KILL_CODE,
            lparam: 0,
        }
    }

    pub fn restart() -> Self {
        Self {
            signal: Signal::Kill,
            wparam: RESTART_CODE,
            lparam: 0,
        }
    }

    /// The one-line interpreter script that posts this message.
    pub fn script(&self) -> String {
        format!(
            "PostMessage(DllCall(\"RegisterWindowMessage\", \"Str\", \"{}\"), {}, {}, , {BROADCAST_TARGET})",
            self.signal.name(),
            self.wparam,
            self.lparam,
        )
    }
}

/// Delivers a broadcast; completes once delivery is known to have succeeded or failed.
#[async_trait]
pub trait Broadcaster: Send + Sync + 'static {
    async fn deliver(&self, msg: Broadcast) -> Result<(), SupervisorError>;
}

/// Delivers broadcasts through a short-lived interpreter helper process.
#[derive(Debug, Clone)]
pub struct InterpreterBroadcaster {
    interpreter: PathBuf,
}

impl InterpreterBroadcaster {
    pub fn new(interpreter: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    fn failed(msg: Broadcast, error: impl ToString) -> SupervisorError {
        SupervisorError::Broadcast {
            signal: msg.signal.name(),
            error: error.to_string(),
        }
    }
}

#[async_trait]
impl Broadcaster for InterpreterBroadcaster {
    async fn deliver(&self, msg: Broadcast) -> Result<(), SupervisorError> {
        let mut child = Command::new(&self.interpreter)
            .arg("*")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            // A timed-out delivery drops this future; don't leave the helper behind.
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Self::failed(msg, e))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| Self::failed(msg, "helper stdin unavailable"))?;
        stdin
            .write_all(msg.script().as_bytes())
            .await
            .map_err(|e| Self::failed(msg, e))?;
        drop(stdin);

        let out = child
            .wait_with_output()
            .await
            .map_err(|e| Self::failed(msg, e))?;
        if out.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&out.stderr);
            Err(Self::failed(
                msg,
                format!("helper exited with {}: {}", out.status, stderr.trim()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kill_script() {
        assert_eq!(
            Broadcast::kill().script(),
            r#"PostMessage(DllCall("RegisterWindowMessage", "Str", "KillAhk"), 9, 0, , 0xFFFF)"#
        );
    }

    #[test]
    fn test_restart_and_keep_alive_params() {
        let r = Broadcast::restart();
        assert_eq!((r.signal, r.wparam), (Signal::Kill, RESTART_CODE));

        let k = Broadcast::keep_alive();
        assert_eq!(k.signal.name(), "KeepAlive");
        assert_eq!((k.wparam, k.lparam), (0, 0));
    }

    #[tokio::test]
    async fn test_missing_helper_is_broadcast_error() {
        let b = InterpreterBroadcaster::new("/nonexistent/keyvisor-interpreter");
        let err = b.deliver(Broadcast::kill()).await.unwrap_err();
        assert_eq!(err.as_label(), "supervisor_broadcast");
    }
}
