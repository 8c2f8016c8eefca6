//! Scripted launcher and broadcaster for unit tests.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use tokio::sync::oneshot;

use crate::core::broadcast::{Broadcast, Broadcaster};
use crate::core::launcher::{Launcher, Spawned};
use crate::error::SupervisorError;

/// Hands out increasing pids; tests decide when each process exits.
#[derive(Default)]
pub(crate) struct FakeLauncher {
    next_pid: AtomicU32,
    pub fail: AtomicBool,
    exits: Mutex<HashMap<u32, oneshot::Sender<Option<i32>>>>,
    pub scripts: Mutex<Vec<String>>,
}

impl FakeLauncher {
    pub fn exit(&self, pid: u32, code: i32) {
        let tx = self.exits.lock().unwrap().remove(&pid).expect("unknown pid");
        tx.send(Some(code)).unwrap();
    }
}

#[async_trait]
impl Launcher for FakeLauncher {
    async fn launch(&self, script: &Path) -> Result<Spawned, SupervisorError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SupervisorError::Spawn {
                error: "no such file".into(),
            });
        }
        self.scripts
            .lock()
            .unwrap()
            .push(std::fs::read_to_string(script).unwrap());

        let pid = 100 + self.next_pid.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.exits.lock().unwrap().insert(pid, tx);
        Ok(Spawned {
            pid,
            exit: Box::pin(async move { rx.await.ok().flatten() }),
        })
    }
}

#[derive(Clone, Copy, PartialEq)]
pub(crate) enum Mode {
    Deliver,
    Fail,
    Hang,
}

pub(crate) struct FakeBroadcaster {
    mode: Mutex<Mode>,
    sent: Mutex<Vec<Broadcast>>,
}

impl FakeBroadcaster {
    pub fn new() -> Self {
        Self {
            mode: Mutex::new(Mode::Deliver),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn set(&self, mode: Mode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn sent(&self) -> Vec<Broadcast> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Broadcaster for FakeBroadcaster {
    async fn deliver(&self, msg: Broadcast) -> Result<(), SupervisorError> {
        let mode = *self.mode.lock().unwrap();
        match mode {
            Mode::Deliver => {
                self.sent.lock().unwrap().push(msg);
                Ok(())
            }
            Mode::Fail => Err(SupervisorError::Broadcast {
                signal: msg.signal.name(),
                error: "access denied".into(),
            }),
            Mode::Hang => {
                std::future::pending::<()>().await;
                Ok(())
            }
        }
    }
}
