//! # Interpreter process launching.
//!
//! A [`Launcher`] starts the interpreter on a script and hands back the pid
//! together with a future that resolves when the process exits. The
//! supervisor turns that future into an exit message on its own queue; it
//! never touches the child from another task.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::SupervisorError;

/// Resolves to the exit code (`None` when terminated by a signal or the wait failed).
pub type BoxExitFuture = Pin<Box<dyn Future<Output = Option<i32>> + Send + 'static>>;

/// A freshly started interpreter.
pub struct Spawned {
    pub pid: u32,
    pub exit: BoxExitFuture,
}

/// Starts interpreter processes.
#[async_trait]
pub trait Launcher: Send + Sync + 'static {
    async fn launch(&self, script: &Path) -> Result<Spawned, SupervisorError>;
}

/// Runs `<interpreter> <script>` and forwards its stdout/stderr to the log.
#[derive(Debug, Clone)]
pub struct InterpreterLauncher {
    interpreter: PathBuf,
}

impl InterpreterLauncher {
    pub fn new(interpreter: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
        }
    }

    pub fn interpreter(&self) -> &Path {
        &self.interpreter
    }
}

#[async_trait]
impl Launcher for InterpreterLauncher {
    async fn launch(&self, script: &Path) -> Result<Spawned, SupervisorError> {
        let mut child = Command::new(&self.interpreter)
            .arg(script)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SupervisorError::Spawn {
                error: e.to_string(),
            })?;

        let Some(pid) = child.id() else {
            return Err(SupervisorError::Spawn {
                error: "process exited before reporting a pid".into(),
            });
        };

        if let Some(out) = child.stdout.take() {
            tokio::spawn(forward_lines(pid, out, false));
        }
        if let Some(err) = child.stderr.take() {
            tokio::spawn(forward_lines(pid, err, true));
        }

        let exit = Box::pin(async move {
            match child.wait().await {
                Ok(status) => status.code(),
                Err(e) => {
                    warn!(target: "keyvisor", pid, "wait on interpreter failed: {e}");
                    None
                }
            }
        });
        Ok(Spawned { pid, exit })
    }
}

async fn forward_lines<R: AsyncRead + Unpin>(pid: u32, stream: R, is_stderr: bool) {
    let mut lines = BufReader::new(stream).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if is_stderr {
            warn!(target: "keyvisor::interpreter", pid, "{line}");
        } else {
            debug!(target: "keyvisor::interpreter", pid, "{line}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_interpreter_is_spawn_error() {
        let launcher = InterpreterLauncher::new("/nonexistent/keyvisor-interpreter");
        let err = match launcher.launch(Path::new("script.ahk")).await {
            Ok(_) => panic!("launch should fail"),
            Err(e) => e,
        };
        assert_eq!(err.as_label(), "supervisor_spawn");
    }
}
