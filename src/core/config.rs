//! # Global runtime configuration.
//!
//! Provides [`Config`] centralized settings for the supervisor runtime.
//!
//! ## Sentinel values
//! - `broadcast_timeout = 0s` → synchronous broadcasts wait without bound
//! - `bus_capacity` / `command_capacity` below 1 are clamped to 1

use std::path::PathBuf;
use std::time::Duration;

use crate::error::SupervisorError;

/// Primary install location of the interpreter.
pub const SYSTEM_INTERPRETER: &str = r"C:\Program Files\AutoHotkey\v2\AutoHotkey64.exe";

/// Per-user install location, relative to `%LOCALAPPDATA%`.
pub const USER_INTERPRETER: &str = r"Programs\AutoHotkey\v2\AutoHotkey64.exe";

/// Missed keep-alive intervals after which a pinged script exits on its own.
pub const WATCHDOG_INTERVALS: u32 = 5;

/// File name of the compiled script inside the temp directory.
pub const SCRIPT_FILE_NAME: &str = "default-ahk-manager.ahk";

/// Global configuration for the supervisor runtime.
///
/// ## Field semantics
/// - `interpreter_candidates`: checked in order; the first existing file wins
/// - `script_path`: where `run` writes the compiled script (overwritten each time)
/// - `keep_alive_interval`: period of the keep-alive broadcast while a process is live
/// - `broadcast_timeout`: bound on synchronous broadcasts (`0s` = unbounded)
/// - `single_instance`: reject `run` while a process is live
/// - `bus_capacity`: event bus ring buffer size
/// - `command_capacity`: depth of the supervisor's command queue
#[derive(Clone, Debug)]
pub struct Config {
    /// Interpreter locations, in priority order.
    pub interpreter_candidates: Vec<PathBuf>,

    /// Path of the compiled script.
    pub script_path: PathBuf,

    /// Interval between keep-alive broadcasts.
    pub keep_alive_interval: Duration,

    /// Maximum wait for a synchronous broadcast (kill/restart).
    ///
    /// On expiry the command fails with `SupervisorError::Timeout` and process
    /// records are left as they were.
    pub broadcast_timeout: Duration,

    /// When `true`, `run` fails with `SupervisorError::AlreadyRunning` while
    /// any recorded process is live. When `false`, overlapping processes are
    /// spawned and all of them are tracked.
    pub single_instance: bool,

    /// Capacity of the event bus broadcast channel ring buffer.
    pub bus_capacity: usize,

    /// Capacity of the supervisor command queue.
    pub command_capacity: usize,
}

impl Config {
    /// Returns the broadcast bound as an `Option`.
    ///
    /// - `None` → wait indefinitely
    /// - `Some(d)` → fail with `Timeout` after `d`
    #[inline]
    pub fn broadcast_bound(&self) -> Option<Duration> {
        if self.broadcast_timeout == Duration::ZERO {
            None
        } else {
            Some(self.broadcast_timeout)
        }
    }

    /// Watchdog written into each compiled script: [`WATCHDOG_INTERVALS`]
    /// keep-alive periods, so it always outlasts the ping interval.
    #[inline]
    pub fn watchdog(&self) -> Duration {
        self.keep_alive_interval
            .max(Duration::from_millis(1))
            .saturating_mul(WATCHDOG_INTERVALS)
    }

    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    #[inline]
    pub fn command_capacity_clamped(&self) -> usize {
        self.command_capacity.max(1)
    }

    /// Returns the first candidate that exists as a file.
    pub fn resolve_interpreter(&self) -> Result<PathBuf, SupervisorError> {
        self.interpreter_candidates
            .iter()
            .find(|p| p.is_file())
            .cloned()
            .ok_or_else(|| SupervisorError::NotFound {
                candidates: self.interpreter_candidates.clone(),
            })
    }

    /// The two well-known install locations (the per-user one only when
    /// `LOCALAPPDATA` is set).
    pub fn default_candidates() -> Vec<PathBuf> {
        let mut out = vec![PathBuf::from(SYSTEM_INTERPRETER)];
        if let Some(local) = std::env::var_os("LOCALAPPDATA") {
            out.push(PathBuf::from(local).join(USER_INTERPRETER));
        }
        out
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `interpreter_candidates = Config::default_candidates()`
    /// - `script_path = <temp dir>/default-ahk-manager.ahk`
    /// - `keep_alive_interval = 2s`
    /// - `broadcast_timeout = 5s`
    /// - `single_instance = false`
    /// - `bus_capacity = 1024`
    /// - `command_capacity = 64`
    fn default() -> Self {
        Self {
            interpreter_candidates: Self::default_candidates(),
            script_path: std::env::temp_dir().join(SCRIPT_FILE_NAME),
            keep_alive_interval: Duration::from_millis(2000),
            broadcast_timeout: Duration::from_secs(5),
            single_instance: false,
            bus_capacity: 1024,
            command_capacity: 64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_candidates_is_not_found() {
        let cfg = Config {
            interpreter_candidates: vec![PathBuf::from("/definitely/not/here.exe")],
            ..Config::default()
        };
        let err = cfg.resolve_interpreter().unwrap_err();
        assert_eq!(err.as_label(), "supervisor_not_found");
    }

    #[test]
    fn test_first_existing_candidate_wins() {
        let dir = tempfile::tempdir().unwrap();
        let second = dir.path().join("second.exe");
        let third = dir.path().join("third.exe");
        std::fs::write(&second, b"").unwrap();
        std::fs::write(&third, b"").unwrap();

        let cfg = Config {
            interpreter_candidates: vec![dir.path().join("first.exe"), second.clone(), third],
            ..Config::default()
        };
        assert_eq!(cfg.resolve_interpreter().unwrap(), second);
    }

    #[test]
    fn test_watchdog_scales_with_keep_alive() {
        assert_eq!(Config::default().watchdog(), Duration::from_secs(10));

        let cfg = Config {
            keep_alive_interval: Duration::from_secs(30),
            ..Config::default()
        };
        assert_eq!(cfg.watchdog(), Duration::from_secs(150));
        assert!(cfg.watchdog() > cfg.keep_alive_interval);
    }

    #[test]
    fn test_zero_timeout_is_unbounded() {
        let cfg = Config {
            broadcast_timeout: Duration::ZERO,
            ..Config::default()
        };
        assert_eq!(cfg.broadcast_bound(), None);
        assert_eq!(Config::default().broadcast_bound(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_directory_is_not_an_interpreter() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            interpreter_candidates: vec![dir.path().to_path_buf()],
            ..Config::default()
        };
        assert!(cfg.resolve_interpreter().is_err());
    }
}
