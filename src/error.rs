//! Error types used by the rule registry and the interpreter supervisor.
//!
//! This module defines the error enums:
//!
//! - [`RuleError`]: errors raised while parsing or storing rules.
//! - [`SupervisorError`]: errors raised while driving the interpreter process.
//! - [`Error`]: either of the above, for calls that can fail both ways.
//!
//! All of them provide `as_label` (stable snake_case, for logs) and their
//! `Display` text is what the gateway puts in a failed envelope.

use std::fmt::Display;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::rules::RuleKind;

/// # Errors produced by the rule registry.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// A rule already exists at these keys and overwrite was not requested.
    #[error("{kind} {keys:?} already exists")]
    Conflict {
        /// Keyspace of the rule.
        kind: RuleKind,
        /// Keys of the existing rule.
        keys: String,
    },

    /// An edit targeted keys with no rule bound.
    #[error("no {kind} bound to {keys:?}")]
    Missing {
        /// Keyspace of the rule.
        kind: RuleKind,
        /// Keys that were looked up.
        keys: String,
    },

    /// Input did not match the rule schema.
    #[error("malformed {kind}: {reason}")]
    Serialization {
        /// Keyspace of the rule.
        kind: RuleKind,
        /// Parser or validation message.
        reason: String,
    },
}

impl RuleError {
    pub(crate) fn serialization(kind: RuleKind, reason: impl Display) -> Self {
        RuleError::Serialization {
            kind,
            reason: reason.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use keyvisor::{RuleError, RuleKind};
    ///
    /// let err = RuleError::Conflict { kind: RuleKind::Hotkey, keys: "a".into() };
    /// assert_eq!(err.as_label(), "rule_conflict");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            RuleError::Conflict { .. } => "rule_conflict",
            RuleError::Missing { .. } => "rule_missing",
            RuleError::Serialization { .. } => "rule_serialization",
        }
    }
}

/// # Errors produced by the interpreter supervisor.
///
/// Only [`SupervisorError::NotFound`] is raised at construction; every other
/// variant comes back from a single command and leaves the supervisor usable.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// None of the candidate interpreter locations exists.
    #[error("interpreter executable not found (looked in {candidates:?})")]
    NotFound {
        /// Paths that were checked, in order.
        candidates: Vec<PathBuf>,
    },

    /// Launching the interpreter failed.
    #[error("failed to start interpreter: {error}")]
    Spawn {
        /// The underlying error message.
        error: String,
    },

    /// Delivering a broadcast failed.
    #[error("failed to deliver {signal}: {error}")]
    Broadcast {
        /// Registered message name.
        signal: &'static str,
        /// The underlying error message.
        error: String,
    },

    /// A synchronous broadcast did not complete within its bound.
    #[error("{signal} not delivered within {timeout:?}")]
    Timeout {
        /// Registered message name.
        signal: &'static str,
        /// The configured bound.
        timeout: Duration,
    },

    /// Writing the compiled script failed.
    #[error("failed to write script {path:?}: {error}")]
    Script {
        /// Target script path.
        path: PathBuf,
        /// The underlying error message.
        error: String,
    },

    /// `run` was rejected because an interpreter is already live.
    #[error("interpreter already running (pid {pid})")]
    AlreadyRunning {
        /// The live process.
        pid: u32,
    },

    /// The supervisor loop has stopped.
    #[error("supervisor is not running")]
    Closed,
}

impl SupervisorError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use keyvisor::SupervisorError;
    /// use std::time::Duration;
    ///
    /// let err = SupervisorError::Timeout { signal: "KillAhk", timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "supervisor_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SupervisorError::NotFound { .. } => "supervisor_not_found",
            SupervisorError::Spawn { .. } => "supervisor_spawn",
            SupervisorError::Broadcast { .. } => "supervisor_broadcast",
            SupervisorError::Timeout { .. } => "supervisor_timeout",
            SupervisorError::Script { .. } => "supervisor_script",
            SupervisorError::AlreadyRunning { .. } => "supervisor_already_running",
            SupervisorError::Closed => "supervisor_closed",
        }
    }
}

/// Either a rule was refused or the supervisor could not take the request.
///
/// Returned by the supervisor's rule-mutating commands, which can fail both ways.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Rule(#[from] RuleError),
    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
}

impl Error {
    /// Returns the label of the wrapped error.
    pub fn as_label(&self) -> &'static str {
        match self {
            Error::Rule(e) => e.as_label(),
            Error::Supervisor(e) => e.as_label(),
        }
    }
}
