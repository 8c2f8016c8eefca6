//! Runtime core: rule storage, script compilation and interpreter lifecycle.
//!
//! The public entry point is [`Supervisor`], built through [`SupervisorBuilder`].
//!
//! Internal modules:
//! - [`registry`]: the two rule keyspaces, in insertion order;
//! - [`compiler`]: renders the registry into an interpreter script;
//! - [`supervisor`]: the loop owning registry, process table and keep-alive;
//! - [`alive`]: pid liveness records;
//! - [`keepalive`]: repeating fire-and-forget keep-alive broadcast;
//! - [`broadcast`]: registered-message signals and their delivery;
//! - [`launcher`]: starting interpreter processes;
//! - [`shutdown`]: cross-platform shutdown signal handling.

mod alive;
mod builder;
mod config;
mod keepalive;
mod registry;
mod supervisor;

pub mod broadcast;
pub mod compiler;
pub mod launcher;
pub mod shutdown;

#[cfg(test)]
pub(crate) mod testing;

pub use builder::SupervisorBuilder;
pub use config::{Config, SCRIPT_FILE_NAME};
pub use registry::RuleRegistry;
pub use supervisor::{Snapshot, Supervisor};
