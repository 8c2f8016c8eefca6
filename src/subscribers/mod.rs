//! # Event subscribers for the keyvisor runtime.
//!
//! ```text
//!   Supervisor ── publish(Event) ──► Bus ──► listener ──► SubscriberSet
//!                                                          │
//!                                              ┌───────────┼──────────┐
//!                                              ▼           ▼          ▼
//!                                          LogWriter     Custom      ...
//! ```

mod subscribe;
mod subscriber_set;

#[cfg(feature = "logging")]
mod log;

pub use subscribe::Subscribe;
pub use subscriber_set::SubscriberSet;

#[cfg(feature = "logging")]
pub use log::LogWriter;
