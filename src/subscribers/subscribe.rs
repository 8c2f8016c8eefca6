//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for plugging custom event handlers into the
//! runtime. Each subscriber is driven by a dedicated worker loop fed by a bounded
//! queue that is owned by the [`SubscriberSet`](crate::subscribers::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow; they do **not** block the supervisor loop
//!   nor other subscribers.
//! - If a queue overflows, events for that subscriber are **dropped**.

use async_trait::async_trait;

use crate::events::Event;

/// Contract for event subscribers.
///
/// ## Example
/// ```rust
/// use async_trait::async_trait;
/// use keyvisor::{Event, EventKind, Subscribe};
///
/// struct Crashes;
///
/// #[async_trait]
/// impl Subscribe for Crashes {
///     async fn on_event(&self, ev: &Event) {
///         if ev.kind == EventKind::ProcessExited && ev.exit_code != Some(0) {
///             // raise an alert...
///         }
///     }
///     fn name(&self) -> &'static str { "crashes" }
/// }
/// ```
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
