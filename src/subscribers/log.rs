//! # LogWriter: tracing-backed event logger
//!
//! Renders every [`Event`] as one `tracing` record under the `keyvisor` target.
//!
//! ## Example output
//! ```text
//! INFO keyvisor: [spawned] pid=4242
//! INFO keyvisor: [keep-alive-started]
//! INFO keyvisor: [broadcast] signal=KillAhk wparam=9
//! INFO keyvisor: [exited] pid=4242 code=Some(0)
//! WARN keyvisor: [rule-rejected] rule=hotkey keys="a" err="hotkey \"a\" already exists"
//! ```

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let reason = e.reason.as_deref().unwrap_or("");
        let keys = e.keys.as_deref().unwrap_or("");
        let rule = e.rule.map(|r| r.as_str()).unwrap_or("");
        let pid = e.pid.unwrap_or_default();

        match e.kind {
            EventKind::RuleUpserted => {
                debug!(target: "keyvisor", "[rule-upserted] rule={rule} keys={keys:?}");
            }
            EventKind::RuleRemoved => {
                debug!(target: "keyvisor", "[rule-removed] rule={rule} keys={keys:?}");
            }
            EventKind::RuleRejected => {
                warn!(target: "keyvisor", "[rule-rejected] rule={rule} keys={keys:?} err={reason:?}");
            }
            EventKind::ScriptCompiled => {
                debug!(target: "keyvisor", "[compiled] path={reason}");
            }
            EventKind::ProcessSpawned => {
                info!(target: "keyvisor", "[spawned] pid={pid}");
            }
            EventKind::SpawnFailed => {
                warn!(target: "keyvisor", "[spawn-failed] err={reason:?}");
            }
            EventKind::ProcessExited => {
                info!(target: "keyvisor", "[exited] pid={pid} code={:?}", e.exit_code);
            }
            EventKind::KeepAliveStarted => {
                info!(target: "keyvisor", "[keep-alive-started]");
            }
            EventKind::KeepAliveStopped => {
                info!(target: "keyvisor", "[keep-alive-stopped]");
            }
            EventKind::BroadcastSent => {
                let signal = e.signal.unwrap_or("unknown");
                let wparam = e.wparam.unwrap_or_default();
                // Keep-alive ticks every couple of seconds.
                if wparam == 0 {
                    debug!(target: "keyvisor", "[broadcast] signal={signal} wparam={wparam}");
                } else {
                    info!(target: "keyvisor", "[broadcast] signal={signal} wparam={wparam}");
                }
            }
            EventKind::BroadcastFailed => {
                warn!(
                    target: "keyvisor",
                    "[broadcast-failed] signal={} err={reason:?}",
                    e.signal.unwrap_or("unknown")
                );
            }
            EventKind::SubscriberOverflow => {
                warn!(
                    target: "keyvisor",
                    "[subscriber-overflow] subscriber={} reason={reason}",
                    e.subscriber.unwrap_or("unknown")
                );
            }
            EventKind::SubscriberPanicked => {
                warn!(
                    target: "keyvisor",
                    "[subscriber-panicked] subscriber={} info={reason}",
                    e.subscriber.unwrap_or("unknown")
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
