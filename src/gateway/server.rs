//! JSON-lines transport for the gateway.
//!
//! One [`Request`] per input line, one [`CommandEnvelope`] per output line,
//! answered in order. Blank lines are skipped. A line that is not a valid
//! request still gets a failed envelope, so the reply stream stays in step
//! with the request stream.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, warn};

use super::{CommandEnvelope, Gateway, Request};

/// Serves requests from `reader` until EOF.
///
/// Returns early only on an I/O error of the underlying streams.
pub async fn serve<R, W>(gateway: &Gateway, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let env = match serde_json::from_str::<Request>(line) {
            Ok(req) => gateway.handle(req).await,
            Err(e) => {
                warn!(target: "keyvisor::gateway", "malformed request: {e}");
                CommandEnvelope::fail(format!("malformed request: {e}"))
            }
        };
        let mut out = serde_json::to_string(&env)?;
        out.push('\n');
        writer.write_all(out.as_bytes()).await?;
        writer.flush().await?;
    }
    debug!(target: "keyvisor::gateway", "input closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Config, Supervisor};
    use crate::core::testing::{FakeBroadcaster, FakeLauncher};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_serves_one_reply_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = Config {
            script_path: dir.path().join("script.ahk"),
            ..Config::default()
        };
        let sup = Supervisor::builder(cfg)
            .with_launcher(Arc::new(FakeLauncher::default()))
            .with_broadcaster(Arc::new(FakeBroadcaster::new()))
            .build()
            .unwrap();
        let gw = Gateway::new(sup);

        let input = concat!(
            r#"{"command":"add_hotstring","rule":"{\"keys\":\"btw\",\"action\":\"by the way\"}"}"#,
            "\n\n",
            "garbage\n",
            r#"{"command":"get_status"}"#,
            "\n",
        );
        let mut output = Vec::new();
        serve(&gw, input.as_bytes(), &mut output).await.unwrap();

        let replies: Vec<CommandEnvelope> = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(replies.len(), 3);
        assert_eq!(
            replies[0],
            CommandEnvelope::ok(r#"hotstring "btw" saved"#)
        );
        assert!(!replies[1].success);
        assert!(replies[1].message.starts_with("malformed request"));
        assert_eq!(replies[2], CommandEnvelope::ok("-1"));
    }
}
