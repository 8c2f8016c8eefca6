use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::io::{self, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use keyvisor::{Config, Gateway, LogWriter, Subscribe, Supervisor, serve, wait_for_shutdown_signal};

/// Serves keyvisor gateway commands as JSON lines over stdin/stdout.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Interpreter executable (skips the well-known install locations)
    #[arg(long)]
    interpreter: Option<PathBuf>,

    /// Where the compiled script is written
    #[arg(long)]
    script_path: Option<PathBuf>,

    /// Keep-alive broadcast period in milliseconds
    #[arg(long, default_value_t = 2000)]
    keep_alive_ms: u64,

    /// Bound on kill/restart delivery in milliseconds (0 waits forever)
    #[arg(long, default_value_t = 5000)]
    broadcast_timeout_ms: u64,

    /// Refuse to run while an interpreter is already live
    #[arg(long)]
    single_instance: bool,
}

impl Cli {
    fn config(&self) -> Config {
        let mut cfg = Config {
            keep_alive_interval: Duration::from_millis(self.keep_alive_ms),
            broadcast_timeout: Duration::from_millis(self.broadcast_timeout_ms),
            single_instance: self.single_instance,
            ..Config::default()
        };
        if let Some(path) = &self.interpreter {
            cfg.interpreter_candidates = vec![path.clone()];
        }
        if let Some(path) = &self.script_path {
            cfg.script_path = path.clone();
        }
        cfg
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the protocol.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = cli.config();
    info!(script = %cfg.script_path.display(), "starting keyvisor");

    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let sup = Supervisor::builder(cfg).with_subscribers(subs).build();
    if let Err(e) = &sup {
        warn!("{e}; every command will fail until restarted");
    }
    let gateway = Gateway::from_result(sup);

    let stdin = BufReader::new(io::stdin());
    let stdout = io::stdout();
    tokio::select! {
        res = serve(&gateway, stdin, stdout) => res.context("gateway transport failed")?,
        sig = wait_for_shutdown_signal() => {
            let sig = sig.context("failed to install signal handlers")?;
            info!(signal = sig, "shutdown requested");
        }
    }

    if let Some(sup) = gateway.supervisor() {
        if sup.status().await?.is_some() {
            if let Err(e) = sup.kill().await {
                warn!(err = e.as_label(), "{e}");
            }
        }
        sup.shutdown();
    }
    info!("stopped");
    Ok(())
}
