//! FrameDeck - Command Interpretation for Interactive Database Consoles
//!
//! This is the entry point for the `framedeck` console. It reads commands
//! from stdin, one per line, and prints every frame stream change to stdout
//! as a JSON line. Logs go to stderr.

use anyhow::Context;
use clap::Parser;
use framedeck::commands::CommandHandler;
use framedeck::interpreter::{Interpreter, InterpreterStats};
use framedeck::services::{Database, HttpRemote, OfflineDatabase, RespDatabase};
use framedeck::settings::{parse_prefix, AppConfig, SharedSettings};
use framedeck::storage::{
    FileHistory, FrameEmitter, FrameEvent, FrameStream, HistoryStore, InMemoryFrameStream,
    InMemoryHistory,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Command-line options. Flags override the config file.
#[derive(Debug, Parser)]
#[command(
    name = "framedeck",
    version,
    about = "Interactive command interpreter for database consoles"
)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directive prefix character
    #[arg(short, long)]
    prefix: Option<String>,

    /// File to persist command history to
    #[arg(long)]
    history: Option<PathBuf>,

    /// Address (host:port) of a RESP database engine
    #[arg(short, long)]
    database: Option<String>,

    /// Timeout for remote fetches, in seconds
    #[arg(long)]
    fetch_timeout: Option<u64>,
}

impl Cli {
    fn into_config(self) -> anyhow::Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load(path)?,
            None => AppConfig::default(),
        };

        if let Some(prefix) = &self.prefix {
            config.settings.directive_prefix = parse_prefix(prefix)?;
        }
        if self.history.is_some() {
            config.history_file = self.history;
        }
        if self.database.is_some() {
            config.database = self.database;
        }
        if let Some(secs) = self.fetch_timeout {
            config.fetch_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Cli::parse().into_config()?;

    // Set up logging
    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let frames = Arc::new(InMemoryFrameStream::new());
    let renderer = tokio::spawn(render_frames(frames.subscribe(), std::io::stdout()));

    let history: Arc<dyn HistoryStore> = match &config.history_file {
        Some(path) => {
            let history = FileHistory::open(path)
                .with_context(|| format!("opening history file {}", path.display()))?;
            info!(path = %path.display(), "Persisting history");
            Arc::new(history)
        }
        None => Arc::new(InMemoryHistory::new()),
    };

    let database: Arc<dyn Database> = match &config.database {
        Some(addr) => {
            info!(engine = %addr, "Using RESP database engine");
            Arc::new(RespDatabase::new(addr.clone(), config.database_timeout))
        }
        None => {
            warn!("No database configured, queries will fail");
            Arc::new(OfflineDatabase)
        }
    };

    let handler = CommandHandler::new(
        FrameEmitter::new(Arc::clone(&frames) as Arc<dyn FrameStream>),
        database,
        Arc::new(HttpRemote::new(config.fetch_timeout)?),
    );
    let stats = Arc::new(InterpreterStats::new());
    let interpreter = Interpreter::new(
        Arc::new(SharedSettings::new(config.settings)),
        history,
        handler,
        Arc::clone(&stats),
    );

    info!(
        version = framedeck::VERSION,
        prefix = %config.settings.directive_prefix,
        "FrameDeck ready, reading commands from stdin"
    );

    let handle = interpreter.spawn();
    let submitter = handle.submitter();

    let input = async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            submitter.submit(line)?;
        }
        anyhow::Ok(())
    };

    tokio::select! {
        result = input => {
            result?;
            info!("End of input, draining queued commands");
            handle.finish().await;
        }
        _ = signal::ctrl_c() => {
            info!("Shutdown signal received, stopping interpreter...");
            handle.shutdown().await;
        }
    }

    // Closing the stream's last owner ends the renderer
    drop(frames);
    if let Err(e) = renderer.await {
        warn!(error = %e, "Renderer task failed");
    }

    info!(
        commands = stats.commands_received.load(Ordering::Relaxed),
        frames = stats.frames_emitted.load(Ordering::Relaxed),
        "Shutdown complete"
    );
    Ok(())
}

/// Writes every frame stream change as one JSON line to `out`.
///
/// Returns the writer once the stream is gone and every event is written.
async fn render_frames<W: Write>(mut events: mpsc::UnboundedReceiver<FrameEvent>, mut out: W) -> W {
    while let Some(event) = events.recv().await {
        let line = match event {
            FrameEvent::Appended(frame) => serde_json::to_string(&frame),
            FrameEvent::Cleared => serde_json::to_string(&serde_json::json!({ "cleared": true })),
        };

        let written = match line {
            Ok(line) => writeln!(out, "{}", line),
            Err(e) => {
                warn!(error = %e, "Failed to render frame");
                continue;
            }
        };
        if let Err(e) = written.and_then(|_| out.flush()) {
            warn!(error = %e, "Failed to write frame");
        }
    }
    out
}
