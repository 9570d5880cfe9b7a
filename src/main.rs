use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;

use tandemd::{config::DaemonConfig, ipc, notify, storage::Storage, AppContext};

#[derive(Parser)]
#[command(
    name = "tandemd",
    about = "Tandem Host — always-on task-reminder daemon for linked partner accounts",
    version
)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// JSON-RPC WebSocket server port
    #[arg(long, env = "TANDEMD_PORT")]
    port: Option<u16>,

    /// Data directory for config and the SQLite database
    #[arg(long, env = "TANDEMD_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "TANDEMD_LOG")]
    log: Option<String>,

    /// Bind address for the WebSocket server (default: 127.0.0.1; use 0.0.0.0 for LAN access)
    #[arg(long, env = "TANDEMD_BIND")]
    bind_address: Option<String>,

    /// Write logs to this file path (rotated daily). Optional.
    #[arg(long, env = "TANDEMD_LOG_FILE")]
    log_file: Option<std::path::PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Start the daemon server (default when no subcommand given).
    ///
    /// Runs tandemd in the foreground.
    ///
    /// Examples:
    ///   tandemd serve
    ///   tandemd
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = DaemonConfig::new(args.port, args.data_dir, args.log, args.bind_address);
    let _log_guard = setup_logging(&config.log, args.log_file.as_deref(), &config.log_format);

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
    }
}

async fn serve(config: DaemonConfig) -> Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %config.data_dir.display(),
        "tandemd starting"
    );

    let storage = Storage::new_with_slow_query(
        &config.data_dir,
        config.observability.slow_query_threshold_ms,
    )
    .await?;

    let ctx = Arc::new(AppContext::new(config, storage));

    if ctx.config.reminder.enabled {
        tokio::spawn(notify::reminder::run_reminder_sweep(
            ctx.storage.clone(),
            ctx.broadcaster.clone(),
            ctx.config.reminder.poll_interval_secs,
        ));
    }

    ipc::run(ctx).await
}

fn setup_logging(
    log_level: &str,
    log_file: Option<&std::path::Path>,
    log_format: &str,
) -> Option<tracing_appender::non_blocking::WorkerGuard> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let use_json = log_format == "json";

    if let Some(path) = log_file {
        let dir = path.parent().unwrap_or_else(|| std::path::Path::new("."));
        let filename = path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("tandemd.log"));

        // Ensure the directory exists before tracing-appender tries to open it.
        if let Err(e) = std::fs::create_dir_all(dir) {
            // Fall back to stdout-only — don't panic on a bad log path.
            eprintln!(
                "warn: could not create log directory '{}': {e} — falling back to stdout",
                dir.display()
            );
            if use_json {
                tracing_subscriber::fmt().json().with_env_filter(log_level).init();
            } else {
                tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
            }
            return None;
        }

        let appender = tracing_appender::rolling::daily(dir, filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(appender);

        if use_json {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().json())
                .with(fmt::layer().json().with_writer(non_blocking))
                .init();
        } else {
            tracing_subscriber::registry()
                .with(EnvFilter::new(log_level))
                .with(fmt::layer().compact())
                .with(fmt::layer().with_writer(non_blocking))
                .init();
        }

        Some(guard)
    } else if use_json {
        tracing_subscriber::fmt().json().with_env_filter(log_level).init();
        None
    } else {
        tracing_subscriber::fmt().with_env_filter(log_level).compact().init();
        None
    }
}
