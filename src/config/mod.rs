use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::error;

const DEFAULT_PORT: u16 = 4520;
const DEFAULT_REMINDER_POLL_SECS: u64 = 60;

fn default_bind_address() -> String {
    "127.0.0.1".to_string()
}

// ─── ReminderConfig ───────────────────────────────────────────────────────────

/// Reminder sweep configuration (`[reminder]` in config.toml).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReminderConfig {
    /// Run the background reminder sweep. Default: true.
    pub enabled: bool,
    /// Seconds between sweeps for due tasks. Default: 60.
    pub poll_interval_secs: u64,
}

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_secs: DEFAULT_REMINDER_POLL_SECS,
        }
    }
}

// ─── ObservabilityConfig ─────────────────────────────────────────────────────

/// Daemon observability configuration (`[observability]` in config.toml).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log SQLite queries that exceed this threshold (milliseconds). Default: 100.
    /// Set to 0 to disable slow query logging.
    pub slow_query_threshold_ms: u64,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            slow_query_threshold_ms: 100,
        }
    }
}

// ─── TOML config file ─────────────────────────────────────────────────────────

/// `{data_dir}/config.toml` — all fields are optional overrides.
/// Priority: CLI / env var  >  TOML  >  built-in default.
#[derive(Deserialize, Default)]
struct TomlConfig {
    /// WebSocket server port (default: 4520).
    port: Option<u16>,
    /// Log level filter string, e.g. "debug", "info,tandemd=trace" (default: "info").
    log: Option<String>,
    /// Bind address for the WebSocket server (default: "127.0.0.1"; use "0.0.0.0" for LAN access).
    bind_address: Option<String>,
    /// Log output format: "pretty" (default, human-readable) | "json" (structured for log aggregators).
    log_format: Option<String>,
    /// Reminder sweep configuration (`[reminder]`).
    reminder: Option<ReminderConfig>,
    /// Observability configuration (`[observability]`).
    observability: Option<ObservabilityConfig>,
}

fn load_toml(data_dir: &Path) -> Option<TomlConfig> {
    let path = data_dir.join("config.toml");
    let contents = std::fs::read_to_string(&path).ok()?;
    match toml::from_str::<TomlConfig>(&contents) {
        Ok(cfg) => Some(cfg),
        Err(e) => {
            error!(path = %path.display(), err = %e, "failed to parse config.toml — using defaults");
            None
        }
    }
}

// ─── DaemonConfig ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct DaemonConfig {
    pub port: u16,
    pub data_dir: PathBuf,
    pub log: String,
    /// Bind address for the WebSocket server (TANDEMD_BIND env var, default: "127.0.0.1").
    pub bind_address: String,
    /// Log output format: "pretty" (default) | "json" (structured for Loki/Elasticsearch).
    pub log_format: String,
    /// Background reminder sweep — enable flag and poll interval.
    pub reminder: ReminderConfig,
    /// Observability: slow query threshold.
    pub observability: ObservabilityConfig,
}

impl DaemonConfig {
    /// Build config from CLI/env args + optional TOML file.
    ///
    /// Priority (highest to lowest):
    ///   1. CLI / env — passed as `Some(value)` from clap
    ///   2. TOML file at `{data_dir}/config.toml`
    ///   3. Built-in defaults
    pub fn new(
        port: Option<u16>,
        data_dir: Option<PathBuf>,
        log: Option<String>,
        bind_address: Option<String>,
    ) -> Self {
        let data_dir = data_dir.unwrap_or_else(default_data_dir);

        // Load TOML as the lowest-priority override layer
        let toml = load_toml(&data_dir).unwrap_or_default();

        let port = port.or(toml.port).unwrap_or(DEFAULT_PORT);
        let log = log.or(toml.log).unwrap_or_else(|| "info".to_string());

        let bind_address = bind_address
            .or(std::env::var("TANDEMD_BIND").ok().filter(|s| !s.is_empty()))
            .or(toml.bind_address)
            .unwrap_or_else(default_bind_address);

        let log_format = std::env::var("TANDEMD_LOG_FORMAT")
            .ok()
            .filter(|s| !s.is_empty())
            .or(toml.log_format)
            .unwrap_or_else(|| "pretty".to_string());

        let reminder = toml.reminder.unwrap_or_default();
        let observability = toml.observability.unwrap_or_default();

        Self {
            port,
            data_dir,
            log,
            bind_address,
            log_format,
            reminder,
            observability,
        }
    }
}

fn default_data_dir() -> PathBuf {
    #[cfg(target_os = "macos")]
    {
        // ~/Library/Application Support/tandemd
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("tandemd");
        }
    }
    #[cfg(target_os = "linux")]
    {
        // $XDG_DATA_HOME/tandemd or ~/.local/share/tandemd
        if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
            return PathBuf::from(xdg).join("tandemd");
        }
        if let Ok(home) = std::env::var("HOME") {
            return PathBuf::from(home)
                .join(".local")
                .join("share")
                .join("tandemd");
        }
    }
    #[cfg(target_os = "windows")]
    {
        // %APPDATA%\tandemd
        if let Ok(appdata) = std::env::var("APPDATA") {
            return PathBuf::from(appdata).join("tandemd");
        }
    }
    // Fallback
    PathBuf::from(".tandemd")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_without_a_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = DaemonConfig::new(None, Some(dir.path().to_path_buf()), None, None);
        assert_eq!(cfg.port, DEFAULT_PORT);
        assert_eq!(cfg.log, "info");
        assert!(cfg.reminder.enabled);
        assert_eq!(cfg.reminder.poll_interval_secs, 60);
    }

    #[test]
    fn cli_beats_toml_beats_default() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "port = 9000\nlog = \"debug\"\n\n[reminder]\npoll_interval_secs = 10\n",
        )
        .unwrap();

        let cfg = DaemonConfig::new(Some(4444), Some(dir.path().to_path_buf()), None, None);
        assert_eq!(cfg.port, 4444); // CLI wins
        assert_eq!(cfg.log, "debug"); // TOML wins over default
        assert_eq!(cfg.reminder.poll_interval_secs, 10);
    }

    #[test]
    fn malformed_toml_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.toml"), "port = \"oops").unwrap();
        let cfg = DaemonConfig::new(None, Some(dir.path().to_path_buf()), None, None);
        assert_eq!(cfg.port, DEFAULT_PORT);
    }
}
