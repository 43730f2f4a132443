use crate::humanize::{ByteSize, HumanDuration};
use crate::snapshot::SnapshotFormat;
use crate::vacuum::Vacuumer;
use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub durability: DurabilityConfig,
    #[serde(default)]
    pub journal: JournalConfig,
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_addr")]
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from((Ipv4Addr::UNSPECIFIED, 8080))
}

/// How stale entries are removed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VacuumMode {
    #[default]
    Periodic,
    None,
}

/// Sliding window configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowConfig {
    /// How far back an event still counts
    #[serde(default = "default_window_length")]
    pub length: HumanDuration,
    #[serde(default)]
    pub vacuum: VacuumMode,
    /// Ignored unless `vacuum = "periodic"`
    #[serde(default = "default_vacuum_period")]
    pub vacuum_period: HumanDuration,
}

impl WindowConfig {
    pub fn vacuumer(&self) -> Vacuumer {
        match self.vacuum {
            VacuumMode::Periodic => Vacuumer::periodic(self.vacuum_period.into()),
            VacuumMode::None => Vacuumer::Noop,
        }
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            length: default_window_length(),
            vacuum: VacuumMode::default(),
            vacuum_period: default_vacuum_period(),
        }
    }
}

fn default_window_length() -> HumanDuration {
    HumanDuration::from_secs(30)
}

fn default_vacuum_period() -> HumanDuration {
    HumanDuration::from_secs(5)
}

/// Which persistence mechanism backs the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DurabilityStrategy {
    #[default]
    Journal,
    Snapshot,
    None,
}

impl DurabilityStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            DurabilityStrategy::Journal => "journal",
            DurabilityStrategy::Snapshot => "snapshot",
            DurabilityStrategy::None => "none",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DurabilityConfig {
    #[serde(default)]
    pub strategy: DurabilityStrategy,
}

/// Append-log configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JournalConfig {
    #[serde(default = "default_journal_path")]
    pub path: PathBuf,
    /// Write buffer size before records reach the OS
    #[serde(default = "default_buffer_capacity")]
    pub buffer_capacity: ByteSize,
    #[serde(default = "default_flush_interval")]
    pub flush_interval: HumanDuration,
    /// Refuse to start on a damaged journal tail instead of keeping the valid prefix
    #[serde(default)]
    pub strict: bool,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            path: default_journal_path(),
            buffer_capacity: default_buffer_capacity(),
            flush_interval: default_flush_interval(),
            strict: false,
        }
    }
}

fn default_journal_path() -> PathBuf {
    PathBuf::from("data/hits.journal")
}

fn default_buffer_capacity() -> ByteSize {
    ByteSize(512)
}

fn default_flush_interval() -> HumanDuration {
    HumanDuration::from_secs(1)
}

/// Periodic snapshot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnapshotConfig {
    #[serde(default = "default_snapshot_path")]
    pub path: PathBuf,
    #[serde(default = "default_snapshot_interval")]
    pub interval: HumanDuration,
    #[serde(default)]
    pub format: SnapshotFormat,
    /// Seed the store from an existing snapshot at startup
    #[serde(default)]
    pub restore_on_start: bool,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: default_snapshot_path(),
            interval: default_snapshot_interval(),
            format: SnapshotFormat::default(),
            restore_on_start: false,
        }
    }
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("data/hits.snapshot")
}

fn default_snapshot_interval() -> HumanDuration {
    HumanDuration::from_secs(10)
}

/// Log output style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Full,
    Compact,
    /// Discard all log output
    Off,
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TelemetryConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG`
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
