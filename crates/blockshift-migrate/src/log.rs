//! Logging port for migration failures
//!
//! Recoverable failures are reported as [`LogRecord`]s through a
//! [`MigrationLog`] so that callers decide where they end up.
//! [`TracingLog`] forwards them to `tracing`; [`CapturingLog`] keeps them in
//! memory for inspection.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Target of every record emitted by the orchestrator
pub const MIGRATE_TARGET: &str = "blockshift_migrate::migrate";

/// Severity of a log record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warn => "WARN",
            Self::Info => "INFO",
            Self::Debug => "DEBUG",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One reported event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: LogLevel,
    pub target: String,
    pub message: String,
}

impl LogRecord {
    /// Error record under [`MIGRATE_TARGET`]
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: LogLevel::Error,
            target: MIGRATE_TARGET.to_owned(),
            message: message.into(),
        }
    }

    /// `LEVEL:target:message`
    #[must_use]
    pub fn render(&self) -> String {
        format!("{}:{}:{}", self.level, self.target, self.message)
    }
}

/// Sink for migration log records
pub trait MigrationLog {
    fn log(&self, record: LogRecord);
}

impl<T: MigrationLog + ?Sized> MigrationLog for &T {
    fn log(&self, record: LogRecord) {
        (**self).log(record);
    }
}

/// Forwards records to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLog;

impl MigrationLog for TracingLog {
    fn log(&self, record: LogRecord) {
        let LogRecord { level, message, .. } = record;
        match level {
            LogLevel::Error => tracing::error!(target: MIGRATE_TARGET, "{}", message),
            LogLevel::Warn => tracing::warn!(target: MIGRATE_TARGET, "{}", message),
            LogLevel::Info => tracing::info!(target: MIGRATE_TARGET, "{}", message),
            LogLevel::Debug => tracing::debug!(target: MIGRATE_TARGET, "{}", message),
        }
    }
}

/// Keeps every record in memory
#[derive(Debug, Default)]
pub struct CapturingLog {
    records: Mutex<Vec<LogRecord>>,
}

impl CapturingLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records received so far
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Rendered records, one `LEVEL:target:message` string each
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        self.records.lock().iter().map(LogRecord::render).collect()
    }

    /// Full text of all records, newline separated
    #[must_use]
    pub fn text(&self) -> String {
        self.lines().join("\n")
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl MigrationLog for CapturingLog {
    fn log(&self, record: LogRecord) {
        self.records.lock().push(record);
    }
}
