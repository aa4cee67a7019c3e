//! Run log for pipeline progress messages.
//!
//! Every message is emitted as a `tracing` event as it happens and kept in
//! the [`RunLog`] so the final report can list what the run did (rows
//! dropped, columns matched, ranges built).

use serde::Serialize;
use tracing_subscriber::EnvFilter;

/// Log level for report display
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A single log entry
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Optional indentation level (for nested logs)
    pub indent: u8,
}

impl LogEntry {
    pub fn info(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Info, message: message.into(), indent: 0 }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Success, message: message.into(), indent: 0 }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Warning, message: message.into(), indent: 0 }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { level: LogLevel::Error, message: message.into(), indent: 0 }
    }

    pub fn with_indent(mut self, indent: u8) -> Self {
        self.indent = indent;
        self
    }

    /// Plain-text rendering used by the text report.
    pub fn render(&self) -> String {
        let prefix = match self.level {
            LogLevel::Info => "   ",
            LogLevel::Success => "   ✓",
            LogLevel::Warning => "   ⚠️",
            LogLevel::Error => "   ❌",
        };
        let indent = "   ".repeat(self.indent as usize);
        format!("{}{} {}", indent, prefix, self.message)
    }
}

/// Ordered log of one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunLog {
    entries: Vec<LogEntry>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entry and emit it as a tracing event.
    pub fn log(&mut self, entry: LogEntry) {
        match entry.level {
            LogLevel::Info => tracing::info!(indent = entry.indent, "{}", entry.message),
            LogLevel::Success => tracing::info!(indent = entry.indent, status = "ok", "{}", entry.message),
            LogLevel::Warning => tracing::warn!(indent = entry.indent, "{}", entry.message),
            LogLevel::Error => tracing::error!(indent = entry.indent, "{}", entry.message),
        }
        self.entries.push(entry);
    }

    pub fn info(&mut self, msg: impl Into<String>) {
        self.log(LogEntry::info(msg));
    }

    pub fn success(&mut self, msg: impl Into<String>) {
        self.log(LogEntry::success(msg));
    }

    pub fn warning(&mut self, msg: impl Into<String>) {
        self.log(LogEntry::warning(msg));
    }

    pub fn error(&mut self, msg: impl Into<String>) {
        self.log(LogEntry::error(msg));
    }

    pub fn info_indent(&mut self, msg: impl Into<String>, indent: u8) {
        self.log(LogEntry::info(msg).with_indent(indent));
    }

    pub fn warning_indent(&mut self, msg: impl Into<String>, indent: u8) {
        self.log(LogEntry::warning(msg).with_indent(indent));
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    /// Number of warnings and errors recorded.
    pub fn problem_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| matches!(e.level, LogLevel::Warning | LogLevel::Error))
            .count()
    }
}

/// Install the global tracing subscriber for the CLI.
///
/// `RUST_LOG` takes precedence; otherwise the crate logs at `info`
/// (`debug` when `verbose`).
pub fn init_logging(verbose: bool) {
    let default_directive = if verbose {
        "sales_analytics=debug"
    } else {
        "sales_analytics=info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
