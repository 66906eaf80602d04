use std::io::Write;
use std::sync::{Mutex, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
}

static LOG_LEVEL: OnceLock<LogLevel> = OnceLock::new();

pub fn init_logging(verbose: bool) {
    let level = if verbose {
        LogLevel::Debug
    } else {
        LogLevel::Info
    };
    LOG_LEVEL.set(level).ok(); // Ignore errors if already set
}

pub fn get_log_level() -> LogLevel {
    *LOG_LEVEL.get().unwrap_or(&LogLevel::Info)
}

pub fn log(level: LogLevel, message: &str) {
    if level <= get_log_level() {
        match level {
            LogLevel::Error => eprintln!("Error: {}", message),
            LogLevel::Warning => eprintln!("Warning: {}", message),
            LogLevel::Info => println!("{}", message),
            LogLevel::Debug => println!("Debug: {}", message),
        }
    }
}

/// Append-only, mutex-guarded diagnostic trail collected from the orchestrator
/// and, after each worker thread joins, from its partition's log lines.
///
/// Always flushed regardless of run outcome, so a degraded run (`sd = -1`)
/// is still diagnosable after the fact.
#[derive(Debug, Default)]
pub struct RunLog {
    lines: Mutex<Vec<String>>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a line, stamped with seconds since the Unix epoch.
    pub fn push(&self, message: impl Into<String>) {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
        lines.push(format!("[{secs}] {}", message.into()));
    }

    /// Snapshot of all lines recorded so far, in insertion order.
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Write every line to `path`, one per line, creating or truncating it.
    pub fn flush_to_file(&self, path: &std::path::Path) -> std::io::Result<()> {
        let mut file = std::fs::File::create(path)?;
        for line in self.lines() {
            writeln!(file, "{line}")?;
        }
        Ok(())
    }

    /// Write every line to stderr, used when no output directory is configured.
    pub fn flush_to_stderr(&self) {
        for line in self.lines() {
            eprintln!("{line}");
        }
    }
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        $crate::logging::log($crate::logging::LogLevel::Error, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)*) => {
        $crate::logging::log($crate::logging::LogLevel::Warning, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        $crate::logging::log($crate::logging::LogLevel::Info, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        $crate::logging::log($crate::logging::LogLevel::Debug, &format!($($arg)*))
    };
}
