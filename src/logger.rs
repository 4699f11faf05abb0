//! Injected logging interface for connections.
//!
//! A [`Connection`](crate::Connection) reports protocol problems (malformed
//! messages, unknown response ids, failing handlers) through a [`Logger`]
//! passed at construction instead of a global console.
//!
//! | Logger | Use |
//! |--------|-----|
//! | [`TracingLogger`] | Default, forwards to `tracing` |
//! | [`NoopLogger`] | Discards everything |
//! | [`MemoryLogger`] | Keeps entries in memory for assertions |

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

// ============================================================================
// Logger
// ============================================================================

/// Sink for connection diagnostics.
pub trait Logger: Send + Sync {
    /// Reports an error the connection recovered from.
    fn error(&self, message: &str);
    /// Reports a suspicious but tolerated condition.
    fn warn(&self, message: &str);
    /// Reports a lifecycle event.
    fn info(&self, message: &str);
    /// Reports a low-level detail.
    fn log(&self, message: &str);
}

// ============================================================================
// TracingLogger
// ============================================================================

/// Forwards every entry to the `tracing` macros.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn error(&self, message: &str) {
        tracing::error!(target: "extension_host::connection", "{message}");
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "extension_host::connection", "{message}");
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "extension_host::connection", "{message}");
    }

    fn log(&self, message: &str) {
        tracing::debug!(target: "extension_host::connection", "{message}");
    }
}

// ============================================================================
// NoopLogger
// ============================================================================

/// Discards every entry.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn error(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn log(&self, _message: &str) {}
}

// ============================================================================
// MemoryLogger
// ============================================================================

/// Severity of a recorded entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// [`Logger::error`].
    Error,
    /// [`Logger::warn`].
    Warn,
    /// [`Logger::info`].
    Info,
    /// [`Logger::log`].
    Log,
}

/// Records entries in memory.
///
/// Clones share the same buffer, so a test can keep one clone and hand
/// the other to a connection.
#[derive(Clone, Default)]
pub struct MemoryLogger {
    entries: Arc<Mutex<Vec<(LogLevel, String)>>>,
}

impl MemoryLogger {
    /// Creates an empty logger.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of recorded entries.
    #[must_use]
    pub fn entries(&self) -> Vec<(LogLevel, String)> {
        self.entries.lock().clone()
    }

    /// Returns `true` if any entry at `level` contains `needle`.
    #[must_use]
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.entries
            .lock()
            .iter()
            .any(|(l, m)| *l == level && m.contains(needle))
    }

    fn push(&self, level: LogLevel, message: &str) {
        self.entries.lock().push((level, message.to_string()));
    }
}

impl fmt::Debug for MemoryLogger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryLogger")
            .field("entries", &self.entries.lock().len())
            .finish()
    }
}

impl Logger for MemoryLogger {
    fn error(&self, message: &str) {
        self.push(LogLevel::Error, message);
    }

    fn warn(&self, message: &str) {
        self.push(LogLevel::Warn, message);
    }

    fn info(&self, message: &str) {
        self.push(LogLevel::Info, message);
    }

    fn log(&self, message: &str) {
        self.push(LogLevel::Log, message);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_logger_shares_buffer() {
        let logger = MemoryLogger::new();
        let handle: Arc<dyn Logger> = Arc::new(logger.clone());

        handle.warn("unknown response id 7");
        handle.error("malformed");

        assert_eq!(logger.entries().len(), 2);
        assert!(logger.contains(LogLevel::Warn, "id 7"));
        assert!(!logger.contains(LogLevel::Error, "id 7"));
    }

    #[test]
    fn test_noop_logger_is_silent() {
        let logger = NoopLogger;
        logger.error("ignored");
        logger.log("ignored");
    }
}
