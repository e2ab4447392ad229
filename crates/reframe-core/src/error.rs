//! Error metadata
//!
//! Concrete error enums live next to the code that raises them (`StorageError`, `DbError`,
//! `PipelineError`, ...). This module holds the shared description of how an error is
//! reported: a stable code, a log level and a short message for the person running the job.

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected outcomes like an empty bucket
    Debug,
    /// Warning level - for rejected input such as a mislabeled file
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Self-description of an error for logs and terminal output.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "EXTENSION_MISMATCH")
    fn error_code(&self) -> &'static str;

    /// Whether running the same job again could succeed without changing any input.
    fn is_recoverable(&self) -> bool;

    /// Short message shown to the operator.
    fn client_message(&self) -> String;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}
