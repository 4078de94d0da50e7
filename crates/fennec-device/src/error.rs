//! Errors from external tools.

use thiserror::Error;

/// Failure running `adb` or `sqlite3`.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// The executable could not be located
    #[error("{tool} not found: {reason}")]
    ToolNotFound { tool: String, reason: String },

    /// The process could not be started
    #[error("Failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process exited unsuccessfully
    #[error("{command} exited with {status}: {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },
}
