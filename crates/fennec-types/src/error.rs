//! Error types shared by the fennec crates.

use thiserror::Error;

/// Unified error type for the shared crates.
#[derive(Debug, Error)]
pub enum FennecError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
