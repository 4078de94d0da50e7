//! Configuration for session splitting.

use std::path::PathBuf;

use fennec_types::config::{DEFAULT_BEGIN_SENTINEL, DEFAULT_END_SENTINEL};
use fennec_types::LogSettings;
use serde::{Deserialize, Serialize};

/// Configuration for a [`Segmenter`](crate::Segmenter).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmenterConfig {
    /// Directory session files are created in
    pub directory: PathBuf,

    /// File name prefix: `<prefix>-<timestamp>.txt`
    pub prefix: String,

    /// A line containing this opens a session
    pub begin_sentinel: String,

    /// A line containing this closes the open session
    pub end_sentinel: String,

    /// Text following the timestamp column, e.g. `" I/"`
    pub level_delimiter: String,
}

impl Default for SegmenterConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            prefix: "FxSync".to_string(),
            begin_sentinel: DEFAULT_BEGIN_SENTINEL.to_string(),
            end_sentinel: DEFAULT_END_SENTINEL.to_string(),
            level_delimiter: " I/".to_string(),
        }
    }
}

impl From<&LogSettings> for SegmenterConfig {
    fn from(settings: &LogSettings) -> Self {
        Self {
            directory: PathBuf::from(&settings.directory),
            prefix: settings.prefix.clone(),
            begin_sentinel: settings.begin_sentinel.clone(),
            end_sentinel: settings.end_sentinel.clone(),
            level_delimiter: settings.level_delimiter.clone(),
        }
    }
}
