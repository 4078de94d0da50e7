//! Logcat session splitting for fennec-devtools.
//!
//! Provides:
//! - Timestamp derivation from `adb logcat -v time` lines
//! - A sentinel-driven segmenter writing one file per session
//! - A driver that runs the segmenter over any `BufRead`

pub mod config;
pub mod segmenter;
pub mod sink;
pub mod timestamp;

pub use config::SegmenterConfig;
pub use segmenter::{
    segment_lines, segment_lines_until, SegmentSummary, Segmenter, SegmenterAction, SegmenterError,
    SkipReason,
};
pub use sink::{DirectoryMedium, OutputMedium};
pub use timestamp::{derive_timestamp, log_filename, parse_logcat_timestamp, Clock, FixedClock, SystemClock};
