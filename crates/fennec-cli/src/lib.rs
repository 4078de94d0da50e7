//! fennec-devtools library exports.
//!
//! # Modules
//!
//! - `cli`: Command-line argument parsing with clap
//! - `commands`: Command implementations (dump-dbs, dump-prefs, logs, tree)

pub mod cli;
pub mod commands;

pub use cli::{Cli, Commands, DumpDbsArgs, LogsArgs, TreeArgs, TreeFormat};
pub use commands::{capture_logs, dump_dbs, dump_preferences, run, segmenter_config, show_tree};
