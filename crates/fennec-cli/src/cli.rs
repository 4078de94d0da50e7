//! CLI argument parsing for fennec-devtools.
//!
//! Flags override the configuration file and environment.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Fennec developer tools
///
/// Dump databases and preferences from a device, split sync logs out of
/// logcat output, and render the bookmarks tree.
#[derive(Parser, Debug)]
#[command(name = "fennec-devtools")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file (overrides the default in the user config directory)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Set log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pull databases from the device and dump them as an HTML page
    DumpDbs(DumpDbsArgs),

    /// Print the application's shared preferences
    DumpPrefs {
        /// run-as org.mozilla.fennec_<WHOAMI> (default: user name)
        #[arg(short, long)]
        whoami: Option<String>,
    },

    /// Read `adb logcat -v time` output from stdin and write sync logs to files
    Logs(LogsArgs),

    /// Render the bookmarks tree of a local browser.db
    Tree(TreeArgs),
}

#[derive(Args, Debug, Clone)]
pub struct DumpDbsArgs {
    /// Show row metadata in the bookmarks tree
    #[arg(short, long)]
    pub verbose: bool,

    /// Profile directory name under files/mozilla, e.g. abcd1234.default
    #[arg(short = 'P', long)]
    pub profile: Option<String>,

    /// run-as org.mozilla.fennec_<WHOAMI> (default: user name)
    #[arg(short, long)]
    pub whoami: Option<String>,

    /// Database to dump (substring, or exact name together with --table)
    #[arg(short, long)]
    pub db: Option<String>,

    /// Table to dump (substring, or exact name together with --db)
    #[arg(short, long)]
    pub table: Option<String>,

    /// Keep pulled database files in the temp directory
    #[arg(short, long)]
    pub keep: bool,

    /// Rows per table
    #[arg(short = 'n', long)]
    pub limit: Option<u32>,

    /// Write the page here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct LogsArgs {
    /// Directory to write log files to
    #[arg(short, long)]
    pub directory: Option<PathBuf>,

    /// Files are named <PREFIX>-<TIMESTAMP>.txt
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Text that begins a session
    #[arg(short, long)]
    pub begin: Option<String>,

    /// Text that ends a session
    #[arg(short, long)]
    pub end: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct TreeArgs {
    /// browser.db file, or sqlite3 CSV output with --csv
    pub input: PathBuf,

    /// Read rows as `_id,guid,parent,position,title` CSV instead of querying
    #[arg(long)]
    pub csv: bool,

    #[arg(short, long, value_enum, default_value_t = TreeFormat::Html)]
    pub format: TreeFormat,

    /// Include row metadata
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeFormat {
    Html,
    Text,
    Json,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
