//! fennec-devtools
//!
//! # Usage
//!
//! ```bash
//! fennec-devtools dump-dbs [-v] [-P PROFILE] [-w WHOAMI] [-d DB] [-t TABLE] [-k] [-n LIMIT] [-o OUT]
//! fennec-devtools dump-prefs [-w WHOAMI]
//! adb logcat -v time | fennec-devtools logs [-d DIR] [-p PREFIX] [-b BEGIN] [-e END]
//! fennec-devtools tree browser.db [--csv] [--format html|text|json] [-v]
//! ```
//!
//! # Configuration
//!
//! Configuration is loaded in order (later sources override earlier):
//! 1. Built-in defaults
//! 2. Config file (<config dir>/fennec-devtools/config.toml)
//! 3. File given with --config
//! 4. Environment variables (FENNEC_*)
//! 5. CLI flags

use anyhow::Result;

use fennec_cli::{run, Cli};

fn main() -> Result<()> {
    run(Cli::parse_args())
}
