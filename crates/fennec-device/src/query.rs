//! Queries against pulled database files via `sqlite3`.

use std::path::{Path, PathBuf};

use crate::error::DeviceError;
use crate::process;

/// Runs SQL against a local SQLite file.
pub trait QueryRunner {
    /// Rows as CSV, no header.
    fn query_csv(&self, db: &Path, sql: &str) -> Result<String, DeviceError>;

    /// Rows as HTML `<tr>` markup with a header row.
    fn query_html(&self, db: &Path, sql: &str) -> Result<String, DeviceError>;
}

/// The `sqlite3` command line shell.
#[derive(Debug, Clone)]
pub struct Sqlite3 {
    program: PathBuf,
}

impl Sqlite3 {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Find `program` (e.g. `"sqlite3"`) on `PATH`.
    pub fn locate(program: &str) -> Result<Self, DeviceError> {
        process::locate(program).map(Self::new)
    }

    fn run(&self, mode: &[&str], db: &Path, sql: &str) -> Result<String, DeviceError> {
        let db = db.to_string_lossy();
        let mut args: Vec<&str> = mode.to_vec();
        args.push(db.as_ref());
        args.push(sql);
        process::run(&self.program, &args)
    }
}

impl QueryRunner for Sqlite3 {
    fn query_csv(&self, db: &Path, sql: &str) -> Result<String, DeviceError> {
        self.run(&["-bail", "-csv"], db, sql)
    }

    fn query_html(&self, db: &Path, sql: &str) -> Result<String, DeviceError> {
        self.run(&["-bail", "-html", "-header"], db, sql)
    }
}
