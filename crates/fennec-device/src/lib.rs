//! External tool adapters for fennec-devtools.
//!
//! - [`Device`]: shell commands and file pulls, implemented over `adb`
//! - [`QueryRunner`]: SQL against a local database file, implemented over `sqlite3`
//!
//! Both are traits so the report and prefs workflows can be exercised with fakes.

pub mod adb;
pub mod error;
mod process;
pub mod query;

pub use adb::{run_as, Adb, Device};
pub use error::DeviceError;
pub use query::{QueryRunner, Sqlite3};
