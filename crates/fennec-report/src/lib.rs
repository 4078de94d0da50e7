//! Database and preference dumps for fennec-devtools.
//!
//! Provides:
//! - The catalog of interesting tables and filtering by database/table name
//! - Pulling database files off the device through a staging directory
//! - Per-table report sections, with explicit reasons for skipped tables
//! - HTML page assembly
//! - Shared preference dumps

pub mod catalog;
pub mod dump;
pub mod error;
pub mod page;
pub mod prefs;
pub mod pull;
pub mod section;

pub use catalog::{default_catalog, select_tables, DbLocation, TableSpec, TREE_TABLE};
pub use dump::{dump_databases, DumpPlan};
pub use error::ReportError;
pub use page::Report;
pub use prefs::{dump_prefs, format_prefs, PrefsFile};
pub use pull::{cleanup_pulled, pull_databases, PullPlan, PulledDatabases};
pub use section::{build_section, Section, SectionOptions, SkipReason};
