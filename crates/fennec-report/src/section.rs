//! One report section per selected table.

use fennec_device::QueryRunner;
use fennec_tree::{parse_csv_records, render_html, TreeBuilder, BOOKMARKS_TREE_SQL};
use thiserror::Error;
use tracing::{debug, warn};

use crate::catalog::TableSpec;
use crate::pull::PulledDatabases;

/// Rendering knobs shared by all sections.
#[derive(Debug, Clone, Copy)]
pub struct SectionOptions {
    /// Add row metadata to tree nodes
    pub verbose: bool,
    /// Row limit for plain table dumps
    pub limit: u32,
}

impl Default for SectionOptions {
    fn default() -> Self {
        Self {
            verbose: false,
            limit: 200,
        }
    }
}

/// Why a table is missing from the report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("{db} was not copied: {reason}")]
    NotCopied { db: String, reason: String },

    #[error("Couldn't query {table} in {db}: {error}")]
    QueryFailed {
        db: String,
        table: String,
        error: String,
    },
}

/// A titled HTML fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    /// Plain text; escaped when rendered
    pub heading: String,
    /// HTML markup
    pub body: String,
}

impl Section {
    pub fn to_html(&self) -> String {
        format!(
            "<div>\n<h2>{}</h2>\n{}</div>\n",
            html_escape::encode_text(&self.heading),
            self.body
        )
    }
}

/// Build the section for `spec` from its pulled database.
pub fn build_section<Q: QueryRunner + ?Sized>(
    spec: &TableSpec,
    pulled: &PulledDatabases,
    runner: &Q,
    options: &SectionOptions,
) -> Result<Section, SkipReason> {
    let Some(db_path) = pulled.local_path(&spec.db) else {
        return Err(SkipReason::NotCopied {
            db: spec.db.clone(),
            reason: pulled.failure(&spec.db).unwrap_or("not pulled").to_string(),
        });
    };

    let query_failed = |err: fennec_device::DeviceError| {
        warn!(db = %spec.db, table = %spec.table, error = %err, "Query failed");
        SkipReason::QueryFailed {
            db: spec.db.clone(),
            table: spec.table.clone(),
            error: err.to_string(),
        }
    };

    if spec.is_tree() {
        let csv = runner
            .query_csv(db_path, BOOKMARKS_TREE_SQL)
            .map_err(query_failed)?;

        let mut builder = TreeBuilder::new();
        builder.extend(parse_csv_records(&csv));
        let tree = builder.build();
        debug!(
            db = %spec.db,
            nodes = tree.root.node_count(),
            unreachable = tree.stats.unreachable,
            "Rendered bookmarks tree"
        );

        return Ok(Section {
            heading: BOOKMARKS_TREE_SQL.to_string(),
            body: render_html(&tree.root, options.verbose),
        });
    }

    let sql = format!("select * from {} limit {};", spec.table, options.limit);
    let markup = runner.query_html(db_path, &sql).map_err(query_failed)?;

    Ok(Section {
        heading: format!("{}: {}", spec.db, sql),
        body: format!("<table>\n{}\n</table>\n", markup.trim_end()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DbLocation, TableSpec};
    use crate::pull::{pull_databases, PullPlan};
    use fennec_device::{Device, DeviceError};
    use pretty_assertions::assert_eq;
    use std::path::Path;
    use tempfile::TempDir;

    struct NullDevice;

    impl Device for NullDevice {
        fn shell(&self, _command: &str) -> Result<String, DeviceError> {
            Ok(String::new())
        }

        fn pull(&self, _remote: &str, local: &Path) -> Result<String, DeviceError> {
            std::fs::write(local, b"").unwrap();
            Ok(String::new())
        }
    }

    struct CannedRunner;

    impl QueryRunner for CannedRunner {
        fn query_csv(&self, _db: &Path, sql: &str) -> Result<String, DeviceError> {
            assert_eq!(sql, BOOKMARKS_TREE_SQL);
            Ok("2,g2,0,1,Second\n1,g1,0,0,First\n".to_string())
        }

        fn query_html(&self, _db: &Path, sql: &str) -> Result<String, DeviceError> {
            if sql.contains("missing") {
                return Err(DeviceError::CommandFailed {
                    command: "sqlite3".to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: "Error: no such table: missing".to_string(),
                });
            }
            Ok("<TR><TH>_id</TH></TR>\n<TR><TD>1</TD></TR>\n".to_string())
        }
    }

    fn pulled(dir: &TempDir, tables: &[TableSpec]) -> PulledDatabases {
        let plan = PullPlan {
            package: "pkg".to_string(),
            device_root: "/data/data/pkg".to_string(),
            profile: Some("p".to_string()),
            staging_dir: "/sdcard".to_string(),
            local_dir: dir.path().to_path_buf(),
            timestamp: 1,
        };
        pull_databases(&NullDevice, &plan, tables)
    }

    #[test]
    fn test_tree_section() {
        let dir = TempDir::new().unwrap();
        let spec = TableSpec::new(DbLocation::Profile, "browser.db", "tree");
        let pulled = pulled(&dir, std::slice::from_ref(&spec));

        let section = build_section(&spec, &pulled, &CannedRunner, &SectionOptions::default()).unwrap();
        assert_eq!(section.heading, BOOKMARKS_TREE_SQL);
        assert_eq!(
            section.body,
            "<ul>\n<b>places</b>\n<ul>\n<b>First</b>\n</ul>\n<ul>\n<b>Second</b>\n</ul>\n</ul>\n"
        );
    }

    #[test]
    fn test_table_section() {
        let dir = TempDir::new().unwrap();
        let spec = TableSpec::new(DbLocation::Profile, "tabs.db", "tabs");
        let pulled = pulled(&dir, std::slice::from_ref(&spec));
        let options = SectionOptions {
            verbose: false,
            limit: 7,
        };

        let section = build_section(&spec, &pulled, &CannedRunner, &options).unwrap();
        assert_eq!(section.heading, "tabs.db: select * from tabs limit 7;");
        assert_eq!(
            section.body,
            "<table>\n<TR><TH>_id</TH></TR>\n<TR><TD>1</TD></TR>\n</table>\n"
        );
        assert!(section
            .to_html()
            .starts_with("<div>\n<h2>tabs.db: select * from tabs limit 7;</h2>\n<table>"));
    }

    #[test]
    fn test_query_failure_is_a_skip() {
        let dir = TempDir::new().unwrap();
        let spec = TableSpec::new(DbLocation::Profile, "browser.db", "missing");
        let pulled = pulled(&dir, std::slice::from_ref(&spec));

        let err = build_section(&spec, &pulled, &CannedRunner, &SectionOptions::default()).unwrap_err();
        match err {
            SkipReason::QueryFailed { table, error, .. } => {
                assert_eq!(table, "missing");
                assert!(error.contains("no such table"));
            }
            other => panic!("unexpected skip: {other:?}"),
        }
    }

    #[test]
    fn test_uncopied_database_is_a_skip() {
        let spec = TableSpec::new(DbLocation::Profile, "tabs.db", "tabs");
        let err = build_section(
            &spec,
            &PulledDatabases::default(),
            &CannedRunner,
            &SectionOptions::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            SkipReason::NotCopied {
                db: "tabs.db".to_string(),
                reason: "not pulled".to_string()
            }
        );
    }

    #[test]
    fn test_heading_is_escaped() {
        let section = Section {
            heading: "a < b".to_string(),
            body: String::new(),
        };
        assert_eq!(section.to_html(), "<div>\n<h2>a &lt; b</h2>\n</div>\n");
    }
}
