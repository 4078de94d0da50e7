//! The database dump workflow: pull, render each table, clean up.

use chrono::{DateTime, Local};
use fennec_device::{Device, QueryRunner};
use tracing::{info, warn};

use crate::catalog::TableSpec;
use crate::page::Report;
use crate::pull::{cleanup_pulled, pull_databases, PullPlan};
use crate::section::{build_section, SectionOptions};

/// Everything a dump needs besides its collaborators.
#[derive(Debug, Clone)]
pub struct DumpPlan {
    pub pull: PullPlan,
    /// Tables in report order
    pub tables: Vec<TableSpec>,
    pub options: SectionOptions,
    /// Keep pulled files instead of deleting them
    pub keep_files: bool,
}

/// Pull the needed databases and render one section per table.
///
/// Tables that can't be rendered are listed in [`Report::skipped`]; the
/// dump itself never fails.
pub fn dump_databases<D, Q>(
    device: &D,
    runner: &Q,
    plan: &DumpPlan,
    generated: DateTime<Local>,
) -> Report
where
    D: Device + ?Sized,
    Q: QueryRunner + ?Sized,
{
    let pulled = pull_databases(device, &plan.pull, &plan.tables);
    let mut report = Report::new(generated);

    for spec in &plan.tables {
        match build_section(spec, &pulled, runner, &plan.options) {
            Ok(section) => report.sections.push(section),
            Err(reason) => {
                warn!(db = %spec.db, table = %spec.table, %reason, "Skipping table");
                report.skipped.push((spec.clone(), reason));
            }
        }
    }

    cleanup_pulled(&pulled, plan.keep_files);

    info!(
        sections = report.sections.len(),
        skipped = report.skipped.len(),
        "Dumped databases"
    );
    report
}
