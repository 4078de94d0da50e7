//! Command implementations for fennec-devtools.
//!
//! Handles:
//! - dump-dbs: pull databases, render the HTML report
//! - dump-prefs: print shared preference files
//! - logs: split logcat output on stdin into session files
//! - tree: render the bookmarks tree of a local database

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use tracing::{debug, info, warn};

use fennec_device::{Adb, QueryRunner, Sqlite3};
use fennec_logs::{
    segment_lines_until, SegmentSummary, Segmenter, SegmenterAction, SegmenterConfig,
};
use fennec_report::{
    default_catalog, dump_databases, dump_prefs, format_prefs, select_tables, DumpPlan, PullPlan,
    SectionOptions,
};
use fennec_tree::{parse_csv_records, render_html, render_json, render_text, TreeBuilder, BOOKMARKS_TREE_SQL};
use fennec_types::Settings;

use crate::cli::{Cli, Commands, DumpDbsArgs, LogsArgs, TreeArgs, TreeFormat};

/// Load configuration, set up logging and run the chosen command.
pub fn run(cli: Cli) -> Result<()> {
    let mut settings =
        Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // CLI flags take precedence over every other source
    if let Some(log_level) = cli.log_level {
        settings.log_level = log_level;
    }
    init_logging(&settings.log_level)?;

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::DumpDbs(args) => dump_dbs(&settings, &args, &mut out),
        Commands::DumpPrefs { whoami } => dump_preferences(&settings, whoami, &mut out),
        Commands::Logs(args) => {
            let stop = interrupt_flag()?;
            capture_logs(&settings, &args, io::stdin().lock(), &mut out, &stop).map(|_| ())
        }
        Commands::Tree(args) => show_tree(&settings, &args, &mut out),
    }
}

/// Log to stderr so stdout stays clean for reports and notices.
fn init_logging(level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to set subscriber")?;
    Ok(())
}

/// Set on Ctrl-C instead of terminating, so open sessions get closed.
///
/// The process keeps reading until the current line or end of input; in
/// `adb logcat | fennec-devtools logs` adb receives the same signal and
/// closes the pipe.
fn interrupt_flag() -> Result<Arc<AtomicBool>> {
    let stop = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&stop);
    ctrlc::set_handler(move || {
        warn!("Interrupted, closing open session");
        flag.store(true, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl-C handler")?;
    Ok(stop)
}

fn whoami(settings: &Settings, flag: Option<String>) -> Result<String> {
    flag.filter(|w| !w.is_empty())
        .or_else(|| settings.resolved_whoami())
        .ok_or_else(|| anyhow!("Couldn't determine the user name; pass --whoami"))
}

/// Pull the selected databases and write the HTML report.
pub fn dump_dbs(settings: &Settings, args: &DumpDbsArgs, out: &mut impl Write) -> Result<()> {
    let whoami = whoami(settings, args.whoami.clone())?;
    let package = settings.package_name(&whoami);

    let tables = select_tables(&default_catalog(), args.db.as_deref(), args.table.as_deref());
    if tables.is_empty() {
        bail!("No tables match the given database and table names");
    }

    let device = Adb::locate(&settings.adb_path).context("Failed to find adb")?;
    let sqlite = Sqlite3::locate(&settings.sqlite_path).context("Failed to find sqlite3")?;

    let local_dir = settings.expanded_temp_dir();
    fs::create_dir_all(&local_dir)
        .with_context(|| format!("Failed to create {}", local_dir.display()))?;

    let generated = Local::now();
    let plan = DumpPlan {
        pull: PullPlan {
            device_root: settings.device_root(&whoami),
            package,
            profile: args.profile.clone(),
            staging_dir: settings.device_output_dir.clone(),
            local_dir,
            timestamp: generated.timestamp(),
        },
        tables,
        options: SectionOptions {
            verbose: args.verbose,
            limit: args.limit.unwrap_or(settings.limit),
        },
        keep_files: args.keep,
    };
    info!(package = %plan.pull.package, tables = plan.tables.len(), "Dumping databases");

    let report = dump_databases(&device, &sqlite, &plan, generated);
    for (spec, reason) in &report.skipped {
        debug!(db = %spec.db, table = %spec.table, %reason, "Not in report");
    }

    match &args.output {
        Some(path) => {
            report.write_to(path)?;
            writeln!(out, "Wrote {}", path.display())?;
        }
        None => out.write_all(report.render_page().as_bytes())?,
    }
    Ok(())
}

/// Print every shared preference file.
pub fn dump_preferences(
    settings: &Settings,
    whoami_flag: Option<String>,
    out: &mut impl Write,
) -> Result<()> {
    let whoami = whoami(settings, whoami_flag)?;
    let device = Adb::locate(&settings.adb_path).context("Failed to find adb")?;

    let files = dump_prefs(
        &device,
        &settings.package_name(&whoami),
        &settings.device_root(&whoami),
    )
    .context("Failed to list shared preferences")?;
    out.write_all(format_prefs(&files).as_bytes())?;
    Ok(())
}

/// Segmenter configuration: settings, then flags.
pub fn segmenter_config(settings: &Settings, args: &LogsArgs) -> Result<SegmenterConfig> {
    let mut logs = settings.logs.clone();
    if let Some(prefix) = &args.prefix {
        logs.prefix = prefix.clone();
    }
    if let Some(begin) = &args.begin {
        logs.begin_sentinel = begin.clone();
    }
    if let Some(end) = &args.end {
        logs.end_sentinel = end.clone();
    }
    logs.validate().map_err(|e| anyhow!("Invalid log settings: {e}"))?;

    let mut config = SegmenterConfig::from(&logs);
    config.directory = match &args.directory {
        Some(dir) => dir.clone(),
        None => settings.expanded_log_dir(),
    };
    Ok(config)
}

/// Split `input` into session files, printing a notice per session to `out`.
///
/// Reading stops early once `stop` is set; any open session is closed.
pub fn capture_logs(
    settings: &Settings,
    args: &LogsArgs,
    input: impl BufRead,
    out: &mut impl Write,
    stop: &AtomicBool,
) -> Result<SegmentSummary> {
    let config = segmenter_config(settings, args)?;
    if !config.directory.is_dir() {
        bail!("Log directory {} does not exist", config.directory.display());
    }
    info!(directory = %config.directory.display(), prefix = %config.prefix, "Waiting for sessions");

    let mut segmenter = Segmenter::new(config);
    let mut notice_error = None;
    let summary = segment_lines_until(input, &mut segmenter, stop, |action| {
        if notice_error.is_some() {
            return;
        }
        if let Err(err) = write_notice(out, action) {
            notice_error = Some(err);
        }
    })
    .context("Failed to read log input")?;

    if let Some(err) = notice_error {
        return Err(err).context("Failed to write notice");
    }
    info!(
        lines = summary.lines,
        sessions = summary.sessions.len(),
        skipped = summary.skipped,
        interrupted = summary.interrupted,
        "Input finished"
    );
    Ok(summary)
}

fn write_notice(out: &mut impl Write, action: &SegmenterAction) -> io::Result<()> {
    match action {
        SegmenterAction::Opened(path) => writeln!(out, "Logging to file {} ...", path.display()),
        SegmenterAction::Skipped { path, reason } => {
            writeln!(out, "Logging to file {} ... skipped ({reason}).", path.display())
        }
        SegmenterAction::Closed { path, lines } => {
            writeln!(out, "done. {} ({lines} lines)", path.display())
        }
        SegmenterAction::Dropped { path, lines, error } => {
            writeln!(out, "failed. {} ({lines} lines): {error}", path.display())
        }
        SegmenterAction::Appended => Ok(()),
    }
}

/// Render the bookmarks tree from a database or from CSV rows.
pub fn show_tree(settings: &Settings, args: &TreeArgs, out: &mut impl Write) -> Result<()> {
    let csv = if args.csv {
        fs::read_to_string(&args.input)
            .with_context(|| format!("Failed to read {}", args.input.display()))?
    } else {
        query_rows(settings, &args.input)?
    };

    let mut builder = TreeBuilder::new();
    builder.extend(parse_csv_records(&csv));
    let tree = builder.build();
    info!(
        attached = tree.stats.attached,
        reserved_ids = tree.stats.reserved_ids,
        unreachable = tree.stats.unreachable,
        "Built tree"
    );

    let rendered = match args.format {
        TreeFormat::Html => render_html(&tree.root, args.verbose),
        TreeFormat::Text => render_text(&tree.root, args.verbose),
        TreeFormat::Json => {
            let mut json = render_json(&tree.root).context("Failed to serialize tree")?;
            json.push('\n');
            json
        }
    };
    out.write_all(rendered.as_bytes())?;
    Ok(())
}

fn query_rows(settings: &Settings, db: &Path) -> Result<String> {
    if !db.is_file() {
        bail!("No such database: {}", db.display());
    }
    let sqlite = Sqlite3::locate(&settings.sqlite_path).context("Failed to find sqlite3")?;
    sqlite
        .query_csv(db, BOOKMARKS_TREE_SQL)
        .with_context(|| format!("Failed to query {}", db.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use fennec_logs::SkipReason;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn settings() -> Settings {
        Settings::default()
    }

    fn running() -> AtomicBool {
        AtomicBool::new(false)
    }

    #[test]
    fn test_segmenter_config_flags_override_settings() {
        let mut settings = settings();
        settings.logs.prefix = "FromConfig".to_string();

        let args = LogsArgs {
            directory: Some(PathBuf::from("/tmp/logs")),
            prefix: Some("Sync".to_string()),
            begin: None,
            end: Some("END".to_string()),
        };
        let config = segmenter_config(&settings, &args).unwrap();
        assert_eq!(config.directory, PathBuf::from("/tmp/logs"));
        assert_eq!(config.prefix, "Sync");
        assert_eq!(config.begin_sentinel, settings.logs.begin_sentinel);
        assert_eq!(config.end_sentinel, "END");
    }

    #[test]
    fn test_segmenter_config_rejects_empty_sentinel() {
        let args = LogsArgs {
            begin: Some(String::new()),
            ..LogsArgs::default()
        };
        assert!(segmenter_config(&settings(), &args).is_err());
    }

    #[test]
    fn test_capture_logs_writes_sessions_and_notices() {
        let dir = TempDir::new().unwrap();
        let args = LogsArgs {
            directory: Some(dir.path().to_path_buf()),
            prefix: Some("Sync".to_string()),
            begin: Some("BEGIN".to_string()),
            end: Some("END".to_string()),
        };
        let input = "noise\n05-16 11:18:46.355 I/SyncAdapter(1): BEGIN\nbody\n05-16 11:18:47.000 I/SyncAdapter(1): END\nafter\n";

        let mut out = Vec::new();
        let summary =
            capture_logs(&settings(), &args, input.as_bytes(), &mut out, &running()).unwrap();

        assert_eq!(summary.lines, 5);
        assert_eq!(summary.sessions.len(), 1);
        let path = &summary.sessions[0];
        assert_eq!(
            fs::read_to_string(path).unwrap(),
            "05-16 11:18:46.355 I/SyncAdapter(1): BEGIN\nbody\n05-16 11:18:47.000 I/SyncAdapter(1): END\n"
        );

        let notices = String::from_utf8(out).unwrap();
        assert_eq!(
            notices,
            format!(
                "Logging to file {} ...\ndone. {} (3 lines)\n",
                path.display(),
                path.display()
            )
        );

        // Same input again: the session is already captured
        let mut out = Vec::new();
        let summary =
            capture_logs(&settings(), &args, input.as_bytes(), &mut out, &running()).unwrap();
        assert!(summary.sessions.is_empty());
        assert_eq!(summary.skipped, 1);
        let notices = String::from_utf8(out).unwrap();
        assert!(notices.ends_with(&format!("skipped ({}).\n", SkipReason::AlreadyCaptured)));
    }

    #[test]
    fn test_capture_logs_stops_when_interrupted() {
        let dir = TempDir::new().unwrap();
        let args = LogsArgs {
            directory: Some(dir.path().to_path_buf()),
            ..LogsArgs::default()
        };
        let input = "05-16 11:18:46.355 I/SyncAdapter(1): Got onPerformSync. Extras bundle is X\n";

        let mut out = Vec::new();
        let summary =
            capture_logs(&settings(), &args, input.as_bytes(), &mut out, &AtomicBool::new(true))
                .unwrap();
        assert!(summary.interrupted);
        assert_eq!(summary.lines, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_dropped_session_notice() {
        let mut out = Vec::new();
        let action = SegmenterAction::Dropped {
            path: PathBuf::from("/tmp/FxSync-1.txt"),
            lines: 3,
            error: "disk full".to_string(),
        };
        write_notice(&mut out, &action).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "failed. /tmp/FxSync-1.txt (3 lines): disk full\n"
        );
    }

    #[test]
    fn test_capture_logs_needs_existing_directory() {
        let dir = TempDir::new().unwrap();
        let args = LogsArgs {
            directory: Some(dir.path().join("missing")),
            ..LogsArgs::default()
        };
        let err = capture_logs(&settings(), &args, "".as_bytes(), &mut Vec::new(), &running())
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }

    #[test]
    fn test_show_tree_from_csv() {
        let dir = TempDir::new().unwrap();
        let rows = dir.path().join("rows.csv");
        fs::write(&rows, "1,g1,0,0,Mobile\n2,g2,1,0,\"Hello, world\"\n3,g3,9,0,Orphan\n").unwrap();

        let args = TreeArgs {
            input: rows,
            csv: true,
            format: TreeFormat::Text,
            verbose: false,
        };
        let mut out = Vec::new();
        show_tree(&settings(), &args, &mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "places\n  Mobile\n    Hello, world\n"
        );
    }

    #[test]
    fn test_show_tree_missing_database() {
        let dir = TempDir::new().unwrap();
        let args = TreeArgs {
            input: dir.path().join("browser.db"),
            csv: false,
            format: TreeFormat::Html,
            verbose: false,
        };
        let err = show_tree(&settings(), &args, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("No such database"));
    }
}
