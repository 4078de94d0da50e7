//! Copying database files off the device.
//!
//! Application files cannot be pulled directly, so each file is first copied
//! with `run-as <package> dd` to a world-readable staging directory, pulled,
//! and the staged copy removed.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use fennec_device::{run_as, Device, DeviceError};
use tracing::{debug, info, warn};

use crate::catalog::{DbLocation, TableSpec};

/// Where files come from and go to.
#[derive(Debug, Clone)]
pub struct PullPlan {
    /// Package passed to `run-as`
    pub package: String,
    /// Application data directory on the device
    pub device_root: String,
    /// Exact profile directory name under `files/mozilla`
    pub profile: Option<String>,
    /// World-readable directory on the device, e.g. `/sdcard`
    pub staging_dir: String,
    /// Local directory to pull into
    pub local_dir: PathBuf,
    /// Suffix making staged and local names unique per run
    pub timestamp: i64,
}

/// Result of pulling every database needed by a set of tables.
#[derive(Debug, Default)]
pub struct PulledDatabases {
    copied: BTreeMap<String, PathBuf>,
    failed: BTreeMap<String, String>,
}

impl PulledDatabases {
    /// Local copy of `db`, if it was pulled.
    pub fn local_path(&self, db: &str) -> Option<&Path> {
        self.copied.get(db).map(PathBuf::as_path)
    }

    /// Why `db` was not pulled, if it was attempted and failed.
    pub fn failure(&self, db: &str) -> Option<&str> {
        self.failed.get(db).map(String::as_str)
    }

    pub fn copied_count(&self) -> usize {
        self.copied.len()
    }

    pub fn attempted_count(&self) -> usize {
        self.copied.len() + self.failed.len()
    }

    pub fn local_files(&self) -> impl Iterator<Item = &Path> {
        self.copied.values().map(PathBuf::as_path)
    }
}

/// Pull each distinct database referenced by `tables`.
///
/// Failures are recorded per database and never abort the run.
pub fn pull_databases<D: Device + ?Sized>(
    device: &D,
    plan: &PullPlan,
    tables: &[TableSpec],
) -> PulledDatabases {
    let files: BTreeSet<(DbLocation, &str)> = tables
        .iter()
        .map(|spec| (spec.location, spec.db.as_str()))
        .collect();

    info!(files = files.len(), "Copying database files");
    let mut pulled = PulledDatabases::default();

    for (location, db) in files {
        let Some(dir) = location.remote_dir(&plan.device_root, plan.profile.as_deref()) else {
            warn!(db, "No profile directory given, not copying");
            pulled
                .failed
                .insert(db.to_string(), "no profile directory given".to_string());
            continue;
        };

        let remote = format!("{dir}/{db}");
        let staged = format!("{}/{db}-{}", plan.staging_dir, plan.timestamp);
        let local = plan.local_dir.join(format!("{db}-{}", plan.timestamp));

        match copy_one(device, plan, &remote, &staged, &local) {
            Ok(()) => {
                debug!(db, local = %local.display(), "Copied database");
                pulled.copied.insert(db.to_string(), local);
            }
            Err(err) => {
                warn!(db, error = %err, "Couldn't dd and pull");
                pulled.failed.insert(db.to_string(), err.to_string());
                continue;
            }
        }

        // The local copy is usable even if the staged file lingers
        if let Err(err) = run_as(device, &plan.package, &format!("rm {staged}")) {
            warn!(staged = %staged, error = %err, "Couldn't remove staged copy");
        }
    }

    info!(
        copied = pulled.copied_count(),
        attempted = pulled.attempted_count(),
        "Copied database files"
    );
    pulled
}

fn copy_one<D: Device + ?Sized>(
    device: &D,
    plan: &PullPlan,
    remote: &str,
    staged: &str,
    local: &Path,
) -> Result<(), DeviceError> {
    let out = run_as(device, &plan.package, &format!("dd if={remote} of={staged}"))?;
    debug!(output = out.trim(), "dd");
    let out = device.pull(staged, local)?;
    debug!(output = out.trim(), "pull");
    Ok(())
}

/// Delete pulled files, or with `keep` make sure their names end up
/// mentioning `sqlite`. Returns the paths of kept files.
pub fn cleanup_pulled(pulled: &PulledDatabases, keep: bool) -> Vec<PathBuf> {
    let mut kept = Vec::new();

    for path in pulled.local_files() {
        if !keep {
            if let Err(err) = fs::remove_file(path) {
                warn!(path = %path.display(), error = %err, "Couldn't remove");
            }
            continue;
        }

        let mut final_path = path.to_path_buf();
        if !path.to_string_lossy().contains("sqlite") {
            let renamed = PathBuf::from(format!("{}.sqlite", path.display()));
            match fs::rename(path, &renamed) {
                Ok(()) => final_path = renamed,
                Err(err) => warn!(path = %path.display(), error = %err, "Couldn't rename"),
            }
        }
        info!(path = %final_path.display(), "Kept database file");
        kept.push(final_path);
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::default_catalog;
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Pretends to be a device; pulls write a small file locally.
    #[derive(Default)]
    struct FakeDevice {
        shell_log: RefCell<Vec<String>>,
        missing: Vec<&'static str>,
    }

    impl Device for FakeDevice {
        fn shell(&self, command: &str) -> Result<String, DeviceError> {
            self.shell_log.borrow_mut().push(command.to_string());
            if self.missing.iter().any(|m| command.contains(m)) {
                return Err(DeviceError::CommandFailed {
                    command: command.to_string(),
                    status: "exit status: 1".to_string(),
                    stderr: "No such file or directory".to_string(),
                });
            }
            Ok(String::new())
        }

        fn pull(&self, remote: &str, local: &Path) -> Result<String, DeviceError> {
            fs::write(local, remote).unwrap();
            Ok(String::new())
        }
    }

    fn plan(dir: &TempDir, profile: Option<&str>) -> PullPlan {
        PullPlan {
            package: "org.mozilla.fennec_me".to_string(),
            device_root: "/data/data/org.mozilla.fennec_me".to_string(),
            profile: profile.map(str::to_string),
            staging_dir: "/sdcard".to_string(),
            local_dir: dir.path().to_path_buf(),
            timestamp: 1337,
        }
    }

    #[test]
    fn test_pulls_each_database_once() {
        let dir = TempDir::new().unwrap();
        let device = FakeDevice::default();
        let pulled = pull_databases(&device, &plan(&dir, Some("x.default")), &default_catalog());

        // browser, tabs, formhistory, clients_database, history_extension_database
        assert_eq!(pulled.copied_count(), 5);
        let local = pulled.local_path("browser.db").unwrap();
        assert_eq!(local, dir.path().join("browser.db-1337"));
        assert_eq!(
            fs::read_to_string(local).unwrap(),
            "/sdcard/browser.db-1337"
        );

        let log = device.shell_log.borrow();
        assert!(log.contains(
            &"run-as org.mozilla.fennec_me dd if=/data/data/org.mozilla.fennec_me/files/mozilla/x.default/browser.db of=/sdcard/browser.db-1337".to_string()
        ));
        assert!(log.contains(&"run-as org.mozilla.fennec_me rm /sdcard/browser.db-1337".to_string()));
    }

    #[test]
    fn test_failures_are_recorded_per_database() {
        let dir = TempDir::new().unwrap();
        let device = FakeDevice {
            missing: vec!["tabs.db"],
            ..FakeDevice::default()
        };
        let pulled = pull_databases(&device, &plan(&dir, Some("x.default")), &default_catalog());

        assert!(pulled.local_path("tabs.db").is_none());
        assert!(pulled.failure("tabs.db").unwrap().contains("No such file"));
        assert!(pulled.local_path("browser.db").is_some());
        assert_eq!(pulled.attempted_count(), 5);
    }

    #[test]
    fn test_profile_databases_need_a_profile() {
        let dir = TempDir::new().unwrap();
        let device = FakeDevice::default();
        let pulled = pull_databases(&device, &plan(&dir, None), &default_catalog());

        assert!(pulled.failure("browser.db").is_some());
        assert!(pulled.local_path("clients_database").is_some());
        assert_eq!(pulled.copied_count(), 2);
    }

    #[test]
    fn test_cleanup_removes_or_renames() {
        let dir = TempDir::new().unwrap();
        let device = FakeDevice::default();
        let tables = default_catalog();

        let pulled = pull_databases(&device, &plan(&dir, Some("p")), &tables);
        let kept = cleanup_pulled(&pulled, true);
        assert!(kept.contains(&dir.path().join("browser.db-1337.sqlite")));
        assert!(kept.contains(&dir.path().join("formhistory.sqlite-1337")));
        assert!(kept.iter().all(|p| p.exists()));

        let pulled = pull_databases(&device, &plan(&dir, Some("p")), &tables);
        assert!(cleanup_pulled(&pulled, false).is_empty());
        assert!(!dir.path().join("browser.db-1337").exists());
    }
}
