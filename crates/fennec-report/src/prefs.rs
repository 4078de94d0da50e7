//! Shared preference dumps.

use std::fmt::Write;

use fennec_device::{run_as, Device};
use tracing::{debug, info, warn};

use crate::error::ReportError;

/// One `shared_prefs/*.xml` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrefsFile {
    pub name: String,
    pub contents: String,
}

/// Read every XML file in `<device_root>/shared_prefs`.
///
/// Listing the directory must succeed; a file that can't be read is logged
/// and left out.
pub fn dump_prefs<D: Device + ?Sized>(
    device: &D,
    package: &str,
    device_root: &str,
) -> Result<Vec<PrefsFile>, ReportError> {
    let dir = format!("{device_root}/shared_prefs");
    debug!(dir = %dir, "Listing shared preferences");
    let listing = run_as(device, package, &format!("ls {dir}"))?;

    let mut files = Vec::new();
    for name in listing.lines().map(str::trim) {
        if name.is_empty() || !name.ends_with(".xml") {
            continue;
        }
        match run_as(device, package, &format!("cat {dir}/{name}")) {
            Ok(contents) => files.push(PrefsFile {
                name: name.to_string(),
                contents,
            }),
            Err(err) => warn!(file = name, error = %err, "Couldn't read preferences"),
        }
    }

    info!(files = files.len(), "Read shared preferences");
    Ok(files)
}

/// `FILE: <name>` followed by the contents indented four spaces.
pub fn format_prefs(files: &[PrefsFile]) -> String {
    let mut out = String::new();
    for file in files {
        let _ = writeln!(out, "FILE: {}", file.name);
        for line in file.contents.lines() {
            let _ = writeln!(out, "    {}", line.trim_end_matches('\r'));
        }
    }
    out
}
