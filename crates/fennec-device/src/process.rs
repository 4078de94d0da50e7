//! Running external executables.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, trace};

use crate::error::DeviceError;

/// Resolve `program` on `PATH`, or as given when it contains a path separator.
pub(crate) fn locate(program: &str) -> Result<PathBuf, DeviceError> {
    which::which(program).map_err(|e| DeviceError::ToolNotFound {
        tool: program.to_string(),
        reason: e.to_string(),
    })
}

/// Run to completion and return stdout; non-zero exit is an error.
pub(crate) fn run(program: &Path, args: &[&str]) -> Result<String, DeviceError> {
    let command = describe(program, args);
    debug!(command = %command, "Running");

    let output = Command::new(program)
        .args(args)
        .output()
        .map_err(|source| DeviceError::Spawn {
            command: command.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(DeviceError::CommandFailed {
            command,
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    trace!(command = %command, bytes = stdout.len(), "Command finished");
    Ok(stdout)
}

fn describe(program: &Path, args: &[&str]) -> String {
    let mut parts = vec![program.display().to_string()];
    parts.extend(args.iter().map(|a| {
        if a.contains(' ') {
            format!("'{a}'")
        } else {
            a.to_string()
        }
    }));
    parts.join(" ")
}
