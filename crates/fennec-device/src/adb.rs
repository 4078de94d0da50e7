//! Device access over `adb`.
//!
//! Application files under `/data/data/<package>` are only readable by the
//! application's user, so reads go through `run-as <package> ...`.

use std::path::{Path, PathBuf};

use crate::error::DeviceError;
use crate::process;

/// Remote shell and file transfer.
pub trait Device {
    /// Run a shell command on the device and return its output.
    fn shell(&self, command: &str) -> Result<String, DeviceError>;

    /// Copy a world-readable file from the device to `local`.
    fn pull(&self, remote: &str, local: &Path) -> Result<String, DeviceError>;
}

/// Run `command` on the device as the user owning `package`.
pub fn run_as<D: Device + ?Sized>(
    device: &D,
    package: &str,
    command: &str,
) -> Result<String, DeviceError> {
    device.shell(&format!("run-as {package} {command}"))
}

/// The default device as seen by the `adb` executable.
#[derive(Debug, Clone)]
pub struct Adb {
    program: PathBuf,
}

impl Adb {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Find `program` (e.g. `"adb"`) on `PATH`.
    pub fn locate(program: &str) -> Result<Self, DeviceError> {
        process::locate(program).map(Self::new)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Device for Adb {
    fn shell(&self, command: &str) -> Result<String, DeviceError> {
        process::run(&self.program, &["shell", command])
    }

    fn pull(&self, remote: &str, local: &Path) -> Result<String, DeviceError> {
        let local = local.to_string_lossy();
        process::run(&self.program, &["pull", remote, local.as_ref()])
    }
}
