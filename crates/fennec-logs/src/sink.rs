//! Where session files are written.

use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::Path;

/// Storage for session files.
pub trait OutputMedium {
    type Sink: Write;

    /// Whether a target with this name is already present.
    fn exists(&self, path: &Path) -> bool;

    /// Create a new target. Must fail rather than overwrite an existing one.
    fn create(&mut self, path: &Path) -> io::Result<Self::Sink>;
}

/// Session files on the local filesystem.
///
/// Sinks are line-buffered so an interrupted capture keeps every complete line.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectoryMedium;

impl OutputMedium for DirectoryMedium {
    type Sink = LineWriter<File>;

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create(&mut self, path: &Path) -> io::Result<Self::Sink> {
        let file = OpenOptions::new().write(true).create_new(true).open(path)?;
        Ok(LineWriter::new(file))
    }
}
