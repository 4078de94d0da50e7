//! HTML page assembly.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Local};
use tracing::info;

use crate::catalog::TableSpec;
use crate::error::ReportError;
use crate::section::{Section, SkipReason};

const STYLE: &str =
    "table { border-collapse: collapse; } td, th { border: 1px solid LightGray; }";

/// A finished database dump.
#[derive(Debug, Clone)]
pub struct Report {
    pub generated: DateTime<Local>,
    pub sections: Vec<Section>,
    pub skipped: Vec<(TableSpec, SkipReason)>,
}

impl Report {
    pub fn new(generated: DateTime<Local>) -> Self {
        Self {
            generated,
            sections: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Page title, e.g. `dumpdbs at 2015-03-04 10:12 (1425463920)`.
    pub fn title(&self) -> String {
        format!(
            "dumpdbs at {} ({})",
            self.generated.format("%Y-%m-%d %H:%M"),
            self.generated.timestamp()
        )
    }

    /// The complete HTML document.
    pub fn render_page(&self) -> String {
        let title = html_escape::encode_text(&self.title()).into_owned();
        let mut out = format!(
            "<html><head><title>{title}</title><style>{STYLE}</style></head><body><h1>{title}</h1>\n"
        );
        for section in &self.sections {
            out.push_str(&section.to_html());
        }
        out.push_str("</body></html>\n");
        out
    }

    /// Write the page to `path`, replacing any existing file.
    pub fn write_to(&self, path: &Path) -> Result<(), ReportError> {
        fs::write(path, self.render_page()).map_err(|source| ReportError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), sections = self.sections.len(), "Wrote report");
        Ok(())
    }
}
