//! Flat bookmark rows as read from `browser.db`.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Query producing the rows the tree is built from.
pub const BOOKMARKS_TREE_SQL: &str =
    "select _id, guid, parent, position, title from bookmarks order by _id;";

/// One row of the bookmarks table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Android row id (`_id`). Zero is reserved for the synthetic root.
    pub id: i64,
    /// Sync GUID, carried for display only.
    pub guid: String,
    /// Row id of the containing folder, 0 for top level.
    pub parent: i64,
    /// Sort key among siblings.
    pub position: i64,
    pub title: String,
}

impl Record {
    pub fn new(
        id: i64,
        guid: impl Into<String>,
        parent: i64,
        position: i64,
        title: impl Into<String>,
    ) -> Self {
        Self {
            id,
            guid: guid.into(),
            parent,
            position,
            title: title.into(),
        }
    }

    /// Parse one `sqlite3 -csv` row of [`BOOKMARKS_TREE_SQL`].
    ///
    /// The first four fields never contain commas; everything after the
    /// fourth comma is the title, so unquoted titles with commas survive.
    pub fn parse_csv_line(line: &str, line_no: usize) -> Result<Self, RecordParseError> {
        let line = line.trim_end_matches(&['\r', '\n'][..]);
        let fields: Vec<&str> = line.splitn(5, ',').collect();
        if fields.len() < 5 {
            return Err(RecordParseError::MissingFields {
                line: line_no,
                found: fields.len(),
            });
        }

        Ok(Self {
            id: parse_number(fields[0], "_id", line_no)?,
            guid: unquote(fields[1]),
            parent: parse_number(fields[2], "parent", line_no)?,
            position: parse_number(fields[3], "position", line_no)?,
            title: unquote(fields[4]),
        })
    }
}

/// A bookmark row that could not be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecordParseError {
    #[error("line {line}: expected 5 fields, found {found}")]
    MissingFields { line: usize, found: usize },

    #[error("line {line}: invalid {field} value {value:?}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },
}

fn parse_number(raw: &str, field: &'static str, line: usize) -> Result<i64, RecordParseError> {
    let trimmed = unquote(raw);
    trimmed
        .trim()
        .parse()
        .map_err(|_| RecordParseError::InvalidNumber {
            line,
            field,
            value: raw.to_string(),
        })
}

fn unquote(field: &str) -> String {
    match field
        .strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
    {
        Some(inner) => inner.replace("\"\"", "\""),
        None => field.to_string(),
    }
}

/// Parse the whole CSV output of [`BOOKMARKS_TREE_SQL`].
///
/// Blank lines are ignored. Quoted fields spanning several lines are joined
/// back together. Rows that fail to parse are logged and skipped.
pub fn parse_csv_records(text: &str) -> Vec<Record> {
    let mut records = Vec::new();
    let mut pending = String::new();
    let mut start_line = 0;

    for (idx, line) in text.lines().enumerate() {
        if pending.is_empty() {
            if line.trim().is_empty() {
                continue;
            }
            start_line = idx + 1;
            pending.push_str(line);
        } else {
            pending.push('\n');
            pending.push_str(line);
        }

        // An odd quote count means a quoted field continues on the next line
        if pending.matches('"').count() % 2 == 1 {
            continue;
        }

        match Record::parse_csv_line(&pending, start_line) {
            Ok(record) => records.push(record),
            Err(err) => warn!(error = %err, "Skipping bookmark row"),
        }
        pending.clear();
    }

    if !pending.is_empty() {
        warn!(line = start_line, "Skipping unterminated bookmark row");
    }

    records
}
