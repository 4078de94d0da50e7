//! Bookmark tree reconstruction for Fennec database dumps.
//!
//! Provides:
//! - Parsing of `sqlite3 -csv` bookmark rows into [`Record`]s
//! - Building an ordered tree under a synthetic `places` root
//! - Rendering the tree as nested HTML lists, an indented outline, or JSON

pub mod record;
pub mod render;
pub mod tree;

pub use record::{parse_csv_records, Record, RecordParseError, BOOKMARKS_TREE_SQL};
pub use render::{render_html, render_json, render_text};
pub use tree::{build_tree, BookmarkTree, BuildStats, Node, TreeBuilder, ROOT_GUID, ROOT_ID};
