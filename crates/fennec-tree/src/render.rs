//! Tree rendering.
//!
//! Children are emitted in the order fixed at build time; nothing is re-sorted here.

use std::fmt::Write;

use crate::record::Record;
use crate::tree::Node;

/// Render as nested `<ul>` lists with bold titles.
///
/// With `verbose`, each title is followed by the row's id, guid, parent id
/// and position.
pub fn render_html(node: &Node, verbose: bool) -> String {
    let mut out = String::new();
    write_html(node, verbose, &mut out);
    out
}

fn write_html(node: &Node, verbose: bool, out: &mut String) {
    out.push_str("<ul>\n");
    let _ = write!(out, "<b>{}</b>", html_escape::encode_text(&node.record.title));
    if verbose {
        let _ = write!(out, " {}", html_escape::encode_text(&metadata(&node.record)));
    }
    out.push('\n');
    for child in &node.children {
        write_html(child, verbose, out);
    }
    out.push_str("</ul>\n");
}

/// Render as an indented outline, two spaces per level.
pub fn render_text(node: &Node, verbose: bool) -> String {
    let mut out = String::new();
    for (depth, n) in node.walk() {
        let _ = write!(out, "{:indent$}{}", "", n.record.title, indent = depth * 2);
        if verbose {
            let _ = write!(out, " [{}]", metadata(&n.record));
        }
        out.push('\n');
    }
    out
}

/// Render as pretty-printed JSON.
pub fn render_json(node: &Node) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(node)
}

fn metadata(record: &Record) -> String {
    format!(
        "androidID={} guid={} parentAndroidID={} position={}",
        record.id, record.guid, record.parent, record.position
    )
}
