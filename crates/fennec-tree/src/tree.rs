//! Bookmark tree builder.
//!
//! Rows reference their folder by `parent` id. The builder groups rows by
//! parent and resolves groups from a synthetic `places` root with a work-list,
//! sorting each group by `position` once when it is attached.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, trace};

use crate::record::Record;

/// Id of the synthetic root. Rows using it are ignored.
pub const ROOT_ID: i64 = 0;

/// GUID and title of the synthetic root.
pub const ROOT_GUID: &str = "places";

/// A bookmark or folder with its ordered children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    #[serde(flatten)]
    pub record: Record,
    pub children: Vec<Node>,
}

impl Node {
    /// Wrap a record as a leaf.
    pub fn new(record: Record) -> Self {
        Self {
            record,
            children: Vec::new(),
        }
    }

    /// The synthetic `places` root.
    pub fn root() -> Self {
        Self::new(Record::new(ROOT_ID, ROOT_GUID, ROOT_ID, 0, ROOT_GUID))
    }

    pub fn id(&self) -> i64 {
        self.record.id
    }

    pub fn title(&self) -> &str {
        &self.record.title
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of nodes in this subtree, including this one.
    pub fn node_count(&self) -> usize {
        self.walk().count()
    }

    /// Pre-order traversal yielding `(depth, node)`, children in stored order.
    pub fn walk(&self) -> Walk<'_> {
        Walk {
            stack: vec![(0, self)],
        }
    }
}

/// Pre-order iterator over a [`Node`] subtree.
pub struct Walk<'a> {
    stack: Vec<(usize, &'a Node)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|child| (depth + 1, child)));
        Some((depth, node))
    }
}

/// Counts gathered while building a tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// Rows attached somewhere under the root
    pub attached: usize,
    /// Rows ignored because they used the root id
    pub reserved_ids: usize,
    /// Rows whose parent was never reached from the root
    pub unreachable: usize,
}

/// A built tree with its build statistics.
#[derive(Debug, Clone)]
pub struct BookmarkTree {
    pub root: Node,
    pub stats: BuildStats,
}

/// Collects rows and builds the tree.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    /// Rows keyed by parent id, in input order
    groups: HashMap<i64, Vec<Record>>,
    reserved_ids: usize,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a row. Rows with the reserved root id are counted and dropped.
    pub fn add_record(&mut self, record: Record) {
        if record.id == ROOT_ID {
            trace!(guid = %record.guid, "Ignoring row with reserved id");
            self.reserved_ids += 1;
            return;
        }
        self.groups.entry(record.parent).or_default().push(record);
    }

    /// Resolve all groups reachable from the root.
    ///
    /// Each group is taken at most once, so duplicate ids or cycles cannot
    /// make the traversal loop; whatever is left over is unreachable.
    pub fn build(mut self) -> BookmarkTree {
        let mut root = Node::root();
        let mut attached = 0;

        {
            let mut pending: Vec<&mut Node> = vec![&mut root];
            while let Some(node) = pending.pop() {
                let Some(mut group) = self.groups.remove(&node.id()) else {
                    continue;
                };

                // Stable: equal positions keep input order
                group.sort_by_key(|record| record.position);
                attached += group.len();

                node.children = group.into_iter().map(Node::new).collect();
                pending.extend(node.children.iter_mut());
            }
        }

        let unreachable = self.groups.values().map(Vec::len).sum();
        let stats = BuildStats {
            attached,
            reserved_ids: self.reserved_ids,
            unreachable,
        };

        debug!(
            attached = stats.attached,
            reserved_ids = stats.reserved_ids,
            unreachable = stats.unreachable,
            "Built bookmark tree"
        );

        BookmarkTree { root, stats }
    }
}

impl Extend<Record> for TreeBuilder {
    fn extend<T: IntoIterator<Item = Record>>(&mut self, records: T) {
        for record in records {
            self.add_record(record);
        }
    }
}

/// Build a tree from rows, discarding statistics.
pub fn build_tree(records: impl IntoIterator<Item = Record>) -> Node {
    let mut builder = TreeBuilder::new();
    builder.extend(records);
    builder.build().root
}
