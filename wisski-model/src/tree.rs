//! Hierarchical index over pathbuilder paths.
//!
//! A [`PathTree`] is built from an unordered list of [`PathRecord`]s. A record
//! can only be attached once its parent is attached, so [`PathTree::add_paths`]
//! retries records in passes until a pass makes no progress. Records whose
//! parent never appears are reported in the [`InsertReport`] instead of being
//! retried forever.
//!
//! The tree only grows: nodes are never removed or moved.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{ModelError, ModelResult};
use crate::pathbuilder::PathbuilderRecord;
use crate::record::{PathRecord, ROOT_ID};

/// A node of the path tree. The root node carries no record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeNode {
    id: String,
    children: Vec<String>,
}

impl TreeNode {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Child path ids in insertion order.
    pub fn children(&self) -> &[String] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.id == ROOT_ID
    }
}

/// Outcome of a batch insertion.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InsertReport {
    pub offered: usize,
    pub inserted: usize,
    pub disabled: usize,
    pub duplicates: usize,
    /// Ids of records whose parent never became available.
    pub unattached: Vec<String>,
    pub passes: usize,
}

impl InsertReport {
    /// True if every record was either attached or deliberately rejected.
    pub fn is_complete(&self) -> bool {
        self.unattached.is_empty()
    }

    /// Converts a stalled insertion into [`ModelError::TreeInsertionStall`].
    pub fn into_result(self) -> ModelResult<usize> {
        if self.is_complete() {
            Ok(self.inserted)
        } else {
            Err(ModelError::TreeInsertionStall {
                inserted: self.inserted,
                offered: self.offered,
                unattached: self.unattached,
            })
        }
    }
}

enum Admission {
    Accept,
    Disabled,
    Duplicate,
    ParentMissing,
}

/// The schema tree of one or more pathbuilders.
#[derive(Debug, Clone)]
pub struct PathTree {
    id: String,
    nodes: HashMap<String, TreeNode>,
    records: HashMap<String, PathRecord>,
    /// Attached record ids in insertion order.
    order: Vec<String>,
}

impl PathTree {
    /// Creates an empty tree holding only the root node.
    pub fn new(id: &str) -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(ROOT_ID.to_string(), TreeNode::new(ROOT_ID));
        Self {
            id: id.to_string(),
            nodes,
            records: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Builds a tree from a schema source record.
    pub fn from_record(record: &PathbuilderRecord) -> (Self, InsertReport) {
        let mut tree = Self::new(&record.id);
        let report = tree.add_paths(record.paths.iter().cloned());
        (tree, report)
    }

    /// Builds a tree named `id` by combining `trees` in order.
    ///
    /// On id collisions the record seen first is kept.
    pub fn combined<'a>(id: &str, trees: impl IntoIterator<Item = &'a PathTree>) -> Self {
        let mut combined = Self::new(id);
        for tree in trees {
            combined.combine(tree);
        }
        combined
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn root(&self) -> &TreeNode {
        &self.nodes[ROOT_ID]
    }

    /// Number of attached records.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, path_id: &str) -> bool {
        self.records.contains_key(path_id)
    }

    /// The record attached under `path_id`.
    pub fn record(&self, path_id: &str) -> Option<&PathRecord> {
        self.records.get(path_id)
    }

    /// The record a node stands for; `None` for the root.
    pub fn record_for(&self, node: &TreeNode) -> Option<&PathRecord> {
        self.records.get(&node.id)
    }

    pub fn node(&self, path_id: &str) -> Option<&TreeNode> {
        self.nodes.get(path_id)
    }

    /// The node a path is attached under.
    pub fn parent_of(&self, path_id: &str) -> Option<&TreeNode> {
        let record = self.records.get(path_id)?;
        self.nodes.get(parent_key(record))
    }

    /// All attached records in insertion order.
    pub fn records(&self) -> impl Iterator<Item = &PathRecord> + '_ {
        self.order.iter().filter_map(|id| self.records.get(id))
    }

    /// Records of the direct children of `node`.
    pub fn children<'a>(&'a self, node: &'a TreeNode) -> impl Iterator<Item = &'a PathRecord> + 'a {
        node.children.iter().filter_map(|id| self.records.get(id))
    }

    /// Attaches one record. Returns false without touching the tree if the
    /// record is disabled, already present, or its parent is not attached.
    pub fn add_path(&mut self, record: PathRecord) -> bool {
        match self.admission(&record) {
            Admission::Accept => {
                self.insert(record);
                true
            }
            _ => false,
        }
    }

    /// Attaches a batch of records, retrying those whose parent is missing
    /// until a pass attaches nothing new.
    ///
    /// Groups are offered first, then fields by descending id.
    pub fn add_paths(&mut self, records: impl IntoIterator<Item = PathRecord>) -> InsertReport {
        let mut pending: Vec<PathRecord> = records.into_iter().collect();
        pending.sort_by(|a, b| match (a.is_group, b.is_group) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => b.id.cmp(&a.id),
        });

        let mut report = InsertReport {
            offered: pending.len(),
            ..InsertReport::default()
        };

        while !pending.is_empty() {
            report.passes += 1;
            let before = report.inserted;
            let mut retry = Vec::new();

            for record in pending {
                match self.admission(&record) {
                    Admission::Accept => {
                        self.insert(record);
                        report.inserted += 1;
                    }
                    Admission::Disabled => report.disabled += 1,
                    Admission::Duplicate => report.duplicates += 1,
                    Admission::ParentMissing => retry.push(record),
                }
            }

            debug!(
                tree = %self.id,
                pass = report.passes,
                attached = report.inserted - before,
                remaining = retry.len(),
                "path insertion pass"
            );

            pending = retry;
            if report.inserted == before {
                break;
            }
        }

        if !pending.is_empty() {
            report.unattached = pending.into_iter().map(|r| r.id).collect();
            warn!(
                tree = %self.id,
                offered = report.offered,
                inserted = report.inserted,
                unattached = ?report.unattached,
                "path insertion stalled on missing parents"
            );
        }

        report
    }

    /// Folds every record of `other` into this tree. Records whose id is
    /// already present are skipped, so the earlier source wins.
    pub fn combine(&mut self, other: &PathTree) -> &mut Self {
        let report = self.add_paths(other.records().cloned());
        debug!(
            tree = %self.id,
            source = %other.id,
            inserted = report.inserted,
            duplicates = report.duplicates,
            "combined pathbuilder"
        );
        self
    }

    /// First node in pre-order whose record has `field_id` or `bundle_id`
    /// equal to `needle`.
    pub fn get_subtree_for_field_id(&self, needle: &str) -> ModelResult<&TreeNode> {
        self.find_in(self.root(), needle)
            .ok_or_else(|| ModelError::SchemaLookup(needle.to_string()))
    }

    /// The first attached record for a field id. Absence is not an error:
    /// unknown fields are passed through by the entity mapping.
    pub fn get_path_for_id(&self, field_id: &str) -> Option<&PathRecord> {
        self.records().find(|r| r.field_id == field_id)
    }

    /// Child records of the bundle `bundle_id`.
    pub fn bundle_fields(&self, bundle_id: &str) -> ModelResult<Vec<&PathRecord>> {
        let node = self.get_subtree_for_field_id(bundle_id)?;
        Ok(self.children(node).collect())
    }

    fn find_in<'a>(&'a self, node: &'a TreeNode, needle: &str) -> Option<&'a TreeNode> {
        if let Some(record) = self.records.get(&node.id) {
            if record.field_id == needle || record.bundle_id == needle {
                return Some(node);
            }
        }
        node.children
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .find_map(|child| self.find_in(child, needle))
    }

    fn admission(&self, record: &PathRecord) -> Admission {
        if !record.enabled {
            Admission::Disabled
        } else if self.nodes.contains_key(&record.id) {
            Admission::Duplicate
        } else if !self.nodes.contains_key(parent_key(record)) {
            Admission::ParentMissing
        } else {
            Admission::Accept
        }
    }

    fn insert(&mut self, record: PathRecord) {
        let parent = parent_key(&record).to_string();
        if let Some(node) = self.nodes.get_mut(&parent) {
            node.children.push(record.id.clone());
        }
        self.nodes.insert(record.id.clone(), TreeNode::new(&record.id));
        self.order.push(record.id.clone());
        self.records.insert(record.id.clone(), record);
    }
}

fn parent_key(record: &PathRecord) -> &str {
    if record.has_root_parent() {
        ROOT_ID
    } else {
        &record.parent_id
    }
}
