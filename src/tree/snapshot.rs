use crate::state::CrawlStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// An owned, serializable copy of a (sub)tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeSnapshot {
    pub name: String,
    #[serde(default)]
    pub children: Vec<TreeSnapshot>,
}

impl TreeSnapshot {
    /// Creates a leaf
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Looks up a direct child by name
    pub fn child(&self, name: &str) -> Option<&TreeSnapshot> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Total number of nodes, including this one
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(TreeSnapshot::node_count)
            .sum::<usize>()
    }

    /// Every node below the root as a `/`-joined path, sorted
    pub fn paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        for child in &self.children {
            child.collect_paths("", &mut paths);
        }
        paths.sort();
        paths
    }

    /// Returns the path of the first parent found with two children of the same name
    ///
    /// A tree built by [`crate::tree::Node::insert`] never has one; this exists
    /// to check that.
    pub fn find_duplicate(&self) -> Option<String> {
        self.find_duplicate_below(&self.name)
    }

    fn find_duplicate_below(&self, path: &str) -> Option<String> {
        let mut seen = HashSet::new();
        for child in &self.children {
            if !seen.insert(child.name.as_str()) {
                return Some(format!("{}/{}", path, child.name));
            }
        }

        self.children.iter().find_map(|child| {
            child.find_duplicate_below(&format!("{}/{}", path, child.name))
        })
    }

    fn collect_paths(&self, prefix: &str, out: &mut Vec<String>) {
        let path = if prefix.is_empty() {
            self.name.clone()
        } else {
            format!("{}/{}", prefix, self.name)
        };
        for child in &self.children {
            child.collect_paths(&path, out);
        }
        out.push(path);
    }
}

/// What `list` returns for a site: the tree plus the session's progress
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeListing {
    pub site: String,
    pub status: CrawlStatus,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub urls_processed: u64,
    pub tree: TreeSnapshot,
}
