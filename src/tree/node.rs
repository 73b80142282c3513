//! Concurrent path-segment tree
//!
//! Each node owns its child list behind its own mutex. Inserting a path
//! locks one parent at a time: "scan children, append if absent" runs as a
//! single critical section, and the descent into the child happens after the
//! guard is released. Writers under different parents never contend, and two
//! writers racing to create the same name under one parent always end up
//! sharing a single child.

use crate::tree::TreeSnapshot;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A node in the site tree, named after one URL path segment
#[derive(Debug)]
pub struct Node {
    name: String,
    children: Mutex<Vec<Arc<Node>>>,
}

impl Node {
    /// Creates a node with no children
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Mutex::new(Vec::new()),
        }
    }

    /// The segment name (or the site key, for the root)
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Inserts a segment sequence below this node
    ///
    /// Existing nodes are reused, so inserting the same path twice leaves the
    /// tree unchanged. An empty segment stops the insertion at that point
    /// without creating anything further.
    ///
    /// # Returns
    ///
    /// The number of nodes this call created.
    ///
    /// # Example
    ///
    /// ```
    /// use sitetree::tree::Node;
    ///
    /// let root = Node::new("example.com");
    /// assert_eq!(root.insert(&["a", "b"]), 2);
    /// assert_eq!(root.insert(&["a", "c"]), 1);
    /// assert_eq!(root.insert(&["a", "b"]), 0);
    /// assert_eq!(root.node_count(), 4);
    /// ```
    pub fn insert<S: AsRef<str>>(&self, segments: &[S]) -> usize {
        let mut created = 0;
        let mut current: Option<Arc<Node>> = None;

        for segment in segments {
            let name = segment.as_ref();
            if name.is_empty() {
                break;
            }

            let parent = current.as_deref().unwrap_or(self);
            let (child, is_new) = parent.find_or_create(name);
            if is_new {
                tracing::trace!("Added {} under {}", name, parent.name);
                created += 1;
            }
            current = Some(child);
        }

        created
    }

    /// Looks up a direct child by name
    pub fn child(&self, name: &str) -> Option<Arc<Node>> {
        self.lock_children()
            .iter()
            .find(|child| child.name == name)
            .cloned()
    }

    /// Returns a copy of the current child list, in insertion order
    pub fn children(&self) -> Vec<Arc<Node>> {
        self.lock_children().clone()
    }

    /// Number of direct children
    pub fn child_count(&self) -> usize {
        self.lock_children().len()
    }

    /// Total number of nodes in this subtree, including this one
    pub fn node_count(&self) -> usize {
        1 + self
            .children()
            .iter()
            .map(|child| child.node_count())
            .sum::<usize>()
    }

    /// Takes an owned copy of this subtree
    ///
    /// Only one child list is locked at a time, so the copy is not atomic with
    /// respect to concurrent inserts: it may include some paths inserted while
    /// it was being taken and miss others. Every node it contains did exist.
    pub fn snapshot(&self) -> TreeSnapshot {
        TreeSnapshot {
            name: self.name.clone(),
            children: self
                .children()
                .iter()
                .map(|child| child.snapshot())
                .collect(),
        }
    }

    fn find_or_create(&self, name: &str) -> (Arc<Node>, bool) {
        let mut children = self.lock_children();
        if let Some(existing) = children.iter().find(|child| child.name == name) {
            return (Arc::clone(existing), false);
        }

        let child = Arc::new(Node::new(name));
        children.push(Arc::clone(&child));
        (child, true)
    }

    // Child lists are append-only, so a panic while holding the guard cannot
    // leave one half-written.
    fn lock_children(&self) -> MutexGuard<'_, Vec<Arc<Node>>> {
        self.children.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
