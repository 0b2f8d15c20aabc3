use std::sync::atomic::{AtomicUsize, Ordering};

/// A point-in-time read of a tree's counters.
///
/// Each field is loaded separately, so a snapshot taken while another thread
/// is mutating the tree may mix values from before and after that change.
/// These numbers are for diagnostics; nothing in the tree depends on them.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Statistics {
    /// Nodes currently linked into the tree.
    pub node_count: usize,
    /// Inserts that linked a new node. Duplicate-key inserts are not counted.
    pub insertion_count: usize,
    /// Deletes that removed a node. Misses are not counted.
    pub deletion_count: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    nodes: AtomicUsize,
    insertions: AtomicUsize,
    deletions: AtomicUsize,
}

impl Counters {
    pub(crate) fn record_insert(&self) {
        self.insertions.fetch_add(1, Ordering::Relaxed);
        self.nodes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_delete(&self) {
        self.deletions.fetch_add(1, Ordering::Relaxed);
        self.nodes.fetch_sub(1, Ordering::Relaxed);
    }

    /// Accounts for nodes freed by teardown, which are not deletions.
    pub(crate) fn record_teardown(&self, freed: usize) {
        self.nodes.fetch_sub(freed, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> Statistics {
        Statistics {
            node_count: self.nodes.load(Ordering::Relaxed),
            insertion_count: self.insertions.load(Ordering::Relaxed),
            deletion_count: self.deletions.load(Ordering::Relaxed),
        }
    }
}
