use std::iter::FusedIterator;

use super::RawTree;
use crate::pool::NodeId;

/// In-order walk over node handles.
///
/// Keeps an explicit stack of the left spine instead of recursing, so the
/// auxiliary memory is bounded by the tree height.
pub(crate) struct InOrder<'a, T> {
    tree: &'a RawTree<T>,
    stack: Vec<NodeId>,
    current: NodeId,
    remaining: usize,
}

impl<'a, T> InOrder<'a, T> {
    fn new(tree: &'a RawTree<T>) -> Self {
        Self {
            tree,
            stack: Vec::new(),
            current: tree.root,
            remaining: tree.len(),
        }
    }
}

impl<T> Iterator for InOrder<'_, T> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while !self.current.is_nil() {
            self.stack.push(self.current);
            self.current = self.tree.left(self.current);
        }

        let id = self.stack.pop()?;
        self.current = self.tree.right(id);
        self.remaining -= 1;
        Some(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

/// Iterator over payloads in ascending key order.
pub struct Iter<'a, T> {
    nodes: InOrder<'a, T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        let tree = self.nodes.tree;
        self.nodes.next().map(|id| tree.payload(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.nodes.size_hint()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}

impl<T> RawTree<T> {
    pub(crate) fn nodes(&self) -> InOrder<'_, T> {
        InOrder::new(self)
    }

    pub(crate) fn iter(&self) -> Iter<'_, T> {
        Iter { nodes: self.nodes() }
    }

    /// Unlinks and frees every node, children before their parent.
    ///
    /// Returns how many nodes were freed.
    pub(crate) fn clear(&mut self) -> usize {
        let mut freed = 0;
        // (node, whether its children have already been pushed)
        let mut stack = Vec::new();
        if !self.root.is_nil() {
            stack.push((self.root, false));
        }

        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                drop(self.pool.free(id));
                freed += 1;
                continue
            }

            stack.push((id, true));
            let (left, right) = (self.left(id), self.right(id));
            if !right.is_nil() {
                stack.push((right, false));
            }
            if !left.is_nil() {
                stack.push((left, false));
            }
        }

        self.root = NodeId::NIL;
        freed
    }

    /// Frees every node and then the pool's backing storage.
    pub(crate) fn destroy(mut self) -> usize {
        let freed = self.clear();
        self.pool.clear();
        freed
    }

    /// Number of nodes on the longest root-to-leaf path.
    pub(crate) fn height(&self) -> usize {
        let mut max = 0;
        let mut stack = Vec::new();
        if !self.root.is_nil() {
            stack.push((self.root, 1));
        }

        while let Some((id, depth)) = stack.pop() {
            max = max.max(depth);
            for child in [self.left(id), self.right(id)] {
                if !child.is_nil() {
                    stack.push((child, depth + 1));
                }
            }
        }
        max
    }

    /// Number of black nodes on the left spine, not counting the sentinel.
    pub(crate) fn black_height(&self) -> usize {
        let mut count = 0;
        let mut id = self.root;
        while !id.is_nil() {
            if !self.is_red(id) {
                count += 1;
            }
            id = self.left(id);
        }
        count
    }
}
