use std::cmp::Ordering;

use super::{Color, Comparator, Links, Node, RawTree, Side};
use crate::pool::{NodeId, PoolError};

/// What an insert did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Insertion {
    /// A new node was linked in.
    Created(NodeId),
    /// A node with an equal key was already present and was left untouched.
    Existing(NodeId),
}

impl<T> RawTree<T> {
    /// Links a new node for `key`, building its payload with `init`.
    ///
    /// The pool is only touched once the descent has found a free position, so
    /// inserting a key that is already present never allocates and never runs
    /// `init`. If the pool can't provide a block the tree is left as it was.
    pub(crate) fn insert_with<K, C, F>(&mut self, cmp: &C, key: &K, init: F) -> Result<Insertion, PoolError>
    where
        K: ?Sized,
        C: Comparator<K, T>,
        F: FnOnce() -> T,
    {
        let mut parent = NodeId::NIL;
        let mut side = Side::Left;
        let mut current = self.root;

        while !current.is_nil() {
            parent = current;
            match cmp.compare(key, self.payload(current)) {
                Ordering::Less => side = Side::Left,
                Ordering::Greater => side = Side::Right,
                // first writer wins
                Ordering::Equal => return Ok(Insertion::Existing(current)),
            }
            current = self.child(current, side);
        }

        self.pool.ensure_available()?;

        let node = Node {
            links: Links { parent, left: NodeId::NIL, right: NodeId::NIL, color: Color::Red },
            payload: init(),
        };
        let id = self.pool.allocate(node).map_err(|(e, _)| e)?;

        if parent.is_nil() {
            self.root = id;
        } else {
            self.set_child(parent, side, id);
        }

        self.insert_fixup(id);
        Ok(Insertion::Created(id))
    }

    /// Restores the red-black properties after linking the red node `node`.
    ///
    /// ```text
    ///   black uncle, straight line (node is an outer grandchild):
    ///
    ///          G(B)                P(B)
    ///         /    \              /    \
    ///       P(R)   U(B)   ->    N(R)   G(R)
    ///       /                            \
    ///     N(R)                           U(B)
    /// ```
    ///
    /// A zig-zag (inner grandchild) is first rotated into the straight line.
    /// A red uncle is handled by recoloring and moving two levels up.
    fn insert_fixup(&mut self, mut node: NodeId) {
        // the root's parent is the sentinel, which is black, so this stops at the root
        while self.is_red(self.parent(node)) {
            let mut parent = self.parent(node);
            let grandparent = self.parent(parent);
            let side = self.side_of(parent);
            let uncle = self.child(grandparent, side.opposite());

            if self.is_red(uncle) {
                trace!("Insert fixup: red uncle at {uncle:?}, recoloring");
                self.set_color(parent, Color::Black);
                self.set_color(uncle, Color::Black);
                self.set_color(grandparent, Color::Red);
                node = grandparent;
                continue
            }

            if node == self.child(parent, side.opposite()) {
                trace!("Insert fixup: straightening zig-zag at {parent:?}");
                self.rotate(parent, side);
                node = parent;
                parent = self.parent(node);
            }

            trace!("Insert fixup: black uncle, rotating {grandparent:?}");
            self.set_color(parent, Color::Black);
            self.set_color(grandparent, Color::Red);
            self.rotate(grandparent, side.opposite());
        }

        let root = self.root;
        self.set_color(root, Color::Black);
    }
}
