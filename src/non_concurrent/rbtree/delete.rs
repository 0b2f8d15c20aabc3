use super::{Color, Comparator, RawTree, Side};
use crate::pool::NodeId;

impl<T> RawTree<T> {
    /// Unlinks the node matching `key` and returns its payload.
    ///
    /// Missing keys are not an error; the tree is left untouched.
    pub(crate) fn remove<K: ?Sized, C: Comparator<K, T>>(&mut self, cmp: &C, key: &K) -> Option<T> {
        let target = self.search(cmp, key)?;
        Some(self.remove_node(target))
    }

    /// Unlinks `target`, rebalances, and frees its block back to the pool.
    pub(crate) fn remove_node(&mut self, target: NodeId) -> T {
        let mut removed_color = self.color(target);
        // the node (possibly the sentinel) that moves into the vacated position
        let replacement;

        if self.left(target).is_nil() {
            replacement = self.right(target);
            self.transplant(target, replacement);
        } else if self.right(target).is_nil() {
            replacement = self.left(target);
            self.transplant(target, replacement);
        } else {
            let successor = self.minimum(self.right(target));
            removed_color = self.color(successor);
            replacement = self.right(successor);

            if self.parent(successor) == target {
                // also needed when `replacement` is the sentinel, so fixup can find its way up
                self.set_parent(replacement, successor);
            } else {
                self.transplant(successor, replacement);
                let right = self.right(target);
                self.set_child(successor, Side::Right, right);
                self.set_parent(right, successor);
            }

            self.transplant(target, successor);
            let left = self.left(target);
            self.set_child(successor, Side::Left, left);
            self.set_parent(left, successor);
            let color = self.color(target);
            self.set_color(successor, color);
        }

        if removed_color == Color::Black {
            self.delete_fixup(replacement);
        }

        self.nil.parent = NodeId::NIL;
        debug_assert_eq!(self.nil.color, Color::Black);

        self.pool.free(target).payload
    }

    /// Puts the subtree rooted at `replacement` where `target` used to hang.
    ///
    /// `replacement` may be the sentinel; its parent link is written anyway.
    fn transplant(&mut self, target: NodeId, replacement: NodeId) {
        let parent = self.parent(target);
        if parent.is_nil() {
            self.root = replacement;
        } else {
            let side = self.side_of(target);
            self.set_child(parent, side, replacement);
        }
        self.set_parent(replacement, parent);
    }

    /// Restores the red-black properties after a black node was removed from
    /// above `node`, which is now "doubly black".
    ///
    /// ```text
    ///   far nephew red (terminal case):
    ///
    ///         P(c)                   S(c)
    ///        /    \                 /    \
    ///     N(BB)   S(B)     ->     P(B)   F(B)
    ///            /    \          /    \
    ///          a      F(R)     N(B)    a
    /// ```
    fn delete_fixup(&mut self, mut node: NodeId) {
        while node != self.root && !self.is_red(node) {
            let parent = self.parent(node);
            let side = self.side_of(node);
            let far = side.opposite();
            let mut sibling = self.child(parent, far);

            if self.is_red(sibling) {
                trace!("Delete fixup: red sibling {sibling:?}");
                self.set_color(sibling, Color::Black);
                self.set_color(parent, Color::Red);
                self.rotate(parent, side);
                sibling = self.child(parent, far);
            }

            if !self.is_red(self.child(sibling, side)) && !self.is_red(self.child(sibling, far)) {
                trace!("Delete fixup: black nephews, moving up from {node:?}");
                self.set_color(sibling, Color::Red);
                node = parent;
                continue
            }

            if !self.is_red(self.child(sibling, far)) {
                trace!("Delete fixup: near nephew red, rotating {sibling:?}");
                let near = self.child(sibling, side);
                self.set_color(near, Color::Black);
                self.set_color(sibling, Color::Red);
                self.rotate(sibling, far);
                sibling = self.child(parent, far);
            }

            trace!("Delete fixup: far nephew red, rotating {parent:?}");
            let parent_color = self.color(parent);
            self.set_color(sibling, parent_color);
            self.set_color(parent, Color::Black);
            let far_nephew = self.child(sibling, far);
            self.set_color(far_nephew, Color::Black);
            self.rotate(parent, side);
            node = self.root;
        }

        self.set_color(node, Color::Black);
    }
}
