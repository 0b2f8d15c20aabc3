use super::{RawTree, Side};
use crate::pool::NodeId;

impl<T> RawTree<T> {
    /// Moves `node` down towards `side` and promotes its child on the other side
    /// into its place.
    ///
    /// ```text
    ///   rotate(x, Left):
    ///
    ///       x                y
    ///      / \              / \
    ///     a   y     ->     x   c
    ///        / \          / \
    ///       b   c        a   b
    /// ```
    ///
    /// The in-order sequence `a x b y c` is unchanged.
    pub(crate) fn rotate(&mut self, node: NodeId, side: Side) {
        let promoted = self.child(node, side.opposite());
        debug_assert!(!promoted.is_nil(), "cannot rotate {node:?} {side:?} without a child to promote");

        // the inner subtree `b` changes parents
        let inner = self.child(promoted, side);
        self.set_child(node, side.opposite(), inner);
        if !inner.is_nil() {
            self.set_parent(inner, node);
        }

        let parent = self.parent(node);
        self.set_parent(promoted, parent);
        if parent.is_nil() {
            self.root = promoted;
        } else {
            let node_side = self.side_of(node);
            self.set_child(parent, node_side, promoted);
        }

        self.set_child(promoted, side, node);
        self.set_parent(node, promoted);

        trace!("Rotated {node:?} {side:?}, promoting {promoted:?}");
    }

    #[cfg(test)]
    pub(crate) fn rotate_left(&mut self, node: NodeId) {
        self.rotate(node, Side::Left)
    }

    #[cfg(test)]
    pub(crate) fn rotate_right(&mut self, node: NodeId) {
        self.rotate(node, Side::Right)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::tree_of;
    use super::super::NaturalOrder;
    use super::*;

    fn in_order(tree: &RawTree<i32>) -> Vec<i32> {
        tree.iter().copied().collect()
    }

    fn id_of(tree: &RawTree<i32>, k: i32) -> NodeId {
        tree.search(&NaturalOrder, &k).unwrap()
    }

    #[test]
    fn rotate_left_at_root() {
        // 20 is the root with children 10 and 30
        let mut tree = tree_of(&[20, 10, 30, 25, 35]);
        let root = tree.root();
        assert_eq!(*tree.payload(root), 20);

        tree.rotate_left(root);

        let new_root = tree.root();
        assert_eq!(*tree.payload(new_root), 30);
        assert!(tree.parent(new_root).is_nil());
        assert_eq!(tree.left(new_root), id_of(&tree, 20));
        assert_eq!(tree.right(new_root), id_of(&tree, 35));

        // 25 moved across to become 20's right child
        let twenty = id_of(&tree, 20);
        assert_eq!(tree.right(twenty), id_of(&tree, 25));
        assert_eq!(tree.parent(id_of(&tree, 25)), twenty);
        assert_eq!(tree.parent(twenty), new_root);

        assert_eq!(in_order(&tree), vec![10, 20, 25, 30, 35]);
    }

    #[test]
    fn rotate_right_below_root() {
        let mut tree = tree_of(&[50, 30, 70, 20, 40, 60, 80, 10]);
        let thirty = id_of(&tree, 30);
        let fifty = id_of(&tree, 50);
        assert_eq!(tree.left(fifty), thirty);

        tree.rotate_right(thirty);

        let twenty = id_of(&tree, 20);
        assert_eq!(tree.left(fifty), twenty);
        assert_eq!(tree.parent(twenty), fifty);
        assert_eq!(tree.right(twenty), thirty);
        assert_eq!(tree.left(twenty), id_of(&tree, 10));
        assert_eq!(tree.left(thirty), NodeId::NIL);
        assert_eq!(tree.right(thirty), id_of(&tree, 40));

        assert_eq!(in_order(&tree), vec![10, 20, 30, 40, 50, 60, 70, 80]);
    }

    #[test]
    fn rotations_are_inverse() {
        let mut tree = tree_of(&[4, 2, 6, 1, 3, 5, 7]);
        let before = in_order(&tree);
        let root = tree.root();

        tree.rotate_right(root);
        tree.rotate_left(tree.root());

        assert_eq!(tree.root(), root);
        assert_eq!(in_order(&tree), before);
        assert_eq!(*tree.payload(tree.left(root)), 2);
        assert_eq!(*tree.payload(tree.right(root)), 6);
    }

    #[test]
    fn rotation_leaves_sentinel_alone() {
        let mut tree = tree_of(&[1, 2]);
        tree.rotate_left(tree.root());
        assert!(tree.parent(NodeId::NIL).is_nil());
        assert_eq!(*tree.payload(tree.root()), 2);
    }
}
