use std::cmp::Ordering;

use super::{Color, RawTree};
use crate::error::{Result, TreeError};
use crate::pool::NodeId;

fn corrupted(msg: String) -> TreeError {
    error!("{msg}");
    TreeError::Corrupted(msg)
}

impl<T> RawTree<T> {
    /// Checks the structural red-black invariants.
    ///
    /// - the root is black and has no parent
    /// - no red node has a red child
    /// - every path from the root down to the sentinel crosses the same number of black nodes
    /// - every child's parent link points back at the node holding it
    /// - every live pool block is reachable from the root
    pub(crate) fn verify(&self) -> Result<()> {
        if self.is_red(NodeId::NIL) || !self.parent(NodeId::NIL).is_nil() {
            return Err(corrupted("the sentinel leaf was left modified".to_owned()))
        }

        if self.root.is_nil() {
            return match self.len() {
                0 => Ok(()),
                n => Err(corrupted(format!("tree is empty but {n} blocks are live"))),
            }
        }

        if self.is_red(self.root) {
            return Err(corrupted(format!("root {:?} is red", self.root)))
        }
        if !self.parent(self.root).is_nil() {
            return Err(corrupted(format!("root {:?} has a parent", self.root)))
        }

        let mut reached = 0;
        let mut leaf_black_height = None;
        // (node, black nodes on the path above it)
        let mut stack = vec![(self.root, 0usize)];

        while let Some((id, blacks_above)) = stack.pop() {
            reached += 1;
            let blacks = blacks_above + usize::from(self.color(id) == Color::Black);

            for child in [self.left(id), self.right(id)] {
                if child.is_nil() {
                    match leaf_black_height {
                        None => leaf_black_height = Some(blacks),
                        Some(expected) if expected != blacks => {
                            return Err(corrupted(format!(
                                "black height below {id:?} is {blacks}, expected {expected}"
                            )))
                        }
                        Some(_) => {}
                    }
                    continue
                }

                if self.parent(child) != id {
                    return Err(corrupted(format!(
                        "{child:?} is a child of {id:?} but links to parent {:?}",
                        self.parent(child)
                    )))
                }
                if self.is_red(id) && self.is_red(child) {
                    return Err(corrupted(format!("red node {id:?} has red child {child:?}")))
                }
                stack.push((child, blacks));
            }
        }

        if reached != self.len() {
            return Err(corrupted(format!(
                "{reached} nodes reachable from the root but {} blocks are live",
                self.len()
            )))
        }

        Ok(())
    }

    /// Checks that an in-order walk is strictly increasing under `order`.
    pub(crate) fn verify_order<F>(&self, mut order: F) -> Result<()>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut nodes = self.nodes();
        let Some(mut prev) = nodes.next() else { return Ok(()) };

        for id in nodes {
            if order(self.payload(prev), self.payload(id)) != Ordering::Less {
                return Err(corrupted(format!("{prev:?} is not ordered before {id:?}")))
            }
            prev = id;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_util::tree_of;
    use super::*;

    #[test]
    fn valid_trees_pass() {
        for n in 0..64 {
            let tree = tree_of(&(0..n).collect::<Vec<_>>());
            tree.verify().unwrap();
            tree.verify_order(i32::cmp).unwrap();
        }
    }

    #[test]
    fn red_root_is_caught() {
        let mut tree = tree_of(&[1, 2, 3]);
        let root = tree.root();
        tree.set_color(root, Color::Red);
        assert!(matches!(tree.verify(), Err(TreeError::Corrupted(_))));
    }

    #[test]
    fn red_red_is_caught() {
        let mut tree = tree_of(&[20, 10, 30, 5]);
        let ten = tree.left(tree.root());
        tree.set_color(ten, Color::Red);
        let err = tree.verify().unwrap_err();
        assert!(err.to_string().contains("red child"), "{err}");
    }

    #[test]
    fn black_height_mismatch_is_caught() {
        let mut tree = tree_of(&[10, 20, 30]);
        let left = tree.left(tree.root());
        tree.set_color(left, Color::Black);
        let err = tree.verify().unwrap_err();
        assert!(err.to_string().contains("black height"), "{err}");
    }

    #[test]
    fn broken_parent_link_is_caught() {
        let mut tree = tree_of(&[10, 20, 30]);
        let right = tree.right(tree.root());
        tree.set_parent(right, NodeId::NIL);
        let err = tree.verify().unwrap_err();
        assert!(err.to_string().contains("links to parent"), "{err}");
    }

    #[test]
    fn dirty_sentinel_is_caught() {
        let mut tree = tree_of(&[1]);
        let root = tree.root();
        tree.set_parent(NodeId::NIL, root);
        assert!(tree.verify().is_err());
    }

    #[test]
    fn misordering_is_caught() {
        let mut tree = tree_of(&[10, 20, 30]);
        let left = tree.left(tree.root());
        *tree.payload_mut(left) = 25;
        tree.verify().unwrap();
        assert!(tree.verify_order(i32::cmp).is_err());
    }
}
