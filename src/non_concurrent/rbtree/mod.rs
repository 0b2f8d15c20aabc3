//! The red-black balancing engine.
//!
//! Nodes live in a [`NodePool`] and refer to each other by [`NodeId`]. Every
//! empty child position holds [`NodeId::NIL`], which resolves to a single black
//! sentinel owned by the tree. Delete fixup may write the sentinel's parent
//! link so that it can walk up from an empty position exactly like it would
//! from a real node.
//!
//! Nothing in here locks. The locked surface is [`RbTree`](crate::RbTree).

// PROVE: any node with height `h` has black height at least `h/2`
// PROVE: the subtree located at any node `x` contains at least `2^bh(x) - 1` nodes (use induction)
// LEMMA: An RBTree with `n` internal nodes has height at most `2*log₂(n+1)`

use std::cmp::Ordering;

use crate::pool::{NodeId, NodePool};

mod delete;
mod insert;
mod rotate;
mod verify;
mod walk;

#[cfg(test)]
mod proptests;

pub(crate) use insert::Insertion;
pub use walk::Iter;

/// A three-way comparison between a lookup key and a stored payload.
///
/// The order must be total and must not change while the payload is in a tree.
pub trait Comparator<K: ?Sized, T> {
    fn compare(&self, key: &K, payload: &T) -> Ordering;
}

impl<K: ?Sized, T, F> Comparator<K, T> for F
where
    F: Fn(&K, &T) -> Ordering,
{
    fn compare(&self, key: &K, payload: &T) -> Ordering {
        self(key, payload)
    }
}

/// Orders payloads by their own [`Ord`] impl, using the payload type as its own key.
#[derive(Debug, Default, Clone, Copy)]
pub struct NaturalOrder;

impl<T: Ord> Comparator<T, T> for NaturalOrder {
    fn compare(&self, key: &T, payload: &T) -> Ordering {
        key.cmp(payload)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Black,
}

/// Which child of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    pub(crate) fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct Links {
    parent: NodeId,
    left: NodeId,
    right: NodeId,
    color: Color,
}

impl Links {
    const SENTINEL: Links = Links {
        parent: NodeId::NIL,
        left: NodeId::NIL,
        right: NodeId::NIL,
        color: Color::Black,
    };
}

pub(crate) struct Node<T> {
    links: Links,
    payload: T,
}

pub(crate) struct RawTree<T> {
    root: NodeId,
    /// The black leaf every `NodeId::NIL` resolves to.
    nil: Links,
    pool: NodePool<Node<T>>,
}

impl<T> RawTree<T> {
    pub(crate) fn new(pool: NodePool<Node<T>>) -> Self {
        Self {
            root: NodeId::NIL,
            nil: Links::SENTINEL,
            pool,
        }
    }

    #[cfg(test)]
    pub(crate) fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn len(&self) -> usize {
        self.pool.live_blocks()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.root.is_nil()
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &NodePool<Node<T>> {
        &self.pool
    }

    fn links(&self, id: NodeId) -> &Links {
        if id.is_nil() { &self.nil } else { &self.pool[id].links }
    }

    fn links_mut(&mut self, id: NodeId) -> &mut Links {
        if id.is_nil() { &mut self.nil } else { &mut self.pool[id].links }
    }

    pub(crate) fn parent(&self, id: NodeId) -> NodeId {
        self.links(id).parent
    }

    pub(crate) fn left(&self, id: NodeId) -> NodeId {
        self.links(id).left
    }

    pub(crate) fn right(&self, id: NodeId) -> NodeId {
        self.links(id).right
    }

    pub(crate) fn child(&self, id: NodeId, side: Side) -> NodeId {
        match side {
            Side::Left => self.left(id),
            Side::Right => self.right(id),
        }
    }

    pub(crate) fn color(&self, id: NodeId) -> Color {
        self.links(id).color
    }

    fn is_red(&self, id: NodeId) -> bool {
        self.color(id) == Color::Red
    }

    fn set_parent(&mut self, id: NodeId, parent: NodeId) {
        self.links_mut(id).parent = parent;
    }

    fn set_child(&mut self, id: NodeId, side: Side, child: NodeId) {
        debug_assert!(!id.is_nil(), "the sentinel has no children");
        let links = self.links_mut(id);
        match side {
            Side::Left => links.left = child,
            Side::Right => links.right = child,
        }
    }

    fn set_color(&mut self, id: NodeId, color: Color) {
        self.links_mut(id).color = color;
    }

    /// Which side of its parent `id` hangs off. The root counts as a right child.
    fn side_of(&self, id: NodeId) -> Side {
        if id == self.left(self.parent(id)) { Side::Left } else { Side::Right }
    }

    pub(crate) fn payload(&self, id: NodeId) -> &T {
        &self.pool[id].payload
    }

    pub(crate) fn payload_mut(&mut self, id: NodeId) -> &mut T {
        &mut self.pool[id].payload
    }

    /// Finds the node whose payload compares equal to `key`.
    pub(crate) fn search<K: ?Sized, C: Comparator<K, T>>(&self, cmp: &C, key: &K) -> Option<NodeId> {
        let mut current = self.root;
        while !current.is_nil() {
            match cmp.compare(key, self.payload(current)) {
                Ordering::Less => current = self.left(current),
                Ordering::Greater => current = self.right(current),
                Ordering::Equal => return Some(current),
            }
        }
        None
    }

    /// The left-most node of the subtree rooted at `id`.
    pub(crate) fn minimum(&self, mut id: NodeId) -> NodeId {
        while !self.left(id).is_nil() {
            id = self.left(id);
        }
        id
    }

    /// The right-most node of the subtree rooted at `id`.
    pub(crate) fn maximum(&self, mut id: NodeId) -> NodeId {
        while !self.right(id).is_nil() {
            id = self.right(id);
        }
        id
    }

    pub(crate) fn first(&self) -> Option<NodeId> {
        (!self.is_empty()).then(|| self.minimum(self.root))
    }

    pub(crate) fn last(&self) -> Option<NodeId> {
        (!self.is_empty()).then(|| self.maximum(self.root))
    }
}

impl<T> Default for RawTree<T> {
    fn default() -> Self {
        Self::new(NodePool::default())
    }
}


#[cfg(test)]
mod tests {
    use super::test_util::tree_of;
    use super::*;

    #[test]
    fn search_hits_and_misses() {
        let tree = tree_of(&[50, 20, 80, 10, 30]);
        for k in [50, 20, 80, 10, 30] {
            let id = tree.search(&NaturalOrder, &k).unwrap();
            assert_eq!(*tree.payload(id), k);
        }
        assert!(tree.search(&NaturalOrder, &25).is_none());
        assert!(tree.search(&NaturalOrder, &0).is_none());
    }

    #[test]
    fn search_empty() {
        let tree = RawTree::<i32>::default();
        assert!(tree.search(&NaturalOrder, &1).is_none());
        assert!(tree.first().is_none());
        assert!(tree.last().is_none());
        assert!(tree.is_empty());
    }

    #[test]
    fn first_and_last() {
        let tree = tree_of(&[4, 8, 1, 9, 3]);
        assert_eq!(*tree.payload(tree.first().unwrap()), 1);
        assert_eq!(*tree.payload(tree.last().unwrap()), 9);
    }

    #[test]
    fn closure_comparator_with_borrowed_key() {
        struct Record { name: String, hits: u32 }
        let cmp = |key: &str, rec: &Record| key.cmp(rec.name.as_str());

        let mut tree = RawTree::default();
        for (name, hits) in [("beta", 2), ("alpha", 1), ("gamma", 3)] {
            tree.insert_with(&cmp, name, || Record { name: name.to_owned(), hits }).unwrap();
        }

        let id = tree.search(&cmp, "gamma").unwrap();
        assert_eq!(tree.payload(id).hits, 3);
        assert!(tree.search(&cmp, "delta").is_none());
    }

    #[test]
    fn sentinel_is_black() {
        let tree = RawTree::<i32>::default();
        assert_eq!(tree.color(NodeId::NIL), Color::Black);
    }
}
