//! The locked, counted surface over the red-black engine.
//!
//! Every access to the nodes goes through a single tree-wide [`Mutex`]. The
//! tree operations that need the lock held (`insert`, `find`, `delete` and
//! friends) only exist on [`TreeGuard`], so the borrow checker enforces the
//! locking discipline instead of a comment. Enumeration takes the lock itself.

use std::cmp::Ordering;
use std::fmt::Debug;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{self, AtomicBool};

use crate::config::TreeConfig;
use crate::error::{Result, TreeError};
use crate::non_concurrent::rbtree::{Color, Comparator, Insertion, Iter, Node, RawTree};
use crate::pool::NodePool;
use crate::spinlock_mutex::{Mutex, MutexGuard};
use crate::stats::{Counters, Statistics};

const DEFAULT_NAME: &str = "rbtree";

/// An ordered index of `T`s, looked up by `K` through the comparator `C`.
///
/// Keys are unique: inserting a key that compares equal to a stored payload
/// hands back the stored payload and leaves the tree alone.
pub struct RbTree<K: ?Sized, T, C> {
    inner: Mutex<RawTree<T>>,
    comparator: C,
    counters: Counters,
    active: AtomicBool,
    config: TreeConfig,
    _key: PhantomData<fn(&K)>,
}

impl<K: ?Sized, T, C: Comparator<K, T>> RbTree<K, T, C> {
    pub fn new(comparator: C) -> Result<Self> {
        Self::with_config(comparator, TreeConfig::default())
    }

    /// # Errors
    ///
    /// [`TreeError::InvalidArgument`] if `T` is zero-sized or the config is
    /// inconsistent, and [`TreeError::AllocationFailed`] if the initial reserve
    /// can't be set aside.
    pub fn with_config(comparator: C, config: TreeConfig) -> Result<Self> {
        if size_of::<T>() == 0 {
            return Err(TreeError::InvalidArgument("payload type must not be zero-sized"))
        }
        config.validate()?;

        let pool = NodePool::with_reserve(config.capacity, config.initial_reserve)?;
        let tree = Self {
            inner: Mutex::new(RawTree::new(pool)),
            comparator,
            counters: Counters::default(),
            active: AtomicBool::new(true),
            config,
            _key: PhantomData,
        };

        debug!(
            "[{}] Created tree (node block: 0x{:x} bytes, capacity: {:?}, reserved: {})",
            tree.name(),
            NodePool::<Node<T>>::block_size(),
            tree.config.capacity,
            tree.config.initial_reserve,
        );
        Ok(tree)
    }

    /// Blocks until the tree lock is acquired.
    ///
    /// # Panics
    ///
    /// Panics if this thread already holds the lock, e.g. from inside an
    /// [`enumerate`](Self::enumerate) visitor.
    pub fn lock(&self) -> TreeGuard<'_, K, T, C> {
        TreeGuard {
            raw: self.inner.lock(),
            comparator: &self.comparator,
            counters: &self.counters,
            _key: PhantomData,
        }
    }

    pub fn with_lock<F, R>(&self, f: F) -> R where F: FnOnce(&mut TreeGuard<'_, K, T, C>) -> R {
        let mut guard = self.lock();
        f(&mut guard)
    }
}

impl<K: ?Sized, T, C> RbTree<K, T, C> {
    /// Calls `visitor` on every payload in ascending key order, holding the lock
    /// for the whole walk.
    ///
    /// The visitor must not touch this tree; trying to lock it panics.
    pub fn enumerate<X, F>(&self, mut visitor: F, context: &mut X)
    where
        X: ?Sized,
        F: FnMut(&T, &mut X),
    {
        let raw = self.inner.lock();
        for payload in raw.iter() {
            visitor(payload, context);
        }
    }

    pub fn statistics(&self) -> Statistics {
        self.counters.snapshot()
    }

    pub fn print_statistics(&self) {
        let stats = self.statistics();
        debug!("[{}] Node count: {}", self.name(), stats.node_count);
        debug!("[{}] Insertion count: {}", self.name(), stats.insertion_count);
        debug!("[{}] Deletion count: {}", self.name(), stats.deletion_count);
    }

    /// Logs every node at debug level in ascending order, with its color.
    pub fn in_order_print(&self) where T: Debug {
        if !log_enabled!(log::Level::Debug) {
            return
        }

        debug!("*** starting in-order print of {} ***", self.name());
        let raw = self.inner.lock();
        for id in raw.nodes() {
            let color = match raw.color(id) {
                Color::Red => "RED",
                Color::Black => "BLACK",
            };
            debug!("Node: {:?}, Color={color}", raw.payload(id));
        }
        drop(raw);
        debug!("*** ending in-order print of {} ***", self.name());
    }

    pub fn name(&self) -> &str {
        self.config.name.as_deref().unwrap_or(DEFAULT_NAME)
    }

    pub fn config(&self) -> &TreeConfig {
        &self.config
    }

    /// `false` once teardown has run.
    pub fn is_active(&self) -> bool {
        self.active.load(atomic::Ordering::Acquire)
    }

    /// Drops every payload, releases the pool and returns the final counters.
    ///
    /// Teardown is not deletion: the returned `deletion_count` only counts
    /// explicit deletes, while `node_count` drops to zero.
    pub fn destroy(mut self) -> Statistics {
        self.teardown();
        self.statistics()
    }

    fn teardown(&mut self) {
        if !self.active.swap(false, atomic::Ordering::AcqRel) {
            return
        }

        // `&mut self` means nobody holds the lock, so no need to take it
        let freed = mem::take(self.inner.get_mut()).destroy();
        self.counters.record_teardown(freed);
        debug!("[{}] Destroyed tree, freed {freed} nodes", self.name());
    }
}

impl<K: ?Sized, T, C> Drop for RbTree<K, T, C> {
    fn drop(&mut self) {
        self.teardown();
    }
}

/// Exclusive access to an [`RbTree`], released on drop.
pub struct TreeGuard<'a, K: ?Sized, T, C> {
    raw: MutexGuard<'a, RawTree<T>>,
    comparator: &'a C,
    counters: &'a Counters,
    _key: PhantomData<fn(&K)>,
}

impl<K: ?Sized, T, C: Comparator<K, T>> TreeGuard<'_, K, T, C> {
    /// Inserts a default payload for `key`, or returns the one already stored.
    ///
    /// The caller fills in the new payload through the returned reference; the
    /// fields that `key` is compared against must end up matching `key`.
    pub fn insert(&mut self, key: &K) -> Result<Inserted<'_, T>> where T: Default {
        self.insert_with(key, T::default)
    }

    /// Inserts `value` under `key`. If `key` is already present, `value` is
    /// dropped and the stored payload is returned.
    pub fn insert_value(&mut self, key: &K, value: T) -> Result<Inserted<'_, T>> {
        self.insert_with(key, || value)
    }

    /// Inserts the payload built by `init`, which only runs if `key` is absent.
    ///
    /// # Errors
    ///
    /// [`TreeError::AllocationFailed`] if the pool can't provide a node. The
    /// tree and its counters are unchanged.
    pub fn insert_with<F>(&mut self, key: &K, init: F) -> Result<Inserted<'_, T>> where F: FnOnce() -> T {
        let insertion = match self.raw.insert_with(self.comparator, key, init) {
            Ok(insertion) => insertion,
            Err(e) => {
                warn!("Insert failed: {e}");
                return Err(e.into())
            }
        };

        match insertion {
            Insertion::Created(id) => {
                self.counters.record_insert();
                trace!("Inserted {id:?}");
                Ok(Inserted::Created(self.raw.payload_mut(id)))
            }
            Insertion::Existing(id) => {
                trace!("Key already present at {id:?}");
                Ok(Inserted::Existing(self.raw.payload_mut(id)))
            }
        }
    }

    pub fn find(&self, key: &K) -> Option<&T> {
        let id = self.raw.search(self.comparator, key)?;
        Some(self.raw.payload(id))
    }

    /// The fields the comparator looks at must not be changed through this.
    pub fn find_mut(&mut self, key: &K) -> Option<&mut T> {
        let id = self.raw.search(self.comparator, key)?;
        Some(self.raw.payload_mut(id))
    }

    pub fn contains(&self, key: &K) -> bool {
        self.raw.search(self.comparator, key).is_some()
    }

    /// Unlinks the node for `key` and hands its payload back.
    ///
    /// A missing key is not an error and leaves the counters alone.
    pub fn delete(&mut self, key: &K) -> Option<T> {
        let removed = self.raw.remove(self.comparator, key)?;
        self.counters.record_delete();
        Some(removed)
    }
}

impl<K: ?Sized, T, C> TreeGuard<'_, K, T, C> {
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    pub fn first(&self) -> Option<&T> {
        self.raw.first().map(|id| self.raw.payload(id))
    }

    pub fn last(&self) -> Option<&T> {
        self.raw.last().map(|id| self.raw.payload(id))
    }

    pub fn iter(&self) -> Iter<'_, T> {
        self.raw.iter()
    }

    pub fn for_each<F>(&self, f: F) where F: FnMut(&T) {
        self.raw.iter().for_each(f)
    }

    /// Walks the whole tree checking the red-black and linkage invariants.
    pub fn verify(&self) -> Result<()> {
        self.raw.verify()
    }

    /// Checks that the in-order walk is strictly increasing under `order`.
    pub fn verify_order<F>(&self, order: F) -> Result<()> where F: FnMut(&T, &T) -> Ordering {
        self.raw.verify_order(order)
    }

    pub fn height(&self) -> usize {
        self.raw.height()
    }

    pub fn black_height(&self) -> usize {
        self.raw.black_height()
    }
}

/// The payload an insert resolved to.
#[derive(Debug)]
pub enum Inserted<'a, T> {
    /// Freshly linked; the caller should fill it in.
    Created(&'a mut T),
    /// Already present; left exactly as it was.
    Existing(&'a mut T),
}

impl<'a, T> Inserted<'a, T> {
    pub fn is_new(&self) -> bool {
        matches!(self, Inserted::Created(_))
    }

    pub fn into_mut(self) -> &'a mut T {
        match self {
            Inserted::Created(payload) | Inserted::Existing(payload) => payload,
        }
    }
}

impl<T> Deref for Inserted<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        match self {
            Inserted::Created(payload) | Inserted::Existing(payload) => payload,
        }
    }
}

impl<T> DerefMut for Inserted<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        match self {
            Inserted::Created(payload) | Inserted::Existing(payload) => payload,
        }
    }
}
