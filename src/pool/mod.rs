//! A fixed-block node pool.
//!
//! The pool hands out blocks of a single type `B` addressed by stable
//! [`NodeId`] handles. It never moves a live value to a different handle, and
//! freed blocks are recycled LIFO through a free list before the backing
//! storage grows. Growth can be capped, which is how callers model a bounded
//! allocator that can run dry.

use std::mem::size_of;
use std::ops::{Index, IndexMut};

use thiserror::Error;

mod block;

use block::Block;

#[non_exhaustive]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The pool already holds `capacity` live blocks.
    #[error("node pool exhausted (capacity: {capacity} blocks)")]
    Exhausted { capacity: usize },
    /// The backing storage could not grow.
    #[error("out of memory while growing the node pool")]
    OutOfMemory,
}

/// Handle to a block in a [`NodePool`].
///
/// `NodeId::NIL` is never handed out by a pool, so it can stand for "no node".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub const NIL: NodeId = NodeId(0);

    pub const fn is_nil(self) -> bool {
        self.0 == 0
    }

    const fn from_index(index: usize) -> Self {
        NodeId(index + 1)
    }

    /// Position of this block in the pool's storage.
    ///
    /// Panics for `NIL`, which has no storage.
    fn index(self) -> usize {
        assert!(!self.is_nil(), "NodeId::NIL does not refer to a pool block");
        self.0 - 1
    }
}

pub struct NodePool<B> {
    blocks: Vec<Block<B>>,
    /// The start of the free list.
    free_list_head: Option<usize>,
    num_free_blocks: usize,
    /// Upper bound on the number of blocks the pool may ever hold.
    capacity: Option<usize>,
}

impl<B> NodePool<B> {
    pub const fn new(capacity: Option<usize>) -> Self {
        Self {
            blocks: Vec::new(),
            free_list_head: None,
            num_free_blocks: 0,
            capacity,
        }
    }

    /// Creates a pool with storage for `reserve` blocks set aside up front.
    pub fn with_reserve(capacity: Option<usize>, reserve: usize) -> Result<Self, PoolError> {
        let mut pool = Self::new(capacity);
        if reserve > 0 {
            pool.blocks.try_reserve_exact(reserve).map_err(|_| PoolError::OutOfMemory)?;
            debug!("Reserved {reserve} blocks of 0x{:x} bytes", Self::block_size());
        }
        Ok(pool)
    }

    /// The size in bytes of a single block, header included.
    pub const fn block_size() -> usize {
        size_of::<Block<B>>()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    /// The number of blocks currently holding a value.
    pub fn live_blocks(&self) -> usize {
        self.blocks.len() - self.num_free_blocks
    }

    /// The number of blocks sitting in the free list.
    pub fn free_blocks(&self) -> usize {
        self.num_free_blocks
    }

    /// Whether the next [`allocate`](Self::allocate) can succeed.
    ///
    /// On success, storage for one more block is guaranteed to be available.
    pub fn ensure_available(&mut self) -> Result<(), PoolError> {
        if self.free_list_head.is_some() {
            return Ok(())
        }

        if let Some(capacity) = self.capacity {
            if self.blocks.len() >= capacity {
                return Err(PoolError::Exhausted { capacity })
            }
        }

        self.blocks.try_reserve(1).map_err(|_| PoolError::OutOfMemory)
    }

    /// Moves `value` into a block and returns its handle.
    ///
    /// On failure the value is handed back to the caller alongside the error.
    pub fn allocate(&mut self, value: B) -> Result<NodeId, (PoolError, B)> {
        // reuse a freed block first
        if let Some(index) = self.free_list_head {
            let block = &mut self.blocks[index];
            self.free_list_head = block.next_free();
            block.set_allocated(index, value);
            self.num_free_blocks -= 1;
            trace!("Reused block #{index}");
            return Ok(NodeId::from_index(index))
        }

        if let Err(e) = self.ensure_available() {
            return Err((e, value))
        }

        let old_storage = self.blocks.capacity();
        let index = self.blocks.len();
        self.blocks.push(Block::Allocated(value));

        if self.blocks.capacity() != old_storage {
            debug!("Expanded node pool to {} blocks", self.blocks.capacity());
        }

        Ok(NodeId::from_index(index))
    }

    /// Returns a block to the free list and hands back the value it held.
    ///
    /// Panics if `id` is not a live block of this pool.
    pub fn free(&mut self, id: NodeId) -> B {
        let index = id.index();
        let value = self.blocks[index].set_free(index, self.free_list_head);
        self.free_list_head = Some(index);
        self.num_free_blocks += 1;
        value
    }

    pub fn get(&self, id: NodeId) -> Option<&B> {
        if id.is_nil() {
            return None
        }
        match self.blocks.get(id.index())? {
            Block::Allocated(value) => Some(value),
            Block::Free { .. } => None,
        }
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut B> {
        if id.is_nil() {
            return None
        }
        match self.blocks.get_mut(id.index())? {
            Block::Allocated(value) => Some(value),
            Block::Free { .. } => None,
        }
    }

    /// Drops every block, live or free, and releases the backing storage.
    pub fn clear(&mut self) {
        let live = self.live_blocks();
        if live > 0 {
            warn!("Destroying node pool with {live} live blocks");
        }
        self.blocks = Vec::new();
        self.free_list_head = None;
        self.num_free_blocks = 0;
    }
}

impl<B> Index<NodeId> for NodePool<B> {
    type Output = B;

    fn index(&self, id: NodeId) -> &B {
        match self.get(id) {
            Some(value) => value,
            None => panic!("{id:?} is not a live block"),
        }
    }
}

impl<B> IndexMut<NodeId> for NodePool<B> {
    fn index_mut(&mut self, id: NodeId) -> &mut B {
        match self.get_mut(id) {
            Some(value) => value,
            None => panic!("{id:?} is not a live block"),
        }
    }
}

impl<B> Default for NodePool<B> {
    fn default() -> Self {
        Self::new(None)
    }
}
