use std::mem;

/// A fixed-size slot in a [`NodePool`](super::NodePool).
///
/// Every block has the same layout: either a live value or a link to the next
/// free block. Free blocks form an intrusive singly linked list threaded through
/// the pool, so a freed block is handed out again before the pool grows.
pub(super) enum Block<B> {
    Allocated(B),
    Free { next_free: Option<usize> },
}

impl<B> Block<B> {
    /// Checks if the block is allocated.
    pub(super) fn is_allocated(&self) -> bool {
        matches!(self, Block::Allocated(_))
    }

    /// The next block in the free list, if this block is free.
    pub(super) fn next_free(&self) -> Option<usize> {
        match self {
            Block::Allocated(_) => None,
            Block::Free { next_free } => *next_free,
        }
    }

    /// Marks this block as allocated, storing `value` in it.
    ///
    /// This drops the block out of the free list, so the caller must have
    /// already unlinked it.
    pub(super) fn set_allocated(&mut self, index: usize, value: B) {
        if self.is_allocated() {
            error!("Block #{index} was already allocated");
        }
        assert!(!self.is_allocated(), "Block #{index} was already allocated");
        *self = Block::Allocated(value);
    }

    /// Marks this block as free, linking it in front of `next`, and returns the value it held.
    pub(super) fn set_free(&mut self, index: usize, next: Option<usize>) -> B {
        match mem::replace(self, Block::Free { next_free: next }) {
            Block::Allocated(value) => value,
            Block::Free { .. } => {
                error!("Block #{index} was already deallocated");
                panic!("Block #{index} was already deallocated")
            }
        }
    }
}
