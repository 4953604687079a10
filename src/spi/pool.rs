//! Transaction slot pool.
//!
//! One bit per slot, 1 = free. Allocation takes the lowest free slot with a
//! trailing-zero count, so it is constant time regardless of pool size.
//!
//! The pool itself is plain data. The engine keeps it inside its
//! critical-section state, which makes scan-and-clear atomic with respect to
//! the DMA completion interrupt.

/// Free-slot bitmap for up to 32 transaction slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxnPool<const N: usize> {
    free: u32,
}

impl<const N: usize> TxnPool<N> {
    const CAPACITY_OK: () = assert!(N > 0 && N <= u32::BITS as usize, "pool size must be 1..=32");

    /// Bitmap with every slot free.
    const FULL: u32 = if N == u32::BITS as usize {
        u32::MAX
    } else {
        (1u32 << N) - 1
    };

    /// Create a pool with every slot free.
    #[must_use]
    pub const fn new() -> Self {
        let () = Self::CAPACITY_OK;
        Self { free: Self::FULL }
    }

    /// Number of slots in the pool.
    #[inline(always)]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Take the lowest free slot.
    pub fn allocate(&mut self) -> Option<usize> {
        if self.free == 0 {
            return None;
        }
        let idx = self.free.trailing_zeros() as usize;
        self.free &= !(1u32 << idx);
        Some(idx)
    }

    /// Return a slot to the pool.
    pub fn release(&mut self, idx: usize) {
        debug_assert!(idx < N, "slot index out of range");
        debug_assert!(self.is_allocated(idx), "double release of slot");
        self.free |= 1u32 << idx;
    }

    /// True when slot `idx` is currently owned.
    #[inline]
    pub fn is_allocated(&self, idx: usize) -> bool {
        idx < N && self.free & (1u32 << idx) == 0
    }

    /// Any slot available?
    #[inline]
    pub fn has_free(&self) -> bool {
        self.free != 0
    }

    /// Number of free slots.
    #[inline]
    pub fn free_count(&self) -> usize {
        self.free.count_ones() as usize
    }
}

impl<const N: usize> Default for TxnPool<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_pool_is_all_free() {
        let pool: TxnPool<8> = TxnPool::new();
        assert_eq!(pool.free_count(), 8);
        assert!(pool.has_free());
        assert_eq!(pool.capacity(), 8);
    }

    #[test]
    fn full_width_pool_is_all_free() {
        let pool: TxnPool<32> = TxnPool::new();
        assert_eq!(pool.free_count(), 32);
    }

    #[test]
    fn allocate_takes_lowest_free_slot() {
        let mut pool: TxnPool<4> = TxnPool::new();
        assert_eq!(pool.allocate(), Some(0));
        assert_eq!(pool.allocate(), Some(1));
        pool.release(0);
        assert_eq!(pool.allocate(), Some(0));
        assert_eq!(pool.allocate(), Some(2));
    }

    #[test]
    fn exhaustion_returns_none() {
        let mut pool: TxnPool<3> = TxnPool::new();
        for expected in 0..3 {
            assert_eq!(pool.allocate(), Some(expected));
        }
        assert!(!pool.has_free());
        assert_eq!(pool.free_count(), 0);
        assert_eq!(pool.allocate(), None);
    }

    #[test]
    fn release_restores_count() {
        let mut pool: TxnPool<32> = TxnPool::new();
        let slots: [usize; 5] = core::array::from_fn(|_| pool.allocate().unwrap());
        assert_eq!(pool.free_count(), 27);
        for idx in slots {
            assert!(pool.is_allocated(idx));
            pool.release(idx);
            assert!(!pool.is_allocated(idx));
        }
        assert_eq!(pool.free_count(), 32);
    }

    #[test]
    fn out_of_range_is_never_allocated() {
        let pool: TxnPool<4> = TxnPool::new();
        assert!(!pool.is_allocated(4));
        assert!(!pool.is_allocated(31));
    }
}
