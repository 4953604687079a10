//! Per-bus FIFO of transaction slot indices.

/// Bounded circular queue of slot indices.
///
/// `tail` is the oldest entry (the one being or about to be transferred),
/// `head` is where the next submission lands. The capacity equals the pool
/// size, so a queue can never overflow while every entry is an allocated
/// slot.
#[derive(Debug, Clone, Copy)]
pub struct BusQueue<const N: usize> {
    entries: [u8; N],
    head: usize,
    tail: usize,
    len: usize,
}

impl<const N: usize> BusQueue<N> {
    /// Create an empty queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: [0; N],
            head: 0,
            tail: 0,
            len: 0,
        }
    }

    /// Number of queued transactions.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True when nothing is queued.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// True when no further entry fits.
    #[inline(always)]
    pub const fn is_full(&self) -> bool {
        self.len == N
    }

    /// Append a slot index. Returns `false` if the queue is full.
    pub fn push(&mut self, slot: usize) -> bool {
        if self.is_full() {
            return false;
        }
        self.entries[self.head] = slot as u8;
        self.head = (self.head + 1) % N;
        self.len += 1;
        true
    }

    /// Oldest queued slot.
    #[inline]
    pub fn front(&self) -> Option<usize> {
        if self.is_empty() {
            None
        } else {
            Some(self.entries[self.tail] as usize)
        }
    }

    /// Remove and return the oldest queued slot.
    pub fn pop(&mut self) -> Option<usize> {
        let slot = self.front()?;
        self.tail = (self.tail + 1) % N;
        self.len -= 1;
        Some(slot)
    }

    /// Iterate queued slots from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).map(move |i| self.entries[(self.tail + i) % N] as usize)
    }
}

impl<const N: usize> Default for BusQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
