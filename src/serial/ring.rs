//! Single-producer single-consumer byte ring.
//!
//! Storage ([`RingBuffer`]) is owned by the caller, typically in a `static`;
//! the serial engine only holds [`Ring`] handles to it. Exactly one context
//! may produce and one may consume: for a TX ring the main loop writes and
//! the UART interrupt reads, for an RX ring the other way around.
//!
//! `head` is the next write position and is only stored by the producer,
//! `tail` is the next read position and is only stored by the consumer. One
//! slot is kept empty so `head == tail` always means empty.

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicUsize, Ordering};

/// Backing storage of one ring. Holds `N - 1` bytes.
pub struct RingBuffer<const N: usize> {
    buf: [UnsafeCell<u8>; N],
    head: AtomicUsize,
    tail: AtomicUsize,
}

// SAFETY: byte cells are only written by the producer at `head` and only read
// by the consumer at `tail`; the Release/Acquire index handoff orders the
// byte accesses against the index updates.
unsafe impl<const N: usize> Sync for RingBuffer<N> {}

impl<const N: usize> RingBuffer<N> {
    const SIZE_OK: () = assert!(N >= 2, "ring needs at least two slots");

    /// Create an empty ring (const, suitable for statics).
    pub const fn new() -> Self {
        let () = Self::SIZE_OK;
        Self {
            buf: [const { UnsafeCell::new(0) }; N],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Handle for the engine and the application.
    pub const fn ring(&self) -> Ring<'_> {
        Ring {
            buf: &self.buf,
            head: &self.head,
            tail: &self.tail,
        }
    }
}

impl<const N: usize> Default for RingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Borrowed view of a [`RingBuffer`], independent of its size.
#[derive(Clone, Copy)]
pub struct Ring<'a> {
    buf: &'a [UnsafeCell<u8>],
    head: &'a AtomicUsize,
    tail: &'a AtomicUsize,
}

// SAFETY: see `RingBuffer`; a handle is only a view of shared storage.
unsafe impl Send for Ring<'_> {}
unsafe impl Sync for Ring<'_> {}

impl Ring<'_> {
    #[inline(always)]
    fn size(&self) -> usize {
        self.buf.len()
    }

    #[inline(always)]
    fn next(&self, idx: usize) -> usize {
        if idx + 1 == self.size() { 0 } else { idx + 1 }
    }

    /// Usable capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.size() - 1
    }

    /// Bytes waiting to be consumed.
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let tail = self.tail.load(Ordering::Acquire);
        (head + self.size() - tail) % self.size()
    }

    /// True when there is nothing to consume.
    pub fn is_empty(&self) -> bool {
        self.head.load(Ordering::Acquire) == self.tail.load(Ordering::Acquire)
    }

    /// Bytes that can be written before the ring is full.
    pub fn free(&self) -> usize {
        self.capacity() - self.len()
    }

    /// True when no byte can be written.
    pub fn is_full(&self) -> bool {
        self.free() == 0
    }

    /// Producer: append one byte. Returns `false` when full.
    pub fn write(&self, byte: u8) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let next = self.next(head);
        if next == self.tail.load(Ordering::Acquire) {
            return false;
        }
        // SAFETY: slot `head` is outside the consumer's readable range until
        // `head` is published below.
        unsafe { *self.buf[head].get() = byte };
        self.head.store(next, Ordering::Release);
        true
    }

    /// Producer: append as many bytes of `data` as fit. Returns the count.
    pub fn write_multi(&self, data: &[u8]) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let mut head = self.head.load(Ordering::Relaxed);
        let mut written = 0;
        for &byte in data {
            let next = self.next(head);
            if next == tail {
                break;
            }
            // SAFETY: as in `write`.
            unsafe { *self.buf[head].get() = byte };
            head = next;
            written += 1;
        }
        self.head.store(head, Ordering::Release);
        written
    }

    /// Consumer: take the oldest byte.
    pub fn read(&self) -> Option<u8> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }
        // SAFETY: slot `tail` was published by the producer and is not
        // rewritten until `tail` moves past it.
        let byte = unsafe { *self.buf[tail].get() };
        self.tail.store(self.next(tail), Ordering::Release);
        Some(byte)
    }

    /// Consumer: fill `out` from the oldest bytes. Returns the count.
    pub fn read_multi(&self, out: &mut [u8]) -> usize {
        let head = self.head.load(Ordering::Acquire);
        let mut tail = self.tail.load(Ordering::Relaxed);
        let mut read = 0;
        for slot in out.iter_mut() {
            if tail == head {
                break;
            }
            // SAFETY: as in `read`.
            *slot = unsafe { *self.buf[tail].get() };
            tail = self.next(tail);
            read += 1;
        }
        self.tail.store(tail, Ordering::Release);
        read
    }

    /// Consumer: drop everything currently queued.
    pub fn clear(&self) {
        let head = self.head.load(Ordering::Acquire);
        self.tail.store(head, Ordering::Release);
    }
}

impl core::fmt::Debug for Ring<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Ring")
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}
