//! Transaction slot contents and lifecycle.

use crate::constants::SPI_TXN_SEG_MAX;
use crate::hal::{Pin, SpiPort};

use super::bus::SpiBus;
use super::segment::{self, Segment, SegmentRecord};

/// Lifecycle of a transaction slot.
///
/// `Idle -> Waiting -> Ready -> InProgress -> Idle`. The status decides who
/// may touch the slot body: the submitter while `Waiting`, nobody while
/// `Ready`, the executor and then the completion handler while `InProgress`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxnStatus {
    /// Free in the pool
    Idle,
    /// Allocated, being filled
    Waiting,
    /// Queued, eligible for dispatch
    Ready,
    /// Chip selected, transfer running
    InProgress,
}

/// Completion notification run after a transaction finishes.
///
/// Runs from the DMA completion interrupt (or from the caller's context for
/// polled transfers), outside any critical section.
#[derive(Debug, Clone, Copy)]
pub struct Completion {
    func: fn(usize),
    arg: usize,
}

impl Completion {
    /// Call `func(arg)` on completion.
    pub const fn new(func: fn(usize), arg: usize) -> Self {
        Self { func, arg }
    }

    #[inline]
    pub(crate) fn call(self) {
        (self.func)(self.arg);
    }
}

/// Per-transaction flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) struct TxnFlags(u8);

impl TxnFlags {
    /// Received bytes must be copied to rx targets after completion
    pub const DELAYED_RX: u8 = 1 << 0;
    /// Execute with byte-wise polled transfers, never DMA
    pub const POLLED: u8 = 1 << 1;

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn contains(self, bit: u8) -> bool {
        self.0 & bit != 0
    }

    pub fn set(&mut self, bit: u8, on: bool) {
        if on {
            self.0 |= bit;
        } else {
            self.0 &= !bit;
        }
    }
}

/// Device placeholder held by idle slots.
const UNBOUND: SpiBus = SpiBus::new(SpiPort::Spi1, Pin::pa(0));

/// Body of one transaction slot.
pub(crate) struct Transaction<const BUF: usize> {
    pub bus: SpiBus,
    pub size: usize,
    pub flags: TxnFlags,
    pub segments: [SegmentRecord; SPI_TXN_SEG_MAX],
    pub segment_count: usize,
    pub done: Option<Completion>,
    pub buffer: [u8; BUF],
}

impl<const BUF: usize> Transaction<BUF> {
    pub const fn new() -> Self {
        Self {
            bus: UNBOUND,
            size: 0,
            flags: TxnFlags::empty(),
            segments: [SegmentRecord::EMPTY; SPI_TXN_SEG_MAX],
            segment_count: 0,
            done: None,
            buffer: [0; BUF],
        }
    }

    /// Fill a freshly allocated slot. `segments` must have passed
    /// [`segment::validate`] against `BUF` and [`SPI_TXN_SEG_MAX`].
    pub fn prepare(&mut self, bus: &SpiBus, segments: &[Segment<'_>], done: Option<Completion>, polled: bool) {
        let encoded = segment::pack(segments, &mut self.buffer, &mut self.segments);
        self.bus = *bus;
        self.size = encoded.size;
        self.segment_count = encoded.count;
        self.done = done;
        self.flags = TxnFlags::empty();
        self.flags.set(TxnFlags::DELAYED_RX, encoded.has_rx);
        self.flags.set(TxnFlags::POLLED, polled);
    }

    #[inline]
    pub fn delayed_rx(&self) -> bool {
        self.flags.contains(TxnFlags::DELAYED_RX)
    }

    #[inline]
    pub fn polled(&self) -> bool {
        self.flags.contains(TxnFlags::POLLED)
    }

    /// Copy received bytes out to each segment's target.
    pub fn deliver_rx(&self) {
        if self.delayed_rx() {
            segment::deliver(&self.buffer[..self.size], &self.segments[..self.segment_count]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spi::segment::RxBuffer;

    #[test]
    fn prepare_sets_flags() {
        static RX: RxBuffer<2> = RxBuffer::new();
        let bus = SpiBus::new(SpiPort::Spi2, Pin::pb(12)).with_hz(8_000_000);
        let mut txn: Transaction<16> = Transaction::new();

        txn.prepare(&bus, &[Segment::bytes(&[0x80]), Segment::read(&RX, 2)], None, true);
        assert_eq!(txn.size, 3);
        assert_eq!(txn.segment_count, 2);
        assert!(txn.delayed_rx());
        assert!(txn.polled());
        assert_eq!(txn.bus.hz, 8_000_000);
    }

    #[test]
    fn write_only_has_no_delayed_rx() {
        let bus = SpiBus::new(SpiPort::Spi1, Pin::pa(4));
        let mut txn: Transaction<8> = Transaction::new();
        txn.prepare(&bus, &[Segment::write(&[1, 2, 3])], None, false);
        assert!(!txn.delayed_rx());
        assert!(!txn.polled());
    }

    #[test]
    fn deliver_rx_skips_const_prefix() {
        static RX: RxBuffer<2> = RxBuffer::new();
        let bus = SpiBus::new(SpiPort::Spi1, Pin::pa(4));
        let mut txn: Transaction<8> = Transaction::new();
        txn.prepare(&bus, &[Segment::bytes(&[0x0F]), Segment::read(&RX, 2)], None, false);
        txn.buffer[..3].copy_from_slice(&[0x00, 0x12, 0x34]);
        txn.deliver_rx();
        assert_eq!(RX.get(), [0x12, 0x34]);
    }

    #[test]
    fn completion_calls_with_arg() {
        use core::sync::atomic::{AtomicUsize, Ordering};
        static SEEN: AtomicUsize = AtomicUsize::new(0);
        fn record(arg: usize) {
            SEEN.store(arg, Ordering::SeqCst);
        }
        Completion::new(record, 42).call();
        assert_eq!(SEEN.load(Ordering::SeqCst), 42);
    }
}
