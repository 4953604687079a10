//! Transaction segments and receive targets.
//!
//! A transaction is a list of segments packed back-to-back into one transfer
//! buffer. Constant segments are copied in at submission; buffer segments
//! either carry transmit bytes (padded with `0xFF` when shorter than the
//! segment) or just clock `0xFF`, and may name a receive target that gets its
//! slice of the buffer once the transfer completes.

use crate::constants::SPI_DUMMY_BYTE;
use crate::error::{SpiError, SpiResult};
use crate::sync::CriticalSectionCell;

// =============================================================================
// Receive Targets
// =============================================================================

/// Destination for bytes clocked in during a buffer segment.
///
/// Delivery happens from the DMA completion interrupt (or the polled
/// executor), after the bus is released and before the completion callback.
pub trait RxTarget: Sync {
    /// Largest segment this target can take in full.
    fn capacity(&self) -> usize;

    /// Receive the bytes of one segment. `data` is never longer than
    /// [`capacity`](Self::capacity).
    fn deliver(&self, data: &[u8]);
}

#[derive(Clone, Copy)]
struct RxState<const N: usize> {
    bytes: [u8; N],
    len: usize,
    deliveries: u32,
}

/// Fixed-size receive buffer safe to share with the completion interrupt.
///
/// Submission rejects read segments longer than `N`.
pub struct RxBuffer<const N: usize> {
    state: CriticalSectionCell<RxState<N>>,
}

impl<const N: usize> RxBuffer<N> {
    /// Create a zeroed buffer (const, suitable for statics).
    pub const fn new() -> Self {
        Self {
            state: CriticalSectionCell::new(RxState {
                bytes: [0; N],
                len: 0,
                deliveries: 0,
            }),
        }
    }

    /// Copy of the buffer contents.
    pub fn get(&self) -> [u8; N] {
        self.state.with_ref(|s| s.bytes)
    }

    /// Copy the last delivered bytes into `out`, returning how many were
    /// copied.
    pub fn copy_to(&self, out: &mut [u8]) -> usize {
        self.state.with_ref(|s| {
            let n = s.len.min(out.len());
            out[..n].copy_from_slice(&s.bytes[..n]);
            n
        })
    }

    /// Length of the last delivery.
    pub fn len(&self) -> usize {
        self.state.with_ref(|s| s.len)
    }

    /// True before the first delivery or after an empty one.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of deliveries since creation.
    pub fn deliveries(&self) -> u32 {
        self.state.with_ref(|s| s.deliveries)
    }
}

impl<const N: usize> Default for RxBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RxTarget for RxBuffer<N> {
    fn capacity(&self) -> usize {
        N
    }

    fn deliver(&self, data: &[u8]) {
        debug_assert!(data.len() <= N);
        self.state.with(|s| {
            let n = data.len().min(N);
            s.bytes[..n].copy_from_slice(&data[..n]);
            s.len = n;
            s.deliveries = s.deliveries.wrapping_add(1);
        });
    }
}

// =============================================================================
// Segments
// =============================================================================

/// Kind of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SegmentKind {
    /// Inline constant bytes, transmit only
    Const,
    /// Buffer region with optional transmit source and receive target
    Buffer,
}

/// One piece of a transaction.
#[derive(Clone, Copy)]
pub enum Segment<'a> {
    /// Bytes copied into the transfer buffer at submission. Nothing is
    /// received for this segment.
    Const(&'a [u8]),
    /// `size` bytes of the transfer buffer.
    Buffer {
        /// Transmit source; missing or short data is padded with `0xFF`
        tx: Option<&'a [u8]>,
        /// Receive target filled after the transfer completes
        rx: Option<&'static dyn RxTarget>,
        /// Segment length in bytes
        size: usize,
    },
}

impl<'a> Segment<'a> {
    /// Constant bytes, transmit only.
    pub const fn bytes(data: &'a [u8]) -> Self {
        Segment::Const(data)
    }

    /// Transmit `data`, ignore what comes back.
    pub const fn write(data: &'a [u8]) -> Self {
        Segment::Buffer {
            tx: Some(data),
            rx: None,
            size: data.len(),
        }
    }

    /// Clock `size` dummy bytes and deliver what comes back to `rx`.
    pub const fn read(rx: &'static dyn RxTarget, size: usize) -> Self {
        Segment::Buffer {
            tx: None,
            rx: Some(rx),
            size,
        }
    }

    /// Transmit `data` and deliver the same number of received bytes to `rx`.
    pub const fn transfer(data: &'a [u8], rx: &'static dyn RxTarget) -> Self {
        Segment::Buffer {
            tx: Some(data),
            rx: Some(rx),
            size: data.len(),
        }
    }

    /// Clock `size` dummy bytes and discard the response.
    pub const fn dummy(size: usize) -> Self {
        Segment::Buffer {
            tx: None,
            rx: None,
            size,
        }
    }

    /// Bytes this segment occupies in the transfer buffer.
    pub const fn size(&self) -> usize {
        match self {
            Segment::Const(data) => data.len(),
            Segment::Buffer { size, .. } => *size,
        }
    }

    /// Segment kind.
    pub const fn kind(&self) -> SegmentKind {
        match self {
            Segment::Const(_) => SegmentKind::Const,
            Segment::Buffer { .. } => SegmentKind::Buffer,
        }
    }

    /// Receive target, if any.
    pub const fn rx(&self) -> Option<&'static dyn RxTarget> {
        match self {
            Segment::Const(_) => None,
            Segment::Buffer { rx, .. } => *rx,
        }
    }
}

impl core::fmt::Debug for Segment<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Segment::Const(data) => f.debug_tuple("Const").field(data).finish(),
            Segment::Buffer { tx, rx, size } => f
                .debug_struct("Buffer")
                .field("tx", tx)
                .field("rx", &rx.is_some())
                .field("size", size)
                .finish(),
        }
    }
}

// =============================================================================
// Encoding
// =============================================================================

/// Bookkeeping kept per segment for receive delivery.
#[derive(Clone, Copy)]
pub(crate) struct SegmentRecord {
    pub size: usize,
    pub rx: Option<&'static dyn RxTarget>,
}

impl SegmentRecord {
    pub const EMPTY: Self = Self { size: 0, rx: None };
}

/// Result of packing segments into a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Encoded {
    /// Total bytes used
    pub size: usize,
    /// Number of segment records written
    pub count: usize,
    /// Any segment has a receive target
    pub has_rx: bool,
}

/// Check that `segments` fit the given limits without touching any buffer.
///
/// Every receive target must hold its whole segment.
pub(crate) fn validate(segments: &[Segment<'_>], buffer_len: usize, max_segments: usize) -> SpiResult<usize> {
    if segments.len() > max_segments {
        return Err(SpiError::TooManySegments);
    }
    if segments
        .iter()
        .any(|seg| seg.rx().is_some_and(|rx| seg.size() > rx.capacity()))
    {
        return Err(SpiError::BufferOverflow);
    }
    let total = segments
        .iter()
        .try_fold(0usize, |acc, seg| acc.checked_add(seg.size()))
        .ok_or(SpiError::BufferOverflow)?;
    if total > buffer_len {
        return Err(SpiError::BufferOverflow);
    }
    Ok(total)
}

/// Pack `segments` back-to-back into `buffer`, recording receive targets.
///
/// `segments` must have passed [`validate`] against `buffer.len()` and
/// `records.len()`.
pub(crate) fn pack(segments: &[Segment<'_>], buffer: &mut [u8], records: &mut [SegmentRecord]) -> Encoded {
    debug_assert!(validate(segments, buffer.len(), records.len()).is_ok());

    let mut offset = 0;
    let mut has_rx = false;
    for (seg, record) in segments.iter().zip(records.iter_mut()) {
        let len = seg.size();
        let region = &mut buffer[offset..offset + len];
        match *seg {
            Segment::Const(data) => region.copy_from_slice(data),
            Segment::Buffer { tx, .. } => {
                let src = tx.unwrap_or(&[]);
                let n = src.len().min(len);
                region[..n].copy_from_slice(&src[..n]);
                region[n..].fill(SPI_DUMMY_BYTE);
            }
        }
        *record = SegmentRecord { size: len, rx: seg.rx() };
        has_rx |= record.rx.is_some();
        offset += len;
    }

    Encoded {
        size: offset,
        count: segments.len(),
        has_rx,
    }
}

/// Hand each receive target its slice of a completed transfer buffer.
pub(crate) fn deliver(buffer: &[u8], records: &[SegmentRecord]) {
    let mut offset = 0;
    for record in records {
        let end = offset + record.size;
        if let Some(rx) = record.rx {
            rx.deliver(&buffer[offset..end]);
        }
        offset = end;
    }
}
