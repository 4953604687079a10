//! SPI device descriptor.

use embedded_hal::spi::{MODE_3, Mode};

use crate::hal::{Pin, SpiPort};

/// Caller-supplied readiness predicate, e.g. a radio's BUSY line.
pub type PollFn = fn() -> bool;

/// Default bus clock for a freshly described device.
pub const DEFAULT_BUS_HZ: u32 = 1_000_000;

/// One chip on an SPI port.
///
/// A transaction snapshots the descriptor at submission time, so a driver
/// may change `hz` between transactions (slow for configuration, fast for
/// data) and each transfer still runs with the settings it was built with.
#[derive(Debug, Clone, Copy)]
pub struct SpiBus {
    /// Port the chip is wired to
    pub port: SpiPort,
    /// Chip-select pin (active low)
    pub nss: Pin,
    /// Requested bus clock
    pub hz: u32,
    /// Clock polarity/phase
    pub mode: Mode,
    /// Optional readiness predicate gating dispatch
    pub poll_fn: Option<PollFn>,
}

impl SpiBus {
    /// Describe a device with default clock and mode 3.
    pub const fn new(port: SpiPort, nss: Pin) -> Self {
        Self {
            port,
            nss,
            hz: DEFAULT_BUS_HZ,
            mode: MODE_3,
            poll_fn: None,
        }
    }

    /// Set the bus clock.
    #[must_use]
    pub const fn with_hz(mut self, hz: u32) -> Self {
        self.hz = hz;
        self
    }

    /// Set the SPI mode.
    #[must_use]
    pub const fn with_mode(mut self, mode: Mode) -> Self {
        self.mode = mode;
        self
    }

    /// Gate dispatch on a readiness predicate.
    #[must_use]
    pub const fn with_poll_fn(mut self, poll_fn: PollFn) -> Self {
        self.poll_fn = Some(poll_fn);
        self
    }

    /// Evaluate the readiness predicate (ready when none is set).
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.poll_fn.is_none_or(|f| f())
    }
}
