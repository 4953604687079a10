//! Serial line configuration.

use crate::constants::DEFAULT_BAUD_RATE;
use crate::hal::SerialChannel;

/// Number of stop bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopBits {
    /// Half a stop bit (smartcard framing)
    Half,
    /// One stop bit
    #[default]
    One,
    /// One and a half stop bits
    OneAndHalf,
    /// Two stop bits
    Two,
}

/// Enabled transfer directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Neither transmitter nor receiver
    None,
    /// Receive only
    Rx,
    /// Transmit only
    Tx,
    /// Both
    #[default]
    TxRx,
}

impl Direction {
    /// Receiver enabled?
    #[inline(always)]
    pub const fn has_rx(self) -> bool {
        matches!(self, Direction::Rx | Direction::TxRx)
    }

    /// Transmitter enabled?
    #[inline(always)]
    pub const fn has_tx(self) -> bool {
        matches!(self, Direction::Tx | Direction::TxRx)
    }
}

/// Settings for one UART channel.
///
/// Built with the `with_*` methods:
///
/// ```ignore
/// let cfg = SerialConfig::new(SerialChannel::Usart3)
///     .with_baud(420_000)
///     .with_half_duplex(true)
///     .with_invert(true);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialConfig {
    /// Hardware channel
    pub channel: SerialChannel,
    /// Baud rate
    pub baud: u32,
    /// Stop bits
    pub stop_bits: StopBits,
    /// Enabled directions
    pub direction: Direction,
    /// Single-wire half-duplex (TX pin shared for both directions)
    pub half_duplex: bool,
    /// Invert RX/TX line levels
    pub invert: bool,
    /// Swap RX and TX pins
    pub swap: bool,
}

impl SerialConfig {
    /// 115200 8N1, both directions, full duplex, no inversion or swap.
    pub const fn new(channel: SerialChannel) -> Self {
        Self {
            channel,
            baud: DEFAULT_BAUD_RATE,
            stop_bits: StopBits::One,
            direction: Direction::TxRx,
            half_duplex: false,
            invert: false,
            swap: false,
        }
    }

    /// Set the baud rate.
    #[must_use]
    pub const fn with_baud(mut self, baud: u32) -> Self {
        self.baud = baud;
        self
    }

    /// Set the number of stop bits.
    #[must_use]
    pub const fn with_stop_bits(mut self, stop_bits: StopBits) -> Self {
        self.stop_bits = stop_bits;
        self
    }

    /// Set the enabled directions.
    #[must_use]
    pub const fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Use single-wire half-duplex.
    #[must_use]
    pub const fn with_half_duplex(mut self, half_duplex: bool) -> Self {
        self.half_duplex = half_duplex;
        self
    }

    /// Invert line levels.
    #[must_use]
    pub const fn with_invert(mut self, invert: bool) -> Self {
        self.invert = invert;
        self
    }

    /// Swap RX and TX pins.
    #[must_use]
    pub const fn with_swap(mut self, swap: bool) -> Self {
        self.swap = swap;
        self
    }

    /// Direction the line idles in between transmissions.
    ///
    /// A half-duplex port that can receive listens by default; otherwise the
    /// configured direction applies.
    pub const fn idle_direction(&self) -> Direction {
        if self.half_duplex && self.direction.has_rx() {
            Direction::Rx
        } else {
            self.direction
        }
    }
}
