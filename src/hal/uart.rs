//! UART hardware boundary
//!
//! The serial engine drives every channel through [`UartHardware`]: flag
//! queries and clears, interrupt source enables, data register access and
//! direction control. Nothing else about the peripheral is visible to it.

use crate::serial::config::{Direction, SerialConfig};

/// Hardware UART/USART channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SerialChannel {
    /// USART1
    Usart1 = 0,
    /// USART2
    Usart2 = 1,
    /// USART3
    Usart3 = 2,
    /// UART4
    Uart4 = 3,
    /// UART5
    Uart5 = 4,
    /// USART6
    Usart6 = 5,
    /// UART7
    Uart7 = 6,
    /// UART8
    Uart8 = 7,
}

impl SerialChannel {
    /// All channels in index order.
    pub const ALL: [SerialChannel; crate::constants::SERIAL_PORT_COUNT] = [
        SerialChannel::Usart1,
        SerialChannel::Usart2,
        SerialChannel::Usart3,
        SerialChannel::Uart4,
        SerialChannel::Uart5,
        SerialChannel::Usart6,
        SerialChannel::Uart7,
        SerialChannel::Uart8,
    ];

    /// Zero-based index for per-channel tables.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Channel number as printed on the datasheet (USART1 = 1).
    #[inline(always)]
    pub const fn number(self) -> u8 {
        self as u8 + 1
    }
}

/// Status flags the serial interrupt handler inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartFlag {
    /// Transmit data register empty
    TxEmpty,
    /// Transmission complete (shift register drained)
    TxComplete,
    /// Receive data register not empty
    RxNotEmpty,
    /// Receiver overrun
    Overrun,
    /// Parity error
    Parity,
    /// Framing error
    Framing,
    /// Noise detected on the line
    Noise,
    /// Break / line-break detected
    Break,
}

impl UartFlag {
    /// Flags that mark the current data byte as corrupt.
    pub const ERRORS: [UartFlag; 5] = [
        UartFlag::Overrun,
        UartFlag::Parity,
        UartFlag::Framing,
        UartFlag::Noise,
        UartFlag::Break,
    ];

    /// Every flag, for clearing a channel wholesale.
    pub const ALL: [UartFlag; 8] = [
        UartFlag::TxEmpty,
        UartFlag::TxComplete,
        UartFlag::RxNotEmpty,
        UartFlag::Overrun,
        UartFlag::Parity,
        UartFlag::Framing,
        UartFlag::Noise,
        UartFlag::Break,
    ];
}

/// Interrupt sources of a UART channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartInterrupt {
    /// Transmit data register empty
    TxEmpty,
    /// Transmission complete
    TxComplete,
    /// Receive data register not empty
    RxNotEmpty,
}

impl UartInterrupt {
    /// Every interrupt source.
    pub const ALL: [UartInterrupt; 3] = [
        UartInterrupt::TxEmpty,
        UartInterrupt::TxComplete,
        UartInterrupt::RxNotEmpty,
    ];
}

/// UART capability set of one platform.
pub trait UartHardware {
    /// Enable the channel clock, reset it and apply line settings (baud, stop
    /// bits, direction, inversion, swap, half-duplex). Leaves the channel
    /// disabled with all interrupt sources off.
    fn init(&self, channel: SerialChannel, config: &SerialConfig);

    /// Enable or disable the channel.
    fn enable(&self, channel: SerialChannel, enable: bool);

    /// Switch the enabled transfer direction (half-duplex turnaround).
    fn set_direction(&self, channel: SerialChannel, direction: Direction);

    /// Is the status flag set?
    fn flag_is_set(&self, channel: SerialChannel, flag: UartFlag) -> bool;

    /// Acknowledge a status flag.
    fn flag_clear(&self, channel: SerialChannel, flag: UartFlag);

    /// Is the interrupt source enabled?
    fn interrupt_is_enabled(&self, channel: SerialChannel, source: UartInterrupt) -> bool;

    /// Enable or disable one interrupt source.
    fn interrupt_enable(&self, channel: SerialChannel, source: UartInterrupt, enable: bool);

    /// Enable or disable the channel's vector in the interrupt controller.
    fn irq_enable(&self, channel: SerialChannel, priority: u8, enable: bool);

    /// Read the data register (clears receive-not-empty).
    fn read_data(&self, channel: SerialChannel) -> u8;

    /// Write the data register.
    fn write_data(&self, channel: SerialChannel, byte: u8);
}
