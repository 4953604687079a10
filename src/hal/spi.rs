//! SPI and DMA hardware boundary
//!
//! The SPI engine drives the peripheral exclusively through [`SpiHardware`].
//! Platform crates implement it with register access; the engine only ever
//! sees this opaque capability set.
//!
//! All methods take `&self`: implementations are register writes (volatile
//! and stateless from Rust's point of view), and the engine calls them from
//! both the main loop and the DMA completion interrupt.

use embedded_hal::spi::Mode;

use super::gpio::Pin;

/// Hardware SPI port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum SpiPort {
    /// SPI1
    Spi1 = 0,
    /// SPI2
    Spi2 = 1,
    /// SPI3
    Spi3 = 2,
    /// SPI4
    Spi4 = 3,
    /// SPI5
    Spi5 = 4,
    /// SPI6
    Spi6 = 5,
}

impl SpiPort {
    /// All ports in index order.
    pub const ALL: [SpiPort; crate::constants::SPI_PORT_COUNT] = [
        SpiPort::Spi1,
        SpiPort::Spi2,
        SpiPort::Spi3,
        SpiPort::Spi4,
        SpiPort::Spi5,
        SpiPort::Spi6,
    ];

    /// Zero-based index for per-port tables.
    #[inline(always)]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Peripheral number as printed on the datasheet (SPI1 = 1).
    #[inline(always)]
    pub const fn number(self) -> u8 {
        self as u8 + 1
    }
}

/// DMA controller/stream assignment for one SPI port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DmaBinding {
    /// DMA controller (1 or 2)
    pub controller: u8,
    /// Stream carrying the receive direction (completion interrupt source)
    pub rx_stream: u8,
    /// Stream carrying the transmit direction
    pub tx_stream: u8,
    /// Request channel / DMAMUX request id
    pub channel: u8,
}

impl DmaBinding {
    /// Create a binding.
    pub const fn new(controller: u8, rx_stream: u8, tx_stream: u8, channel: u8) -> Self {
        Self {
            controller,
            rx_stream,
            tx_stream,
            channel,
        }
    }
}

/// Transfer buffer handed to the DMA engine.
///
/// The memory belongs to a transaction slot that the engine has marked
/// in-progress; nothing else touches it until the completion handler runs.
/// The DMA transmits from and receives into the same bytes.
#[derive(Debug, Clone, Copy)]
pub struct DmaBuffer {
    ptr: *mut u8,
    len: usize,
}

impl DmaBuffer {
    pub(crate) const fn new(ptr: *mut u8, len: usize) -> Self {
        Self { ptr, len }
    }

    /// Start address for the memory-side DMA register.
    #[inline(always)]
    pub const fn as_mut_ptr(&self) -> *mut u8 {
        self.ptr
    }

    /// Address as a 32-bit bus address.
    #[inline(always)]
    pub fn addr_u32(&self) -> u32 {
        self.ptr as u32
    }

    /// Number of bytes to transfer.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True for zero-length transfers.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// SPI + DMA capability set of one platform.
pub trait SpiHardware {
    /// Enable clocks, reset and configure the port as a master, and prepare
    /// its DMA streams when a binding exists.
    fn init_port(&self, port: SpiPort, dma: Option<DmaBinding>);

    /// Configure a chip-select pin as an output and drive it inactive (high).
    fn init_chip_select(&self, pin: Pin);

    /// Drive a chip-select pin. `asserted` means active-low level.
    fn chip_select(&self, pin: Pin, asserted: bool);

    /// Program the port's clock prescaler for the requested bus rate.
    fn set_clock(&self, port: SpiPort, hz: u32);

    /// Program clock polarity and phase.
    fn set_mode(&self, port: SpiPort, mode: Mode);

    /// Enable or disable the SPI peripheral.
    fn enable(&self, port: SpiPort, enable: bool);

    /// Platform capability check: may this port's DMA streams start now?
    ///
    /// Used for errata such as two peripherals that must not share a DMA
    /// controller concurrently.
    fn dma_can_start(&self, port: SpiPort) -> bool;

    /// Enable the port's DMA completion interrupt at the given priority.
    fn dma_interrupt_enable(&self, port: SpiPort, priority: u8);

    /// Program both streams over `buffer`, enable the completion interrupt
    /// and start the transfer. Returns immediately.
    fn dma_begin(&self, port: SpiPort, buffer: DmaBuffer, has_rx: bool);

    /// Is the receive-complete flag set for this port's DMA?
    fn dma_transfer_complete(&self, port: SpiPort) -> bool;

    /// Clear completion flags, disable the completion interrupt, stop both
    /// streams and the peripheral.
    fn dma_finish(&self, port: SpiPort);

    /// Polled exchange of one byte: wait for TX empty, write, wait for RX
    /// not empty, read.
    fn transfer_byte(&self, port: SpiPort, byte: u8) -> u8;
}
