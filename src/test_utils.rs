//! Testing utilities and mock implementations
//!
//! Host-side stand-ins for the SPI/DMA and UART hardware boundaries. Each
//! mock records the calls the engines make and lets a test play the part of
//! the peripheral: finishing DMA transfers, raising flags, injecting bytes.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::vec::Vec;

use embedded_hal::spi::Mode;

use crate::constants::{SERIAL_PORT_COUNT, SPI_CLOCK_FREQ_HZ, SPI_PORT_COUNT};
use crate::hal::{
    DmaBinding, DmaBuffer, Pin, SerialChannel, SpiHardware, SpiPort, UartFlag, UartHardware,
    UartInterrupt,
};
use crate::serial::config::{Direction, SerialConfig};
use crate::spi::ClockDivider;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

// =============================================================================
// Mock SPI / DMA
// =============================================================================

/// One recorded `dma_begin`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmaStart {
    pub port: SpiPort,
    /// Buffer contents at the moment the transfer started (MOSI bytes)
    pub tx: Vec<u8>,
    pub has_rx: bool,
}

/// Everything the mock SPI has seen.
#[derive(Debug)]
pub struct MockSpiState {
    pub port_inits: Vec<(SpiPort, Option<DmaBinding>)>,
    pub cs_inits: Vec<Pin>,
    /// (pin, asserted) in call order
    pub cs_log: Vec<(Pin, bool)>,
    pub clock_log: Vec<(SpiPort, u32)>,
    /// Prescaler a real port would have been programmed with, per port
    pub dividers: [Option<ClockDivider>; SPI_PORT_COUNT],
    pub mode_log: Vec<(SpiPort, Mode)>,
    pub dma_irqs: Vec<(SpiPort, u8)>,
    pub dma_starts: Vec<DmaStart>,
    /// Bytes written by polled transfers
    pub polled_tx: Vec<(SpiPort, u8)>,
    /// Bytes returned by polled transfers; 0x00 once drained
    pub miso: VecDeque<u8>,
    /// Ports that may not run DMA concurrently with each other
    pub shared_dma: Vec<SpiPort>,
    active: [Option<(usize, usize)>; SPI_PORT_COUNT],
    complete: [bool; SPI_PORT_COUNT],
}

/// Mock SPI hardware with simulated DMA.
///
/// # Example
///
/// ```ignore
/// let engine = SpiEngine::<_, 4, 16>::new(MockSpi::new());
/// engine.submit(&bus, &[Segment::bytes(&[0x9F])]);
/// engine.continue_port(bus.port);
/// engine.hardware().complete_dma(bus.port, &[0x00]);
/// engine.on_dma_complete(bus.port);
/// ```
#[derive(Debug)]
pub struct MockSpi {
    state: Mutex<MockSpiState>,
}

impl MockSpi {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(MockSpiState {
                port_inits: Vec::new(),
                cs_inits: Vec::new(),
                cs_log: Vec::new(),
                clock_log: Vec::new(),
                dividers: [None; SPI_PORT_COUNT],
                mode_log: Vec::new(),
                dma_irqs: Vec::new(),
                dma_starts: Vec::new(),
                polled_tx: Vec::new(),
                miso: VecDeque::new(),
                shared_dma: Vec::new(),
                active: [None; SPI_PORT_COUNT],
                complete: [false; SPI_PORT_COUNT],
            }),
        }
    }

    /// Inspect or adjust the recorded state.
    pub fn state(&self) -> MutexGuard<'_, MockSpiState> {
        lock(&self.state)
    }

    /// Mark ports whose DMA streams must not run at the same time.
    pub fn share_dma(&self, ports: &[SpiPort]) {
        self.state().shared_dma.extend_from_slice(ports);
    }

    /// Queue bytes returned by polled transfers.
    pub fn push_miso(&self, bytes: &[u8]) {
        self.state().miso.extend(bytes.iter().copied());
    }

    /// Is a DMA transfer running on `port`?
    pub fn dma_active(&self, port: SpiPort) -> bool {
        self.state().active[port.index()].is_some()
    }

    /// Number of DMA transfers started so far.
    pub fn dma_start_count(&self) -> usize {
        self.state().dma_starts.len()
    }

    /// Last transfer started on `port`.
    pub fn last_dma(&self, port: SpiPort) -> Option<DmaStart> {
        self.state()
            .dma_starts
            .iter()
            .rev()
            .find(|s| s.port == port)
            .cloned()
    }

    /// Play the DMA controller finishing the running transfer: `miso` lands in
    /// the transfer buffer and the completion flag rises.
    pub fn complete_dma(&self, port: SpiPort, miso: &[u8]) -> bool {
        let mut s = self.state();
        let Some((addr, len)) = s.active[port.index()] else {
            return false;
        };
        let n = miso.len().min(len);
        // SAFETY: the engine handed this buffer to `dma_begin` and does not
        // touch it until the completion flag is observed.
        unsafe { core::ptr::copy_nonoverlapping(miso.as_ptr(), addr as *mut u8, n) };
        s.complete[port.index()] = true;
        true
    }
}

impl Default for MockSpi {
    fn default() -> Self {
        Self::new()
    }
}

impl SpiHardware for MockSpi {
    fn init_port(&self, port: SpiPort, dma: Option<DmaBinding>) {
        self.state().port_inits.push((port, dma));
    }

    fn init_chip_select(&self, pin: Pin) {
        self.state().cs_inits.push(pin);
    }

    fn chip_select(&self, pin: Pin, asserted: bool) {
        self.state().cs_log.push((pin, asserted));
    }

    fn set_clock(&self, port: SpiPort, hz: u32) {
        let mut s = self.state();
        s.clock_log.push((port, hz));
        s.dividers[port.index()] = Some(ClockDivider::for_target(SPI_CLOCK_FREQ_HZ, hz));
    }

    fn set_mode(&self, port: SpiPort, mode: Mode) {
        self.state().mode_log.push((port, mode));
    }

    fn enable(&self, _port: SpiPort, _enable: bool) {}

    fn dma_can_start(&self, port: SpiPort) -> bool {
        let s = self.state();
        if !s.shared_dma.contains(&port) {
            return true;
        }
        !s.shared_dma
            .iter()
            .any(|&other| other != port && s.active[other.index()].is_some())
    }

    fn dma_interrupt_enable(&self, port: SpiPort, priority: u8) {
        self.state().dma_irqs.push((port, priority));
    }

    fn dma_begin(&self, port: SpiPort, buffer: DmaBuffer, has_rx: bool) {
        let mut s = self.state();
        // SAFETY: the engine guarantees `buffer` is valid for `len` bytes.
        let tx = unsafe { core::slice::from_raw_parts(buffer.as_mut_ptr(), buffer.len()) }.to_vec();
        s.dma_starts.push(DmaStart { port, tx, has_rx });
        s.active[port.index()] = Some((buffer.as_mut_ptr() as usize, buffer.len()));
        s.complete[port.index()] = false;
    }

    fn dma_transfer_complete(&self, port: SpiPort) -> bool {
        self.state().complete[port.index()]
    }

    fn dma_finish(&self, port: SpiPort) {
        let mut s = self.state();
        s.active[port.index()] = None;
        s.complete[port.index()] = false;
    }

    fn transfer_byte(&self, port: SpiPort, byte: u8) -> u8 {
        let mut s = self.state();
        s.polled_tx.push((port, byte));
        s.miso.pop_front().unwrap_or(0x00)
    }
}

// =============================================================================
// Mock UART
// =============================================================================

const FLAG_COUNT: usize = UartFlag::ALL.len();
const SOURCE_COUNT: usize = UartInterrupt::ALL.len();

/// Everything the mock UART has seen, per channel where it matters.
#[derive(Debug)]
pub struct MockUartState {
    pub inits: Vec<(SerialChannel, SerialConfig)>,
    pub enabled: [bool; SERIAL_PORT_COUNT],
    pub irq_enabled: [bool; SERIAL_PORT_COUNT],
    pub irq_priority: [u8; SERIAL_PORT_COUNT],
    /// Direction switches in call order
    pub directions: Vec<(SerialChannel, Direction)>,
    /// Bytes written to the data register in call order
    pub tx_log: Vec<(SerialChannel, u8)>,
    flags: [[bool; FLAG_COUNT]; SERIAL_PORT_COUNT],
    sources: [[bool; SOURCE_COUNT]; SERIAL_PORT_COUNT],
    rx_data: [u8; SERIAL_PORT_COUNT],
    shifting: [bool; SERIAL_PORT_COUNT],
}

/// Mock UART.
///
/// The transmit data register is always empty, so `TxEmpty` reads as set.
/// Writing a byte clears `TxComplete` until [`MockUart::shift_out`] plays the
/// line going idle. Reading the data register clears `RxNotEmpty`.
#[derive(Debug)]
pub struct MockUart {
    state: Mutex<MockUartState>,
}

impl MockUart {
    pub const fn new() -> Self {
        Self {
            state: Mutex::new(MockUartState {
                inits: Vec::new(),
                enabled: [false; SERIAL_PORT_COUNT],
                irq_enabled: [false; SERIAL_PORT_COUNT],
                irq_priority: [0; SERIAL_PORT_COUNT],
                directions: Vec::new(),
                tx_log: Vec::new(),
                flags: [[false; FLAG_COUNT]; SERIAL_PORT_COUNT],
                sources: [[false; SOURCE_COUNT]; SERIAL_PORT_COUNT],
                rx_data: [0; SERIAL_PORT_COUNT],
                shifting: [false; SERIAL_PORT_COUNT],
            }),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, MockUartState> {
        lock(&self.state)
    }

    /// Place a received byte in the data register.
    pub fn inject_rx(&self, channel: SerialChannel, byte: u8) {
        let mut s = self.state();
        s.rx_data[channel.index()] = byte;
        s.flags[channel.index()][UartFlag::RxNotEmpty as usize] = true;
    }

    /// The last written byte finished shifting out: raise `TxComplete`.
    /// Returns `false` when nothing was being transmitted.
    pub fn shift_out(&self, channel: SerialChannel) -> bool {
        let mut s = self.state();
        let i = channel.index();
        if !s.shifting[i] {
            return false;
        }
        s.shifting[i] = false;
        s.flags[i][UartFlag::TxComplete as usize] = true;
        true
    }

    /// Raise a status flag.
    pub fn raise(&self, channel: SerialChannel, flag: UartFlag) {
        self.state().flags[channel.index()][flag as usize] = true;
    }

    /// Raw flag state (ignores the always-set `TxEmpty` shortcut).
    pub fn flag(&self, channel: SerialChannel, flag: UartFlag) -> bool {
        self.state().flags[channel.index()][flag as usize]
    }

    pub fn source_enabled(&self, channel: SerialChannel, source: UartInterrupt) -> bool {
        self.state().sources[channel.index()][source as usize]
    }

    pub fn is_enabled(&self, channel: SerialChannel) -> bool {
        self.state().enabled[channel.index()]
    }

    /// Would the channel's interrupt line be asserted right now?
    pub fn irq_pending(&self, channel: SerialChannel) -> bool {
        let s = self.state();
        let i = channel.index();
        if !s.irq_enabled[i] {
            return false;
        }
        let txe = s.sources[i][UartInterrupt::TxEmpty as usize];
        let tc = s.sources[i][UartInterrupt::TxComplete as usize]
            && s.flags[i][UartFlag::TxComplete as usize];
        let rxne = s.sources[i][UartInterrupt::RxNotEmpty as usize]
            && s.flags[i][UartFlag::RxNotEmpty as usize];
        txe || tc || rxne
    }

    /// Bytes transmitted on `channel`.
    pub fn transmitted(&self, channel: SerialChannel) -> Vec<u8> {
        self.state()
            .tx_log
            .iter()
            .filter(|(ch, _)| *ch == channel)
            .map(|&(_, b)| b)
            .collect()
    }
}

impl Default for MockUart {
    fn default() -> Self {
        Self::new()
    }
}

impl UartHardware for MockUart {
    fn init(&self, channel: SerialChannel, config: &SerialConfig) {
        let mut s = self.state();
        s.inits.push((channel, *config));
        s.enabled[channel.index()] = false;
        s.sources[channel.index()] = [false; SOURCE_COUNT];
    }

    fn enable(&self, channel: SerialChannel, enable: bool) {
        self.state().enabled[channel.index()] = enable;
    }

    fn set_direction(&self, channel: SerialChannel, direction: Direction) {
        self.state().directions.push((channel, direction));
    }

    fn flag_is_set(&self, channel: SerialChannel, flag: UartFlag) -> bool {
        flag == UartFlag::TxEmpty || self.state().flags[channel.index()][flag as usize]
    }

    fn flag_clear(&self, channel: SerialChannel, flag: UartFlag) {
        self.state().flags[channel.index()][flag as usize] = false;
    }

    fn interrupt_is_enabled(&self, channel: SerialChannel, source: UartInterrupt) -> bool {
        self.state().sources[channel.index()][source as usize]
    }

    fn interrupt_enable(&self, channel: SerialChannel, source: UartInterrupt, enable: bool) {
        self.state().sources[channel.index()][source as usize] = enable;
    }

    fn irq_enable(&self, channel: SerialChannel, priority: u8, enable: bool) {
        let mut s = self.state();
        s.irq_enabled[channel.index()] = enable;
        s.irq_priority[channel.index()] = priority;
    }

    fn read_data(&self, channel: SerialChannel) -> u8 {
        let mut s = self.state();
        s.flags[channel.index()][UartFlag::RxNotEmpty as usize] = false;
        s.rx_data[channel.index()]
    }

    fn write_data(&self, channel: SerialChannel, byte: u8) {
        let mut s = self.state();
        s.tx_log.push((channel, byte));
        s.flags[channel.index()][UartFlag::TxComplete as usize] = false;
        s.shifting[channel.index()] = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_spi_polled_transfer_uses_miso_queue() {
        let spi = MockSpi::new();
        spi.push_miso(&[0xA5]);
        assert_eq!(spi.transfer_byte(SpiPort::Spi1, 0x9F), 0xA5);
        assert_eq!(spi.transfer_byte(SpiPort::Spi1, 0x00), 0x00);
        assert_eq!(spi.state().polled_tx.len(), 2);
    }

    #[test]
    fn mock_spi_shared_dma_blocks_second_port() {
        let spi = MockSpi::new();
        spi.share_dma(&[SpiPort::Spi1, SpiPort::Spi3]);
        let mut buf = [0u8; 2];
        spi.dma_begin(SpiPort::Spi1, DmaBuffer::new(buf.as_mut_ptr(), 2), false);
        assert!(!spi.dma_can_start(SpiPort::Spi3));
        assert!(spi.dma_can_start(SpiPort::Spi2));
        spi.dma_finish(SpiPort::Spi1);
        assert!(spi.dma_can_start(SpiPort::Spi3));
    }

    #[test]
    fn mock_uart_flags() {
        let uart = MockUart::new();
        let ch = SerialChannel::Usart2;
        assert!(uart.flag_is_set(ch, UartFlag::TxEmpty));
        assert!(!uart.flag_is_set(ch, UartFlag::TxComplete));
        uart.write_data(ch, 0x55);
        assert!(!uart.flag_is_set(ch, UartFlag::TxComplete));
        assert!(uart.shift_out(ch));
        assert!(uart.flag_is_set(ch, UartFlag::TxComplete));
        assert!(!uart.shift_out(ch));
        uart.inject_rx(ch, 0x42);
        assert!(uart.flag_is_set(ch, UartFlag::RxNotEmpty));
        assert_eq!(uart.read_data(ch), 0x42);
        assert!(!uart.flag_is_set(ch, UartFlag::RxNotEmpty));
        assert_eq!(uart.transmitted(ch), [0x55]);
    }
}
