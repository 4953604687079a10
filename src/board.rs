//! Board configuration.
//!
//! Read-only wiring description supplied once at boot: which SPI ports
//! exist and their DMA streams, which UART channels are routed to pins, and
//! the SPI device table. The engines take what they need from it and never
//! modify it.

use crate::constants::SERIAL_PORT_COUNT;
use crate::hal::{DmaBinding, Pin, SerialChannel, SpiPort};
use crate::spi::SpiBus;

// =============================================================================
// SPI
// =============================================================================

/// Pins and DMA streams of one SPI port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiPortDef {
    /// Port
    pub port: SpiPort,
    /// Clock pin
    pub sck: Pin,
    /// Master-in pin
    pub miso: Pin,
    /// Master-out pin
    pub mosi: Pin,
    /// DMA streams; `None` runs the port polled
    pub dma: Option<DmaBinding>,
}

/// One chip on an SPI port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpiDeviceDef {
    /// Port the chip is wired to
    pub port: SpiPort,
    /// Chip-select pin
    pub nss: Pin,
}

impl SpiDeviceDef {
    /// Device descriptor with default clock and mode.
    pub const fn bus(&self) -> SpiBus {
        SpiBus::new(self.port, self.nss)
    }
}

/// SPI radio receiver wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxSpiDef {
    /// Bus device
    pub device: SpiDeviceDef,
    /// Busy line gating transfers (high = busy)
    pub busy: Option<Pin>,
    /// Data-ready interrupt line
    pub exti: Option<Pin>,
}

// =============================================================================
// Serial
// =============================================================================

/// Pins of one UART channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SerialPortDef {
    /// Channel
    pub channel: SerialChannel,
    /// Receive pin
    pub rx: Pin,
    /// Transmit pin
    pub tx: Pin,
    /// External signal inverter control pin
    pub inverter: Option<Pin>,
}

/// Fixed facts about one UART channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartPortDef {
    /// Channel
    pub channel: SerialChannel,
    /// Interrupt vector number
    pub irq: u16,
}

impl UartPortDef {
    const fn new(channel: SerialChannel, irq: u16) -> Self {
        Self { channel, irq }
    }
}

/// Channel descriptor table, indexed by [`SerialChannel::index`].
///
/// Vector numbers are the STM32F4/F7 NVIC positions.
pub const UART_PORT_DEFS: [UartPortDef; SERIAL_PORT_COUNT] = [
    UartPortDef::new(SerialChannel::Usart1, 37),
    UartPortDef::new(SerialChannel::Usart2, 38),
    UartPortDef::new(SerialChannel::Usart3, 39),
    UartPortDef::new(SerialChannel::Uart4, 52),
    UartPortDef::new(SerialChannel::Uart5, 53),
    UartPortDef::new(SerialChannel::Usart6, 71),
    UartPortDef::new(SerialChannel::Uart7, 82),
    UartPortDef::new(SerialChannel::Uart8, 83),
];

/// Channel served by an interrupt vector.
pub fn channel_for_irq(irq: u16) -> Option<SerialChannel> {
    UART_PORT_DEFS
        .iter()
        .find(|def| def.irq == irq)
        .map(|def| def.channel)
}

// =============================================================================
// Board
// =============================================================================

/// Complete board wiring.
#[derive(Debug, Clone, Copy)]
pub struct BoardConfig {
    /// Board name for logs
    pub name: &'static str,
    /// SPI ports in use
    pub spi_ports: &'static [SpiPortDef],
    /// UART channels routed to pins
    pub serial_ports: &'static [SerialPortDef],
    /// Gyro / IMU
    pub gyro: Option<SpiDeviceDef>,
    /// On-screen display chip
    pub osd: Option<SpiDeviceDef>,
    /// Blackbox flash
    pub flash: Option<SpiDeviceDef>,
    /// SD card
    pub sdcard: Option<SpiDeviceDef>,
    /// SPI radio receiver
    pub rx_spi: Option<RxSpiDef>,
}

impl BoardConfig {
    /// Board with no peripherals; fill in with struct update syntax.
    pub const fn empty(name: &'static str) -> Self {
        Self {
            name,
            spi_ports: &[],
            serial_ports: &[],
            gyro: None,
            osd: None,
            flash: None,
            sdcard: None,
            rx_spi: None,
        }
    }

    /// Port definition for `port`, if the board uses it.
    pub fn spi_port(&self, port: SpiPort) -> Option<&SpiPortDef> {
        self.spi_ports.iter().find(|def| def.port == port)
    }

    /// DMA binding of `port`, if any.
    pub fn dma_binding(&self, port: SpiPort) -> Option<DmaBinding> {
        self.spi_port(port).and_then(|def| def.dma)
    }

    /// Pin definition for `channel`, if routed.
    pub fn serial_port(&self, channel: SerialChannel) -> Option<&SerialPortDef> {
        self.serial_ports.iter().find(|def| def.channel == channel)
    }

    /// Every SPI device on the board.
    pub fn spi_devices(&self) -> impl Iterator<Item = SpiDeviceDef> + '_ {
        [
            self.gyro,
            self.osd,
            self.flash,
            self.sdcard,
            self.rx_spi.map(|r| r.device),
        ]
        .into_iter()
        .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uart_table_is_indexed_by_channel() {
        for (i, def) in UART_PORT_DEFS.iter().enumerate() {
            assert_eq!(def.channel.index(), i);
        }
    }

    #[test]
    fn irq_lookup() {
        assert_eq!(channel_for_irq(37), Some(SerialChannel::Usart1));
        assert_eq!(channel_for_irq(71), Some(SerialChannel::Usart6));
        assert_eq!(channel_for_irq(0), None);
    }

    #[test]
    fn empty_board_has_no_devices() {
        let board = BoardConfig::empty("none");
        assert_eq!(board.spi_devices().count(), 0);
        assert!(board.spi_port(SpiPort::Spi1).is_none());
        assert!(board.dma_binding(SpiPort::Spi1).is_none());
    }

    #[test]
    fn device_table_lists_present_devices() {
        static PORTS: [SpiPortDef; 1] = [SpiPortDef {
            port: SpiPort::Spi1,
            sck: Pin::pa(5),
            miso: Pin::pa(6),
            mosi: Pin::pa(7),
            dma: None,
        }];
        let board = BoardConfig {
            spi_ports: &PORTS,
            gyro: Some(SpiDeviceDef {
                port: SpiPort::Spi1,
                nss: Pin::pa(4),
            }),
            rx_spi: Some(RxSpiDef {
                device: SpiDeviceDef {
                    port: SpiPort::Spi1,
                    nss: Pin::pc(2),
                },
                busy: Some(Pin::pc(3)),
                exti: None,
            }),
            ..BoardConfig::empty("test")
        };
        let nss: [Pin; 2] = [Pin::pa(4), Pin::pc(2)];
        assert!(board.spi_devices().map(|d| d.nss).eq(nss));
        assert!(board.spi_port(SpiPort::Spi1).is_some());
    }
}
