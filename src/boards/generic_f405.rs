//! Generic STM32F405 flight controller.
//!
//! The common F405 layout: gyro on SPI1, OSD on SPI2, blackbox flash on
//! SPI3, four UARTs with an inverter on USART1 for SBUS.

use crate::board::{BoardConfig, SerialPortDef, SpiDeviceDef, SpiPortDef};
use crate::constants::SPI_CLOCK_FREQ_HZ;
use crate::hal::{DmaBinding, Pin, SerialChannel, SpiPort};
use crate::spi::SpiBus;

/// Generic F405 constants and helpers.
pub struct GenericF405;

impl GenericF405 {
    // =========================================================================
    // Clocks
    // =========================================================================

    /// SPI kernel clock feeding the prescaler.
    pub const SPI_CLOCK_HZ: u32 = SPI_CLOCK_FREQ_HZ;

    /// Gyro register access clock.
    pub const GYRO_SLOW_HZ: u32 = 1_000_000;

    /// Gyro data clock.
    pub const GYRO_FAST_HZ: u32 = 21_000_000;

    /// OSD clock.
    pub const OSD_HZ: u32 = 10_500_000;

    /// Flash clock.
    pub const FLASH_HZ: u32 = 21_000_000;

    // =========================================================================
    // SPI Ports
    // =========================================================================

    /// SPI1: gyro. DMA2 stream 0 (rx) / stream 3 (tx), channel 3.
    pub const SPI1: SpiPortDef = SpiPortDef {
        port: SpiPort::Spi1,
        sck: Pin::pa(5),
        miso: Pin::pa(6),
        mosi: Pin::pa(7),
        dma: Some(DmaBinding::new(2, 0, 3, 3)),
    };

    /// SPI2: OSD. DMA1 stream 3 (rx) / stream 4 (tx), channel 0.
    pub const SPI2: SpiPortDef = SpiPortDef {
        port: SpiPort::Spi2,
        sck: Pin::pb(13),
        miso: Pin::pb(14),
        mosi: Pin::pb(15),
        dma: Some(DmaBinding::new(1, 3, 4, 0)),
    };

    /// SPI3: flash. DMA1 stream 0 (rx) / stream 7 (tx), channel 0.
    pub const SPI3: SpiPortDef = SpiPortDef {
        port: SpiPort::Spi3,
        sck: Pin::pc(10),
        miso: Pin::pc(11),
        mosi: Pin::pc(12),
        dma: Some(DmaBinding::new(1, 0, 7, 0)),
    };

    // =========================================================================
    // Devices
    // =========================================================================

    /// Gyro chip select.
    pub const GYRO: SpiDeviceDef = SpiDeviceDef {
        port: SpiPort::Spi1,
        nss: Pin::pa(4),
    };

    /// OSD chip select.
    pub const OSD: SpiDeviceDef = SpiDeviceDef {
        port: SpiPort::Spi2,
        nss: Pin::pb(12),
    };

    /// Flash chip select.
    pub const FLASH: SpiDeviceDef = SpiDeviceDef {
        port: SpiPort::Spi3,
        nss: Pin::pa(15),
    };

    // =========================================================================
    // Serial
    // =========================================================================

    /// USART1 with the SBUS inverter.
    pub const USART1: SerialPortDef = SerialPortDef {
        channel: SerialChannel::Usart1,
        rx: Pin::pa(10),
        tx: Pin::pa(9),
        inverter: Some(Pin::pc(0)),
    };

    /// USART3.
    pub const USART3: SerialPortDef = SerialPortDef {
        channel: SerialChannel::Usart3,
        rx: Pin::pb(11),
        tx: Pin::pb(10),
        inverter: None,
    };

    /// UART4.
    pub const UART4: SerialPortDef = SerialPortDef {
        channel: SerialChannel::Uart4,
        rx: Pin::pa(1),
        tx: Pin::pa(0),
        inverter: None,
    };

    /// USART6.
    pub const USART6: SerialPortDef = SerialPortDef {
        channel: SerialChannel::Usart6,
        rx: Pin::pc(7),
        tx: Pin::pc(6),
        inverter: None,
    };

    const SPI_PORTS: [SpiPortDef; 3] = [Self::SPI1, Self::SPI2, Self::SPI3];

    const SERIAL_PORTS: [SerialPortDef; 4] =
        [Self::USART1, Self::USART3, Self::UART4, Self::USART6];

    /// Full board description.
    pub const CONFIG: BoardConfig = BoardConfig {
        name: "GENERIC_F405",
        spi_ports: &Self::SPI_PORTS,
        serial_ports: &Self::SERIAL_PORTS,
        gyro: Some(Self::GYRO),
        osd: Some(Self::OSD),
        flash: Some(Self::FLASH),
        sdcard: None,
        rx_spi: None,
    };

    /// Gyro descriptor at register-access speed.
    pub const fn gyro_bus() -> SpiBus {
        Self::GYRO.bus().with_hz(Self::GYRO_SLOW_HZ)
    }

    /// OSD descriptor.
    pub const fn osd_bus() -> SpiBus {
        Self::OSD.bus().with_hz(Self::OSD_HZ)
    }

    /// Flash descriptor.
    pub const fn flash_bus() -> SpiBus {
        Self::FLASH.bus().with_hz(Self::FLASH_HZ)
    }
}
