//! Hardware Abstraction Layer
//!
//! The peripheral I/O core is platform-independent. Everything that touches a
//! register goes through the capability traits defined here; a board crate
//! implements them for its MCU family.
//!
//! # Modules
//!
//! - [`gpio`]: pin identifiers
//! - [`spi`]: SPI port, DMA binding and the [`SpiHardware`] trait
//! - [`uart`]: UART channel, flags, interrupt sources and the [`UartHardware`] trait

pub mod gpio;
pub mod spi;
pub mod uart;

// Re-export commonly used types
pub use gpio::Pin;
pub use spi::{DmaBinding, DmaBuffer, SpiHardware, SpiPort};
pub use uart::{SerialChannel, UartFlag, UartHardware, UartInterrupt};
