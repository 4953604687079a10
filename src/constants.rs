//! Centralized Constants
//!
//! Compile-time provisioning for the peripheral I/O core. Every fixed
//! capacity in the crate comes from here so a board can see its memory
//! budget in one place.
//!
//! # Organization
//!
//! - **SPI transactions**: pool size, buffer size, segment limit
//! - **Ports**: number of SPI ports and UART channels
//! - **Interrupts**: NVIC priorities
//! - **Clocks**: SPI kernel clock and divider range
//! - **Serial**: default line settings

// =============================================================================
// SPI Transactions
// =============================================================================

/// Number of transaction slots in the pool (one bit each in the free bitmap)
pub const SPI_TXN_MAX: usize = 32;

/// Size of each transaction's transfer buffer in bytes
pub const SPI_TXN_BUFFER_SIZE: usize = 512;

/// Maximum number of segments in a single transaction
pub const SPI_TXN_SEG_MAX: usize = 8;

/// Byte clocked out for buffer segments without transmit data
pub const SPI_DUMMY_BYTE: u8 = 0xFF;

// =============================================================================
// Ports
// =============================================================================

/// Number of hardware SPI ports
pub const SPI_PORT_COUNT: usize = 6;

/// Number of hardware UART/USART channels
pub const SERIAL_PORT_COUNT: usize = 8;

// =============================================================================
// Interrupt Priorities
// =============================================================================

/// NVIC priority of the SPI DMA completion interrupts
pub const DMA_PRIORITY: u8 = 0x02;

/// NVIC priority of the UART interrupts
pub const SERIAL_PRIORITY: u8 = 0x03;

// =============================================================================
// Clocks
// =============================================================================

/// SPI kernel clock of the reference board in Hz
pub const SPI_CLOCK_FREQ_HZ: u32 = 84_000_000;

/// Smallest SPI prescaler
pub const SPI_DIVIDER_MIN: u32 = 2;

/// Largest SPI prescaler
pub const SPI_DIVIDER_MAX: u32 = 256;

// =============================================================================
// Serial
// =============================================================================

/// Default baud rate for newly built serial configurations
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default ring capacity used by board bring-up code
pub const DEFAULT_RING_SIZE: usize = 512;
