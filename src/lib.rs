//! Flight-Controller Peripheral I/O Core
//!
//! A `no_std`, `no_alloc` implementation of the two concurrency engines that
//! move bytes between fixed memory buffers and the peripherals of a
//! multirotor flight controller:
//!
//! 1. **SPI transaction engine** ([`spi`]): pooled transactions, per-bus FIFO
//!    queues, DMA dispatch with lazy clock/mode reconfiguration, and a
//!    completion interrupt that chains the next transfer.
//! 2. **Serial ring engine** ([`serial`]): per-UART producer/consumer rings
//!    serviced by one generic interrupt handler, with half-duplex turnaround
//!    and error-flag recovery.
//!
//! # Architecture
//!
//! Both engines reach the silicon only through the capability traits in
//! [`hal`] ([`SpiHardware`], [`UartHardware`]). A platform crate implements
//! those with register access; everything else, including the interrupt
//! paths, runs and is tested on the host.
//!
//! State shared with interrupt handlers sits in
//! [`CriticalSectionCell`](sync::CriticalSectionCell)s; critical sections
//! are short and never held across a wait. The implementation comes from
//! the firmware's `critical-section` provider.
//!
//! # Features
//!
//! - `defmt`: log through `defmt` and derive `defmt::Format` for public types
//! - `log`: log through the `log` facade
//!
//! # Example
//!
//! ```ignore
//! use fc_periph::boards::generic_f405::GenericF405;
//! use fc_periph::serial::{RingBuffer, SerialConfig, SerialEngine, SerialPort};
//! use fc_periph::spi::{RxBuffer, Segment, SpiEngine, SpiEngineDefault};
//! use fc_periph::SerialChannel;
//!
//! static SPI: SpiEngineDefault<BoardSpi> = SpiEngine::new(BoardSpi);
//! static SERIAL: SerialEngine<'static, BoardUart> = SerialEngine::new(BoardUart);
//!
//! static GPS_RX: RingBuffer<512> = RingBuffer::new();
//! static GPS_TX: RingBuffer<512> = RingBuffer::new();
//! static GPS: SerialPort<'static> = SerialPort::new(GPS_RX.ring(), GPS_TX.ring());
//!
//! SPI.init(&GenericF405::CONFIG);
//! SPI.enable_dma();
//!
//! static WHO_AM_I: RxBuffer<1> = RxBuffer::new();
//! SPI.submit_and_wait(
//!     &GenericF405::gyro_bus(),
//!     &[Segment::bytes(&[0x75 | 0x80]), Segment::read(&WHO_AM_I, 1)],
//! );
//!
//! SERIAL.configure(&GPS, SerialConfig::new(SerialChannel::Uart4).with_baud(57_600));
//! SERIAL.write(SerialChannel::Uart4, b"$PUBX,40,GLL,0,0,0,0*5C\r\n");
//! ```
//!
//! # Memory Requirements
//!
//! The default SPI engine holds 32 slots of 512 bytes (~16 KB). Serial ring
//! storage is supplied by the caller.

#![no_std]
#![deny(missing_docs)]
#![allow(unsafe_code)]
#![deny(unsafe_op_in_unsafe_fn)]
// Clippy lint levels live here; thresholds and config are in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::too_many_arguments,
    clippy::struct_excessive_bools,
    clippy::fn_params_excessive_bools,
    clippy::type_complexity,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements
)]

// Logging shims; must come first so the macros are visible below.
mod fmt;

// =============================================================================
// Modules
// =============================================================================

pub mod board;
pub mod boards;
pub mod constants;
pub mod error;
pub mod fatal;
pub mod hal;
pub mod serial;
pub mod spi;
pub mod sync;

// Test utilities (only available during testing)
#[cfg(test)]
pub mod test_utils;

// =============================================================================
// Re-exports
// =============================================================================

pub use board::{BoardConfig, UART_PORT_DEFS};
pub use error::{Error, Result, SerialError, SerialResult, SpiError, SpiResult};
pub use fatal::failloop;
pub use hal::{Pin, SerialChannel, SpiHardware, SpiPort, UartHardware};
pub use serial::{SerialConfig, SerialEngine, SerialPort};
pub use spi::{Segment, SpiBus, SpiEngine};
