//! Interrupt-driven serial subsystem.
//!
//! - [`ring`]: SPSC byte rings
//! - [`config`]: line settings
//! - [`port`]: per-UART state shared with the interrupt
//! - [`engine`]: configure, write, read and the generic interrupt handler

pub mod config;
pub mod engine;
pub mod port;
pub mod ring;

pub use crate::hal::SerialChannel;
pub use config::{Direction, SerialConfig, StopBits};
pub use engine::SerialEngine;
pub use port::SerialPort;
pub use ring::{Ring, RingBuffer};
