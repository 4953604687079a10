//! Synchronization support
//!
//! All state shared between the main loop and interrupt handlers is either
//! guarded by a [`CriticalSectionCell`] (short, interrupt-disabling sections)
//! or owned through the transaction status protocol of the SPI engine and
//! the single-producer/single-consumer rings of the serial engine.
//!
//! # Example
//!
//! ```ignore
//! use fc_periph::sync::CriticalSectionCell;
//!
//! static COUNTER: CriticalSectionCell<u32> = CriticalSectionCell::new(0);
//!
//! #[interrupt]
//! fn DMA2_STREAM0() {
//!     COUNTER.with(|c| *c += 1);
//! }
//! ```

mod primitives;

pub use primitives::CriticalSectionCell;
