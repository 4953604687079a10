//! SPI transaction subsystem.
//!
//! - [`pool`]: free-slot bitmap
//! - [`queue`]: per-port FIFO of slot indices
//! - [`segment`]: segment list, receive targets, buffer encoding
//! - [`txn`]: slot body, status, completion callback
//! - [`bus`]: device descriptor
//! - [`clock`]: prescaler selection for hardware implementations
//! - [`engine`]: submission, dispatch, completion

pub mod bus;
pub mod clock;
pub mod engine;
pub mod pool;
pub mod queue;
pub mod segment;
pub mod txn;

pub use crate::hal::SpiPort;
pub use bus::{PollFn, SpiBus};
pub use clock::ClockDivider;
pub use engine::{SpiEngine, SpiEngineDefault};
pub use pool::TxnPool;
pub use queue::BusQueue;
pub use segment::{RxBuffer, RxTarget, Segment, SegmentKind};
pub use txn::{Completion, TxnStatus};
