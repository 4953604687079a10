//! Serial port state shared between the application and the UART interrupt.

use core::sync::atomic::{AtomicBool, Ordering};

use crate::sync::CriticalSectionCell;

use super::config::SerialConfig;
use super::ring::Ring;

/// One UART's byte pipes.
///
/// The rings are caller-owned storage; the port only references them. Build
/// ports in statics and hand them to
/// [`SerialEngine::configure`](super::SerialEngine::configure):
///
/// ```ignore
/// static RX: RingBuffer<512> = RingBuffer::new();
/// static TX: RingBuffer<512> = RingBuffer::new();
/// static GPS: SerialPort<'static> = SerialPort::new(RX.ring(), TX.ring());
/// ```
pub struct SerialPort<'a> {
    config: CriticalSectionCell<Option<SerialConfig>>,
    rx: Ring<'a>,
    tx: Ring<'a>,
    tx_done: AtomicBool,
}

impl<'a> SerialPort<'a> {
    /// Create an unconfigured port over two rings.
    pub const fn new(rx: Ring<'a>, tx: Ring<'a>) -> Self {
        Self {
            config: CriticalSectionCell::new(None),
            rx,
            tx,
            tx_done: AtomicBool::new(true),
        }
    }

    /// Current configuration, if the port has been configured.
    pub fn config(&self) -> Option<SerialConfig> {
        self.config.with_ref(|c| *c)
    }

    /// Receive ring (interrupt produces, application consumes).
    #[inline]
    pub fn rx(&self) -> Ring<'a> {
        self.rx
    }

    /// Transmit ring (application produces, interrupt consumes).
    #[inline]
    pub fn tx(&self) -> Ring<'a> {
        self.tx
    }

    /// True once the transmit ring has drained into the peripheral.
    #[inline]
    pub fn is_tx_done(&self) -> bool {
        self.tx_done.load(Ordering::Acquire)
    }

    #[inline]
    pub(crate) fn set_tx_done(&self, done: bool) {
        self.tx_done.store(done, Ordering::Release);
    }

    /// Apply a configuration and drop anything left in the rings.
    pub(crate) fn reset(&self, config: SerialConfig) {
        self.config.with(|c| *c = Some(config));
        self.rx.clear();
        self.tx.clear();
        self.set_tx_done(true);
    }
}

impl core::fmt::Debug for SerialPort<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SerialPort")
            .field("config", &self.config())
            .field("rx", &self.rx)
            .field("tx", &self.tx)
            .field("tx_done", &self.is_tx_done())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::SerialChannel;
    use crate::serial::ring::RingBuffer;

    #[test]
    fn new_port_is_unconfigured_and_idle() {
        let rx: RingBuffer<8> = RingBuffer::new();
        let tx: RingBuffer<8> = RingBuffer::new();
        let port = SerialPort::new(rx.ring(), tx.ring());
        assert!(port.config().is_none());
        assert!(port.is_tx_done());
    }

    #[test]
    fn reset_stores_config_and_clears_rings() {
        let rx: RingBuffer<8> = RingBuffer::new();
        let tx: RingBuffer<8> = RingBuffer::new();
        let port = SerialPort::new(rx.ring(), tx.ring());
        port.rx().write_multi(b"xyz");
        port.tx().write(1);
        port.set_tx_done(false);

        let cfg = SerialConfig::new(SerialChannel::Usart3).with_baud(57_600);
        port.reset(cfg);
        assert_eq!(port.config(), Some(cfg));
        assert!(port.rx().is_empty());
        assert!(port.tx().is_empty());
        assert!(port.is_tx_done());
    }
}
