//! Interrupt-driven UART engine.
//!
//! Every channel is serviced by one generic handler. The application writes
//! into a port's TX ring and enables the transmit-empty interrupt; the
//! handler moves one byte per interrupt into the data register, and moves
//! received bytes into the RX ring. Half-duplex ports are turned around to
//! transmit by [`SerialEngine::write`] and back to receive by the
//! transmission-complete interrupt once the TX ring has drained.

use crate::board::channel_for_irq;
use crate::constants::{SERIAL_PORT_COUNT, SERIAL_PRIORITY};
use crate::error::{SerialError, SerialResult};
use crate::fmt::{debug, info, trace, warn};
use crate::hal::{SerialChannel, UartFlag, UartHardware, UartInterrupt};
use crate::sync::CriticalSectionCell;

use super::config::{Direction, SerialConfig};
use super::port::SerialPort;

/// Serial engine over one UART hardware implementation.
///
/// Ports are registered by [`configure`](Self::configure) and stay
/// registered; the engine only references their rings.
pub struct SerialEngine<'a, H> {
    hw: H,
    ports: CriticalSectionCell<[Option<&'a SerialPort<'a>>; SERIAL_PORT_COUNT]>,
}

impl<'a, H> SerialEngine<'a, H> {
    /// Create an engine with no ports registered.
    pub const fn new(hw: H) -> Self {
        Self {
            hw,
            ports: CriticalSectionCell::new([None; SERIAL_PORT_COUNT]),
        }
    }

    /// Hardware implementation.
    pub fn hardware(&self) -> &H {
        &self.hw
    }

    /// Port registered on `channel`.
    pub fn port(&self, channel: SerialChannel) -> Option<&'a SerialPort<'a>> {
        self.ports.with_ref(|ports| ports[channel.index()])
    }
}

impl<'a, H: UartHardware> SerialEngine<'a, H> {
    /// Bind `port` to `config.channel` and bring the channel up.
    ///
    /// Re-configuring a channel replaces its port and discards anything
    /// still queued in the new port's rings.
    pub fn configure(&self, port: &'a SerialPort<'a>, config: SerialConfig) {
        let ch = config.channel;

        self.hw.irq_enable(ch, SERIAL_PRIORITY, false);
        port.reset(config);
        self.ports.with(|ports| ports[ch.index()] = Some(port));

        self.hw.init(ch, &config);
        for flag in UartFlag::ALL {
            self.hw.flag_clear(ch, flag);
        }
        if config.half_duplex {
            self.hw.set_direction(ch, config.idle_direction());
        }
        self.hw.enable(ch, true);

        if config.direction.has_tx() {
            self.hw.interrupt_enable(ch, UartInterrupt::TxComplete, true);
        }
        if config.direction.has_rx() {
            self.hw.interrupt_enable(ch, UartInterrupt::RxNotEmpty, true);
        }
        self.hw.irq_enable(ch, SERIAL_PRIORITY, true);

        info!(
            "serial {} configured: {} baud, half duplex {}, invert {}",
            ch.number(),
            config.baud,
            config.half_duplex,
            config.invert
        );
    }

    fn tx_port(&self, channel: SerialChannel) -> SerialResult<(&'a SerialPort<'a>, SerialConfig)> {
        let port = self.port(channel).ok_or(SerialError::PortNotConfigured)?;
        let config = port.config().ok_or(SerialError::PortNotConfigured)?;
        if !config.direction.has_tx() {
            return Err(SerialError::DirectionNotEnabled);
        }
        Ok((port, config))
    }

    /// Queue `data` for transmission.
    ///
    /// Blocks while the TX ring is full, so data longer than the ring is sent
    /// in chunks as the interrupt drains it. Never call this from the
    /// channel's own interrupt.
    pub fn try_write(&self, channel: SerialChannel, data: &[u8]) -> SerialResult<()> {
        let (port, config) = self.tx_port(channel)?;
        let tx = port.tx();

        let mut rest = data;
        while !rest.is_empty() {
            let n = tx.write_multi(rest);
            if n == 0 {
                core::hint::spin_loop();
                continue;
            }
            rest = &rest[n..];

            // tx_done must drop before the turnaround so a late TC from the
            // previous burst cannot flip the line back to receive.
            port.set_tx_done(false);
            if config.half_duplex {
                self.hw.set_direction(channel, Direction::Tx);
            }
            self.hw.interrupt_enable(channel, UartInterrupt::TxEmpty, true);
        }
        Ok(())
    }

    /// Queue `data` for transmission. Returns `false` when the channel has no
    /// port or cannot transmit.
    pub fn write(&self, channel: SerialChannel, data: &[u8]) -> bool {
        match self.try_write(channel, data) {
            Ok(()) => true,
            Err(e) => {
                debug!("serial {} write rejected: {}", channel.number(), e.as_str());
                false
            }
        }
    }

    /// Take up to `out.len()` received bytes. Returns the count.
    pub fn read(&self, channel: SerialChannel, out: &mut [u8]) -> usize {
        self.port(channel).map_or(0, |port| port.rx().read_multi(out))
    }

    /// Take one received byte.
    pub fn read_byte(&self, channel: SerialChannel) -> Option<u8> {
        self.port(channel).and_then(|port| port.rx().read())
    }

    /// Bytes waiting in the RX ring.
    pub fn rx_available(&self, channel: SerialChannel) -> usize {
        self.port(channel).map_or(0, |port| port.rx().len())
    }

    /// True when everything written has been handed to the peripheral.
    /// Unconfigured channels report done.
    pub fn is_tx_done(&self, channel: SerialChannel) -> bool {
        self.port(channel).is_none_or(SerialPort::is_tx_done)
    }

    /// Interrupt entry by vector number. Unknown vectors are ignored.
    pub fn on_irq(&self, irq: u16) {
        match channel_for_irq(irq) {
            Some(channel) => self.on_interrupt(channel),
            None => trace!("serial: vector {} has no channel", irq),
        }
    }

    /// Generic UART interrupt handler.
    pub fn on_interrupt(&self, channel: SerialChannel) {
        let Some(port) = self.port(channel) else {
            self.disable_stray(channel);
            return;
        };
        let half_duplex = port.config().is_some_and(|c| c.half_duplex);

        // A set error flag marks the byte in the data register as corrupt.
        let mut discarded = false;
        for flag in UartFlag::ERRORS {
            if self.hw.flag_is_set(channel, flag) {
                self.hw.flag_clear(channel, flag);
                discarded = true;
            }
        }
        if discarded && self.hw.flag_is_set(channel, UartFlag::RxNotEmpty) {
            let _ = self.hw.read_data(channel);
        }

        if self.hw.interrupt_is_enabled(channel, UartInterrupt::TxComplete)
            && self.hw.flag_is_set(channel, UartFlag::TxComplete)
        {
            self.hw.flag_clear(channel, UartFlag::TxComplete);
            if half_duplex && port.is_tx_done() {
                self.hw.set_direction(channel, Direction::Rx);
            }
        }

        if self.hw.interrupt_is_enabled(channel, UartInterrupt::TxEmpty)
            && self.hw.flag_is_set(channel, UartFlag::TxEmpty)
        {
            match port.tx().read() {
                Some(byte) => self.hw.write_data(channel, byte),
                None => {
                    self.hw.interrupt_enable(channel, UartInterrupt::TxEmpty, false);
                    port.set_tx_done(true);
                }
            }
        }

        if !discarded
            && self.hw.interrupt_is_enabled(channel, UartInterrupt::RxNotEmpty)
            && self.hw.flag_is_set(channel, UartFlag::RxNotEmpty)
        {
            let byte = self.hw.read_data(channel);
            // A full RX ring drops the byte; the consumer is too slow.
            let _ = port.rx().write(byte);
        }
    }

    fn disable_stray(&self, channel: SerialChannel) {
        warn!("serial {}: stray interrupt, disabling channel", channel.number());
        for source in UartInterrupt::ALL {
            self.hw.interrupt_enable(channel, source, false);
        }
        for flag in UartFlag::ERRORS {
            self.hw.flag_clear(channel, flag);
        }
        self.hw.enable(channel, false);
    }
}
