//! GPIO pin identifiers
//!
//! The core never drives GPIO registers itself. Pins are plain identifiers
//! handed to the hardware traits (chip-select, inverter control, busy lines).

/// A GPIO pin identified by port letter index (A = 0) and pin number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Pin {
    port: u8,
    number: u8,
}

impl Pin {
    /// Create a pin from a port index (A = 0, B = 1, ...) and pin number.
    pub const fn new(port: u8, number: u8) -> Self {
        Self { port, number }
    }

    /// Port A pin.
    pub const fn pa(number: u8) -> Self {
        Self::new(0, number)
    }

    /// Port B pin.
    pub const fn pb(number: u8) -> Self {
        Self::new(1, number)
    }

    /// Port C pin.
    pub const fn pc(number: u8) -> Self {
        Self::new(2, number)
    }

    /// Port D pin.
    pub const fn pd(number: u8) -> Self {
        Self::new(3, number)
    }

    /// Port index (A = 0).
    #[inline(always)]
    pub const fn port(&self) -> u8 {
        self.port
    }

    /// Pin number within the port.
    #[inline(always)]
    pub const fn number(&self) -> u8 {
        self.number
    }

    /// Port letter as ASCII (`b'A'` for port 0).
    pub const fn port_letter(&self) -> u8 {
        b'A' + self.port
    }
}

impl core::fmt::Display for Pin {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "P{}{}", self.port_letter() as char, self.number)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::format;

    #[test]
    fn pin_helpers_select_port() {
        assert_eq!(Pin::pa(4), Pin::new(0, 4));
        assert_eq!(Pin::pb(12).port(), 1);
        assert_eq!(Pin::pc(2).number(), 2);
        assert_eq!(Pin::pd(2).port(), 3);
    }

    #[test]
    fn pin_display() {
        assert_eq!(format!("{}", Pin::pa(15)), "PA15");
        assert_eq!(format!("{}", Pin::pc(0)), "PC0");
    }
}
