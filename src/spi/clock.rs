//! SPI clock prescaler selection.

use crate::constants::{SPI_DIVIDER_MAX, SPI_DIVIDER_MIN};

/// Power-of-two SPI baud-rate prescaler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClockDivider(u32);

impl ClockDivider {
    /// Smallest divider whose output does not exceed `target_hz`.
    ///
    /// Starts at /2 and doubles until the bus clock drops to or below the
    /// target, saturating at /256.
    pub const fn for_target(kernel_hz: u32, target_hz: u32) -> Self {
        let mut divider = SPI_DIVIDER_MIN;
        let mut clock = kernel_hz / divider;
        while clock > target_hz && divider < SPI_DIVIDER_MAX {
            divider <<= 1;
            clock >>= 1;
        }
        Self(divider)
    }

    /// Divider value (2, 4, ... 256).
    #[inline(always)]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Encoded 3-bit `BR` field (`/2` = 0 ... `/256` = 7).
    #[inline(always)]
    pub const fn register_bits(self) -> u32 {
        self.0.trailing_zeros() - 1
    }

    /// Resulting bus clock for a kernel clock.
    #[inline(always)]
    pub const fn output_hz(self, kernel_hz: u32) -> u32 {
        kernel_hz / self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SPI_CLOCK_FREQ_HZ;

    #[test]
    fn exact_half_uses_min_divider() {
        let div = ClockDivider::for_target(84_000_000, 42_000_000);
        assert_eq!(div.value(), 2);
        assert_eq!(div.register_bits(), 0);
    }

    #[test]
    fn rounds_down_to_not_exceed_target() {
        let div = ClockDivider::for_target(84_000_000, 20_000_000);
        assert_eq!(div.value(), 8);
        assert!(div.output_hz(84_000_000) <= 20_000_000);
    }

    #[test]
    fn slow_init_clock() {
        let div = ClockDivider::for_target(SPI_CLOCK_FREQ_HZ, 400_000);
        assert_eq!(div.value(), 256);
        assert_eq!(div.register_bits(), 7);
    }

    #[test]
    fn zero_target_saturates() {
        assert_eq!(ClockDivider::for_target(84_000_000, 0).value(), 256);
    }

    #[test]
    fn target_above_kernel_uses_min() {
        assert_eq!(ClockDivider::for_target(84_000_000, 200_000_000).value(), 2);
    }
}
