//! Error types for the peripheral I/O core
//!
//! Errors are organized by subsystem:
//! - [`SpiError`]: transaction pool and segment encoding failures
//! - [`SerialError`]: calls against unusable serial channels
//!
//! The unified [`Error`] enum wraps both. SPI errors are provisioning
//! errors: the blocking [`SpiEngine::submit`](crate::spi::SpiEngine::submit)
//! path escalates them through [`failloop`](crate::fatal::failloop) instead of
//! returning them.

// =============================================================================
// SPI Errors
// =============================================================================

/// SPI transaction errors
///
/// Each of these means the compile-time provisioning (pool size, buffer size,
/// segment count) is too small for the workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpiError {
    /// No free transaction slot in the pool
    PoolExhausted,
    /// Segments do not fit the fixed transfer buffer
    BufferOverflow,
    /// More segments than a transaction can describe
    TooManySegments,
}

impl core::fmt::Display for SpiError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SpiError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            SpiError::PoolExhausted => "spi transaction pool exhausted",
            SpiError::BufferOverflow => "spi segments exceed transfer buffer",
            SpiError::TooManySegments => "spi segment count exceeds limit",
        }
    }
}

// =============================================================================
// Serial Errors
// =============================================================================

/// Serial port errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SerialError {
    /// No port is registered on the channel
    PortNotConfigured,
    /// The port was configured without the requested direction
    DirectionNotEnabled,
}

impl core::fmt::Display for SerialError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl SerialError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            SerialError::PortNotConfigured => "serial port not configured",
            SerialError::DirectionNotEnabled => "serial direction not enabled",
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// Unified error type for the crate.
///
/// Match on the inner domain error for specific handling:
///
/// ```ignore
/// fn on_fault(err: Error) {
///     match err {
///         Error::Spi(SpiError::PoolExhausted) => { /* provision more slots */ }
///         Error::Spi(_) => { /* segment limits */ }
///         Error::Serial(_) => { /* serial setup */ }
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// SPI transaction error
    Spi(SpiError),
    /// Serial port error
    Serial(SerialError),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::Spi(e) => write!(f, "spi: {e}"),
            Error::Serial(e) => write!(f, "serial: {e}"),
        }
    }
}

impl Error {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Error::Spi(e) => e.as_str(),
            Error::Serial(e) => e.as_str(),
        }
    }

    /// Number of LED blinks a halt routine should repeat for this error.
    #[must_use]
    pub const fn blink_code(&self) -> u8 {
        match self {
            Error::Spi(_) => 5,
            Error::Serial(_) => 6,
        }
    }
}

impl From<SpiError> for Error {
    fn from(e: SpiError) -> Self {
        Error::Spi(e)
    }
}

impl From<SerialError> for Error {
    fn from(e: SerialError) -> Self {
        Error::Serial(e)
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type alias using the unified Error type
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for SPI operations
pub type SpiResult<T> = core::result::Result<T, SpiError>;

/// Result type alias for serial operations
pub type SerialResult<T> = core::result::Result<T, SerialError>;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::format;

    #[test]
    fn spi_error_display_matches_as_str() {
        for e in [
            SpiError::PoolExhausted,
            SpiError::BufferOverflow,
            SpiError::TooManySegments,
        ] {
            assert_eq!(format!("{e}"), e.as_str());
        }
    }

    #[test]
    fn unified_error_display_is_prefixed() {
        let e: Error = SpiError::BufferOverflow.into();
        assert_eq!(format!("{e}"), "spi: spi segments exceed transfer buffer");

        let e: Error = SerialError::PortNotConfigured.into();
        assert_eq!(format!("{e}"), "serial: serial port not configured");
    }

    #[test]
    fn from_conversions_wrap_domain() {
        assert_eq!(
            Error::from(SpiError::PoolExhausted),
            Error::Spi(SpiError::PoolExhausted)
        );
        assert_eq!(
            Error::from(SerialError::DirectionNotEnabled),
            Error::Serial(SerialError::DirectionNotEnabled)
        );
    }

    #[test]
    fn question_mark_propagates_into_unified() {
        fn inner() -> SpiResult<()> {
            Err(SpiError::TooManySegments)
        }
        fn outer() -> Result<()> {
            inner()?;
            Ok(())
        }
        assert_eq!(outer(), Err(Error::Spi(SpiError::TooManySegments)));
    }

    #[test]
    fn blink_codes_differ_per_domain() {
        let spi = Error::Spi(SpiError::PoolExhausted).blink_code();
        let serial = Error::Serial(SerialError::PortNotConfigured).blink_code();
        assert_ne!(spi, serial);
    }
}
