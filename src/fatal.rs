//! Unrecoverable-error path.
//!
//! Provisioning errors (pool, buffer or segment limits too small) are
//! configuration bugs, not runtime conditions. The blocking submit paths
//! escalate them here: the error is logged and the core panics. The
//! firmware's panic handler is expected to halt with interrupts disabled
//! and blink [`Error::blink_code`] on the status LED.

use crate::error::Error;
use crate::fmt::error;

/// Log `err` and halt via panic. Never returns.
#[cold]
#[inline(never)]
pub fn failloop(err: Error) -> ! {
    error!("failloop: {} (blink code {})", err.as_str(), err.blink_code());
    panic!("failloop: {err}")
}

/// Unwrap a result, escalating any error to [`failloop`].
#[inline]
#[track_caller]
pub fn unwrap_or_failloop<T, E: Into<Error>>(result: Result<T, E>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => failloop(e.into()),
    }
}
