/*++

Licensed under the Apache-2.0 license.

File Name:

    wait.rs

Abstract:

    File contains common functions to implement bounded wait routines.

--*/

use lsboot_error::{BootResult, LsBootError};

/// Default bound for every hardware poll performed during bootstrap.
pub const DEFAULT_POLL_TIMEOUT_NS: u64 = 10_000_000;

/// Monotonic hardware timestamp source.
pub trait Timer {
    /// Current timestamp in nanoseconds. May wrap.
    fn now_ns(&self) -> u64;
}

/// Busy-wait poller bounded by a timestamp-derived deadline.
#[derive(Clone, Copy)]
pub struct Poller<'a> {
    timer: &'a dyn Timer,
    timeout_ns: u64,
}

impl<'a> Poller<'a> {
    pub fn new(timer: &'a dyn Timer, timeout_ns: u64) -> Self {
        Self { timer, timeout_ns }
    }

    /// Spin until `predicate` holds.
    ///
    /// # Returns
    ///
    /// * `LsBootError::POLL_TIMEOUT` - Deadline passed with the predicate still false
    pub fn until(&self, mut predicate: impl FnMut() -> bool) -> BootResult<()> {
        self.until_some(|| predicate().then_some(()))
    }

    /// Spin until `f` yields a value. The predicate is always evaluated at least once, and once
    /// more after the deadline is observed to have passed.
    pub fn until_some<T>(&self, mut f: impl FnMut() -> Option<T>) -> BootResult<T> {
        let start = self.timer.now_ns();
        loop {
            if let Some(val) = f() {
                return Ok(val);
            }
            if self.timer.now_ns().wrapping_sub(start) >= self.timeout_ns {
                return f().ok_or(LsBootError::POLL_TIMEOUT);
            }
        }
    }
}
