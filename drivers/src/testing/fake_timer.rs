/*++

Licensed under the Apache-2.0 license.

File Name:

    fake_timer.rs

Abstract:

    File contains a deterministic timestamp source for bounded-poll tests.

--*/
use std::cell::Cell;

use crate::wait::Timer;

/// A timer that advances by a fixed step every time it is sampled, so a poll that never succeeds
/// expires after a predictable number of iterations.
pub struct FakeTimer {
    now: Cell<u64>,
    step: u64,
}

impl FakeTimer {
    pub fn new(step: u64) -> Self {
        Self::starting_at(0, step)
    }

    pub fn starting_at(now: u64, step: u64) -> Self {
        Self {
            now: Cell::new(now),
            step,
        }
    }
}

impl Timer for FakeTimer {
    fn now_ns(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now.wrapping_add(self.step));
        now
    }
}
