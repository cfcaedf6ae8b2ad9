/*++

Licensed under the Apache-2.0 license.

File Name:

    fake_mmio.rs

Abstract:

    File contains a fake implementation of the MMIO traits backed by a sparse register map.

--*/
use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::fmt::Write;

use crate::mmio::{Mmio, MmioMut};

/// One observed register access.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read(u32, u32),
    Write(u32, u32),
}

type WriteHook = Box<dyn Fn(u32) -> u32>;

/// An MMIO implementation that records every access, and lets the test shape what reads return.
///
/// Unpopulated registers read as zero. A register can be given a write hook that transforms the
/// value stored on write (used to model status bits hardware sets in response), a sticky value
/// that every read returns regardless of writes, or a script of one-shot read values consumed
/// before falling back to the stored value.
pub struct FakeMmio {
    regs: RefCell<HashMap<u32, u32>>,
    sticky: RefCell<HashMap<u32, u32>>,
    scripts: RefCell<HashMap<u32, VecDeque<u32>>>,
    hooks: RefCell<HashMap<u32, WriteHook>>,
    accesses: RefCell<Vec<Access>>,
}

impl FakeMmio {
    pub fn new() -> Self {
        Self {
            regs: RefCell::new(HashMap::new()),
            sticky: RefCell::new(HashMap::new()),
            scripts: RefCell::new(HashMap::new()),
            hooks: RefCell::new(HashMap::new()),
            accesses: RefCell::new(Vec::new()),
        }
    }

    /// Sets the stored value of `addr` without recording an access.
    pub fn set(&self, addr: u32, val: u32) {
        self.regs.borrow_mut().insert(addr, val);
    }

    /// Returns the stored value of `addr` without recording an access.
    pub fn get(&self, addr: u32) -> u32 {
        self.regs.borrow().get(&addr).copied().unwrap_or(0)
    }

    /// Every read of `addr` returns `val` from now on.
    pub fn stick(&self, addr: u32, val: u32) {
        self.sticky.borrow_mut().insert(addr, val);
    }

    /// The next reads of `addr` return `vals` in order.
    pub fn script(&self, addr: u32, vals: &[u32]) {
        self.scripts
            .borrow_mut()
            .entry(addr)
            .or_default()
            .extend(vals.iter().copied());
    }

    /// Stores `hook(val)` instead of `val` on every write to `addr`.
    pub fn on_write(&self, addr: u32, hook: impl Fn(u32) -> u32 + 'static) {
        self.hooks.borrow_mut().insert(addr, Box::new(hook));
    }

    /// Snapshot of every access made so far.
    pub fn accesses(&self) -> Vec<Access> {
        self.accesses.borrow().clone()
    }

    /// Forgets the recorded accesses.
    pub fn clear_accesses(&self) {
        self.accesses.borrow_mut().clear();
    }

    /// Renders the recorded accesses one per line and forgets them. Useful for asserting on
    /// the exact sequence a driver issued since the last call.
    pub fn take_trace(&self) -> String {
        let mut trace = String::new();
        for access in self.accesses.borrow_mut().drain(..) {
            let _ = match access {
                Access::Read(addr, val) => writeln!(trace, "read({addr:#x}) = {val:#x}"),
                Access::Write(addr, val) => writeln!(trace, "write({addr:#x}, {val:#x})"),
            };
        }
        trace
    }

    /// Values written to `addr`, in order.
    pub fn writes_to(&self, addr: u32) -> Vec<u32> {
        self.accesses
            .borrow()
            .iter()
            .filter_map(|a| match *a {
                Access::Write(a, v) if a == addr => Some(v),
                _ => None,
            })
            .collect()
    }

    /// Number of reads of `addr`.
    pub fn reads_of(&self, addr: u32) -> usize {
        self.accesses
            .borrow()
            .iter()
            .filter(|a| matches!(**a, Access::Read(a, _) if a == addr))
            .count()
    }

    /// Number of writes recorded so far.
    pub fn write_count(&self) -> usize {
        self.accesses
            .borrow()
            .iter()
            .filter(|a| matches!(a, Access::Write(..)))
            .count()
    }
}

impl Default for FakeMmio {
    fn default() -> Self {
        Self::new()
    }
}

impl Mmio for FakeMmio {
    fn read(&self, addr: u32) -> u32 {
        let scripted = self
            .scripts
            .borrow_mut()
            .get_mut(&addr)
            .and_then(|s| s.pop_front());
        let val = scripted
            .or_else(|| self.sticky.borrow().get(&addr).copied())
            .unwrap_or_else(|| self.get(addr));
        self.accesses.borrow_mut().push(Access::Read(addr, val));
        val
    }
}

impl MmioMut for FakeMmio {
    fn write(&self, addr: u32, val: u32) {
        let stored = match self.hooks.borrow().get(&addr) {
            Some(hook) => hook(val),
            None => val,
        };
        self.set(addr, stored);
        self.accesses.borrow_mut().push(Access::Write(addr, val));
    }
}
