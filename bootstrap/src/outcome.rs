/*++

Licensed under the Apache-2.0 license.

File Name:

    outcome.rs

Abstract:

    File contains the per-target state machine, stage attribution and the outcome list
    returned by the bootstrap flow.

--*/

use lsboot_drivers::{EngineId, LsBootError};
use ufmt::{uDisplay, uWrite};

use crate::boot_status::LsBootStatus;

/// Maximum number of targets one bootstrap pass handles.
pub const MAX_TARGETS: usize = 16;

/// Stage a target failed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootStage {
    Resolve,
    Lock,
    Reset,
    CoreSelect,
    Scrub,
    Load,
    Authorize,
}

impl BootStage {
    pub fn name(self) -> &'static str {
        match self {
            BootStage::Resolve => "resolve",
            BootStage::Lock => "lock",
            BootStage::Reset => "reset",
            BootStage::CoreSelect => "core select",
            BootStage::Scrub => "scrub",
            BootStage::Load => "load",
            BootStage::Authorize => "authorize",
        }
    }
}

impl uDisplay for BootStage {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        f.write_str(self.name())
    }
}

/// Result of bootstrapping one target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapOutcome {
    Authorized,
    FailedAt(BootStage, LsBootError),
}

impl BootstrapOutcome {
    pub fn is_authorized(&self) -> bool {
        matches!(self, BootstrapOutcome::Authorized)
    }
}

/// Per-target progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetState {
    Idle,
    Resolved,
    Locked,
    Reset,
    CoreSelected,
    Scrubbed,
    Loaded,
    Authorized,
    Unlocked { failed: bool },
}

impl TargetState {
    /// Boot status reported on entering the state.
    pub fn boot_status(self) -> Option<LsBootStatus> {
        match self {
            TargetState::Idle => None,
            TargetState::Resolved => Some(LsBootStatus::TargetResolved),
            TargetState::Locked => Some(LsBootStatus::TargetLocked),
            TargetState::Reset => Some(LsBootStatus::TargetResetComplete),
            TargetState::CoreSelected => Some(LsBootStatus::TargetCoreSelected),
            TargetState::Scrubbed => Some(LsBootStatus::TargetScrubComplete),
            TargetState::Loaded => Some(LsBootStatus::TargetLoaded),
            TargetState::Authorized => Some(LsBootStatus::TargetAuthorized),
            TargetState::Unlocked { failed: false } => Some(LsBootStatus::TargetUnlocked),
            TargetState::Unlocked { failed: true } => Some(LsBootStatus::TargetFailed),
        }
    }
}

/// Outcome of one header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetOutcome {
    pub engine: EngineId,
    pub outcome: BootstrapOutcome,
}

/// Outcomes of a bootstrap pass, in header order.
#[derive(Debug, Clone, Copy)]
pub struct OutcomeList {
    entries: [Option<TargetOutcome>; MAX_TARGETS],
    len: usize,
}

impl Default for OutcomeList {
    fn default() -> Self {
        Self {
            entries: [None; MAX_TARGETS],
            len: 0,
        }
    }
}

impl OutcomeList {
    /// Append an outcome. Returns false when the list is full.
    pub(crate) fn push(&mut self, outcome: TargetOutcome) -> bool {
        match self.entries.get_mut(self.len) {
            Some(slot) => {
                *slot = Some(outcome);
                self.len += 1;
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, index: usize) -> Option<&TargetOutcome> {
        self.entries[..self.len].get(index).and_then(Option::as_ref)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetOutcome> {
        self.entries[..self.len].iter().flatten()
    }

    /// Number of targets that reached Light-Secure mode.
    pub fn authorized_count(&self) -> usize {
        self.iter().filter(|o| o.outcome.is_authorized()).count()
    }
}
