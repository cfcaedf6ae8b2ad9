/*++

Licensed under the Apache-2.0 license.

File Name:

    config.rs

Abstract:

    File contains the bootstrap configuration.

--*/

use lsboot_drivers::{EngineKind, IsolationBypass, LoadMethod, DEFAULT_POLL_TIMEOUT_NS};

/// Platform the source runs on.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    #[default]
    Silicon,
    Fpga,
    Emulation,
}

/// Which images a target receives.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum BootProfile {
    /// Bootloader code and data only; the bootloader fetches the rest
    #[default]
    BootloaderOnly,

    /// Bootloader plus the verified application code, data and signature block
    BundledApp,
}

#[derive(Debug, Clone, Copy)]
pub struct BootConfig<'a> {
    /// Engine running the bootstrap
    pub source: EngineKind,
    pub platform: Platform,

    /// Isolation is skipped for these combinations on emulation platforms
    pub isolation_bypass: &'a [IsolationBypass],

    /// Bound for every hardware poll
    pub poll_timeout_ns: u64,

    /// Physical address of WPR
    pub wpr_base: u64,

    /// WPR region identifier
    pub region_id: u8,
    pub load_method: LoadMethod,
    pub profile: BootProfile,
}

impl Default for BootConfig<'_> {
    fn default() -> Self {
        Self {
            source: EngineKind::Gsp,
            platform: Platform::default(),
            isolation_bypass: &[],
            poll_timeout_ns: DEFAULT_POLL_TIMEOUT_NS,
            wpr_base: 0,
            region_id: 1,
            load_method: LoadMethod::default(),
            profile: BootProfile::default(),
        }
    }
}

impl<'a> BootConfig<'a> {
    /// Bypass list in effect. Empty unless the platform is emulation.
    pub fn effective_isolation_bypass(&self) -> &'a [IsolationBypass] {
        match self.platform {
            Platform::Emulation => self.isolation_bypass,
            Platform::Silicon | Platform::Fpga => &[],
        }
    }
}
