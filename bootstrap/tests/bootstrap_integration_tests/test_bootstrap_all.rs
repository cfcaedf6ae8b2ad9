// Licensed under the Apache-2.0 license

use lsboot_bootstrap::{BootFlags, BootStage, BootstrapOutcome, LsBootStatus, MAX_TARGETS};
use lsboot_drivers::reg::falcon::{Dmactl, FbifTranscfg, StackCfg};
use lsboot_drivers::testing::{FAKE_DMEM_BLOCKS, FAKE_IMEM_BLOCKS, OPEN_PLM};
use lsboot_drivers::{ChipConstants, EngineId, EngineKind, LsBootError};

use crate::helpers::{config, header, Harness};

#[test]
fn test_failed_target_does_not_stop_the_pass() {
    let h = Harness::new(vec![
        header(EngineKind::Sec2, 0),
        header(EngineKind::Nvdec, 1),
        header(EngineKind::Nvenc, 0),
    ]);

    // Reset status never reports asserted
    let reset = h.desc(EngineKind::Nvdec, 1).reset.secure_reset.unwrap();
    h.mmio.stick(reset, h.mmio.get(reset));

    let outcomes = h.bootstrap(config()).bootstrap_all().unwrap();

    let results: Vec<_> = outcomes.iter().map(|o| o.outcome).collect();
    assert_eq!(
        results,
        vec![
            BootstrapOutcome::Authorized,
            BootstrapOutcome::FailedAt(BootStage::Reset, LsBootError::POLL_TIMEOUT),
            BootstrapOutcome::Authorized,
        ]
    );
    assert_eq!(
        outcomes.get(1).unwrap().engine,
        EngineId::new(EngineKind::Nvdec, 1)
    );
    assert_eq!(outcomes.authorized_count(), 2);

    // The hung target's cluster is handed back unchanged
    let (plm, target_mask) = h.cluster_regs(1);
    assert_eq!(h.mmio.get(plm), OPEN_PLM);
    assert_eq!(h.mmio.get(target_mask), 0xffff_ffff);

    // Nothing past the failing stage touched the hung target
    let nvdec = h.desc(EngineKind::Nvdec, 1);
    assert!(h.mmio.writes_to(nvdec.falcon().sctl().addr()).is_empty());
    assert!(h.mmio.writes_to(nvdec.falcon().bootvec().addr()).is_empty());

    let globals = h.chip.globals();
    assert_eq!(
        h.mmio.writes_to(globals.error_non_fatal),
        vec![u32::from(LsBootError::POLL_TIMEOUT)]
    );
    assert!(h.mmio.writes_to(globals.error_fatal).is_empty());
}

#[test]
fn test_boot_status_sequence() {
    let h = Harness::new(vec![header(EngineKind::Nvenc, 0)]);

    let outcomes = h.bootstrap(config()).bootstrap_all().unwrap();
    assert_eq!(outcomes.len(), 1);

    let expected: Vec<u32> = [
        LsBootStatus::BootstrapStarted,
        LsBootStatus::TargetResolved,
        LsBootStatus::TargetLocked,
        LsBootStatus::TargetResetComplete,
        LsBootStatus::TargetCoreSelected,
        LsBootStatus::TargetScrubComplete,
        LsBootStatus::TargetLoaded,
        LsBootStatus::TargetAuthorized,
        LsBootStatus::TargetUnlocked,
        LsBootStatus::BootstrapComplete,
    ]
    .into_iter()
    .map(u32::from)
    .collect();
    assert_eq!(h.mmio.writes_to(h.chip.globals().boot_status), expected);
}

#[test]
fn test_failed_target_reports_failed_unlock() {
    let h = Harness::new(vec![header(EngineKind::Nvdec, 1)]);
    h.engine(EngineKind::Nvdec, 1).hang_in_reset(&h.mmio);

    h.bootstrap(config()).bootstrap_all().unwrap();

    let statuses = h.mmio.writes_to(h.chip.globals().boot_status);
    assert!(statuses.contains(&u32::from(LsBootStatus::TargetFailed)));
    assert!(!statuses.contains(&u32::from(LsBootStatus::TargetUnlocked)));
    assert!(!statuses.contains(&u32::from(LsBootStatus::TargetResetComplete)));
}

#[test]
fn test_too_many_targets() {
    let h = Harness::new(vec![header(EngineKind::Nvenc, 0); MAX_TARGETS + 1]);
    h.mmio.clear_accesses();

    assert_eq!(
        h.bootstrap(config()).bootstrap_all().err(),
        Some(LsBootError::BOOTSTRAP_TOO_MANY_TARGETS)
    );
    assert!(h.mmio.accesses().is_empty());
}

#[test]
fn test_full_header_list() {
    let h = Harness::new(vec![header(EngineKind::Nvenc, 0); MAX_TARGETS]);

    let outcomes = h.bootstrap(config()).bootstrap_all().unwrap();
    assert_eq!(outcomes.len(), MAX_TARGETS);
    assert_eq!(outcomes.authorized_count(), MAX_TARGETS);
}

#[test]
fn test_resolve_failures() {
    let mut bad_mask = header(EngineKind::Nvdec, 1);
    bad_mask.index_mask = 0b01;

    // Instance is checked before the mask, and both before resolution
    let mut bad_both = header(EngineKind::Gpccs, 2);
    bad_both.index_mask = 0b100;

    let h = Harness::new(vec![
        header(EngineKind::Ofa, 0),
        bad_mask,
        header(EngineKind::Nvenc, 1),
        bad_both,
        header(EngineKind::Nvenc, 0),
    ]);

    let outcomes = h.bootstrap(config()).bootstrap_all().unwrap();

    let results: Vec<_> = outcomes.iter().map(|o| o.outcome).collect();
    assert_eq!(
        results,
        vec![
            BootstrapOutcome::FailedAt(
                BootStage::Resolve,
                LsBootError::RESOLVER_ENGINE_NOT_FOUND
            ),
            BootstrapOutcome::FailedAt(
                BootStage::Resolve,
                LsBootError::RESOLVER_INVALID_INDEX_MASK
            ),
            BootstrapOutcome::FailedAt(BootStage::Resolve, LsBootError::RESOLVER_INVALID_INSTANCE),
            BootstrapOutcome::FailedAt(BootStage::Resolve, LsBootError::RESOLVER_INVALID_INSTANCE),
            BootstrapOutcome::Authorized,
        ]
    );

    // Resolve failures never reserve a cluster
    let (plm, _) = h.cluster_regs(1);
    let nvenc_only = h.mmio.writes_to(plm).len();
    assert_eq!(nvenc_only, 2);
}

#[test]
fn test_boot_programming() {
    let mut pmu = header(EngineKind::Pmu, 0);
    pmu.flags = BootFlags::REQUIRES_DMA_CONTEXT | BootFlags::NEEDS_VIRTUAL_CONTEXT;
    let h = Harness::new(vec![pmu]);

    let outcomes = h.bootstrap(config()).bootstrap_all().unwrap();
    assert_eq!(outcomes.authorized_count(), 1);

    let desc = h.desc(EngineKind::Pmu, 0);
    let falcon = desc.falcon();

    // Bootloader sits at the top of IMEM
    let bl_offset = (FAKE_IMEM_BLOCKS - 2) * 256;
    assert_eq!(h.mmio.get(falcon.bootvec().addr()), bl_offset);

    assert!(Dmactl::from(h.mmio.get(falcon.dmactl().addr())).require_ctx());

    let fbif = desc.fbif().unwrap();
    let transcfg = FbifTranscfg::from(h.mmio.get(fbif.transcfg(desc.ctx_dma).addr()));
    assert!(!transcfg.mem_type_physical());

    let stack = StackCfg::from(h.mmio.get(falcon.stackcfg().addr()));
    assert_eq!(stack.bottom(), FAKE_DMEM_BLOCKS * 256 / 4);
    assert!(stack.spr_enable());

    // Sub-WPR window
    assert_eq!(h.mmio.get(desc.sub_wpr.cfg_addr), desc.sub_wpr.start_4k);
    assert_eq!(h.mmio.get(desc.sub_wpr.cfg_addr + 4), desc.sub_wpr.end_4k);

    // Legacy reset path leaves the engine enabled
    let bit = desc.reset.legacy_enable_bit.unwrap();
    assert_ne!(h.mmio.get(h.chip.globals().legacy_enable) & (1 << bit), 0);
}

#[test]
fn test_load_at_zero_boot_vector() {
    let mut nvenc = header(EngineKind::Nvenc, 0);
    nvenc.flags = BootFlags::LOAD_AT_ZERO;
    let h = Harness::new(vec![nvenc]);

    let outcomes = h.bootstrap(config()).bootstrap_all().unwrap();
    assert_eq!(outcomes.authorized_count(), 1);

    let desc = h.desc(EngineKind::Nvenc, 0);
    assert_eq!(h.mmio.get(desc.falcon().bootvec().addr()), 0);
    assert!(!Dmactl::from(h.mmio.get(desc.falcon().dmactl().addr())).require_ctx());

    let fbif = desc.fbif().unwrap();
    let transcfg = FbifTranscfg::from(h.mmio.get(fbif.transcfg(desc.ctx_dma).addr()));
    assert!(transcfg.mem_type_physical());
}
