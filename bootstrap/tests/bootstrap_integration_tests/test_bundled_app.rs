// Licensed under the Apache-2.0 license

use lsboot_bootstrap::{BootConfig, BootProfile, BootStage, BootstrapOutcome, ImageSection};
use lsboot_drivers::testing::OPEN_PLM;
use lsboot_drivers::{EngineKind, LoadMethod, LsBootError};

use crate::helpers::{config, header, Harness, UCODE_OFFSET};

fn bundled() -> BootConfig<'static> {
    BootConfig {
        profile: BootProfile::BundledApp,
        ..config()
    }
}

#[test]
fn test_bundled_app_layout() {
    let h = Harness::new(vec![header(EngineKind::Nvenc, 0)]);

    let outcomes = h.bootstrap(bundled()).bootstrap_all().unwrap();
    assert_eq!(outcomes.authorized_count(), 1);
    assert_eq!(h.verifier.calls.get(), 1);

    let falcon = h.desc(EngineKind::Nvenc, 0).falcon();
    assert_eq!(
        h.mmio.writes_to(falcon.dmatrfmoffs().addr()),
        vec![
            // Bootloader code at the top of IMEM, data at the bottom of DMEM
            0xfe00, 0xff00, 0x0000,
            // Application code from IMEM zero
            0x0000, 0x0100, 0x0200, 0x0300,
            // Application data after the bootloader data, then the signature block
            0x0100, 0x0200, 0x0300,
        ]
    );
    assert_eq!(
        h.mmio.writes_to(falcon.dmatrffboffs().addr()),
        [
            0x000, 0x100, 0x200, 0x300, 0x400, 0x500, 0x600, 0x700, 0x800, 0x900,
        ]
        .iter()
        .map(|off| UCODE_OFFSET + off)
        .collect::<Vec<_>>()
    );
}

#[test]
fn test_signature_rejected_before_app_load() {
    let h = Harness::new(vec![header(EngineKind::Nvenc, 0)]);
    h.verifier.accept.set(false);

    let outcome = h.bootstrap(bundled()).bootstrap_all().unwrap();
    assert_eq!(
        outcome.get(0).unwrap().outcome,
        BootstrapOutcome::FailedAt(BootStage::Load, LsBootError::LOADER_SIGNATURE_REJECTED)
    );

    // Only the bootloader blocks were copied
    let falcon = h.desc(EngineKind::Nvenc, 0).falcon();
    assert_eq!(h.mmio.writes_to(falcon.dmatrffboffs().addr()).len(), 3);
    assert!(h.mmio.writes_to(falcon.sctl().addr()).is_empty());

    let (plm, _) = h.cluster_regs(1);
    assert_eq!(h.mmio.get(plm), OPEN_PLM);
}

#[test]
fn test_missing_signature_rejected() {
    let mut nvenc = header(EngineKind::Nvenc, 0);
    nvenc.signature = None;
    let h = Harness::new(vec![nvenc]);

    let outcome = h.bootstrap(bundled()).bootstrap_all().unwrap();
    assert_eq!(
        outcome.get(0).unwrap().outcome,
        BootstrapOutcome::FailedAt(BootStage::Load, LsBootError::LOADER_SIGNATURE_REJECTED)
    );
    assert_eq!(h.verifier.calls.get(), 0);
}

#[test]
fn test_missing_app_image() {
    let mut nvenc = header(EngineKind::Nvenc, 0);
    nvenc.app_data = None;
    let h = Harness::new(vec![nvenc]);

    let outcome = h.bootstrap(bundled()).bootstrap_all().unwrap();
    assert_eq!(
        outcome.get(0).unwrap().outcome,
        BootstrapOutcome::FailedAt(BootStage::Load, LsBootError::INVALID_ARGUMENT)
    );
}

#[test]
fn test_app_overlapping_bootloader() {
    let mut nvenc = header(EngineKind::Nvenc, 0);
    nvenc.app_code = Some(ImageSection {
        offset: 0x300,
        size: 0xff00,
    });
    let h = Harness::new(vec![nvenc]);

    let outcome = h.bootstrap(bundled()).bootstrap_all().unwrap();
    assert_eq!(
        outcome.get(0).unwrap().outcome,
        BootstrapOutcome::FailedAt(BootStage::Load, LsBootError::LOADER_IMAGE_TOO_LARGE)
    );
}

#[test]
fn test_wrapping_header_offsets_fail_only_their_target() {
    let mut huge_data = header(EngineKind::Nvenc, 0);
    huge_data.app_data = Some(ImageSection {
        offset: 0x700,
        size: 0xffff_ff00,
    });
    let mut wrapped_ucode = header(EngineKind::Nvdec, 0);
    wrapped_ucode.ucode_offset = 0xffff_ff00;
    let h = Harness::new(vec![huge_data, wrapped_ucode, header(EngineKind::Sec2, 0)]);

    let outcomes = h.bootstrap(bundled()).bootstrap_all().unwrap();

    let results: Vec<_> = outcomes.iter().map(|o| o.outcome).collect();
    assert_eq!(
        results,
        vec![
            BootstrapOutcome::FailedAt(BootStage::Load, LsBootError::LOADER_IMAGE_TOO_LARGE),
            BootstrapOutcome::FailedAt(BootStage::Load, LsBootError::LOADER_IMAGE_TOO_LARGE),
            BootstrapOutcome::Authorized,
        ]
    );

    // No application block of the oversized target was issued
    let falcon = h.desc(EngineKind::Nvenc, 0).falcon();
    assert_eq!(h.mmio.writes_to(falcon.dmatrffboffs().addr()).len(), 3);

    // The wrapped source offset was rejected before any DMA block
    let falcon = h.desc(EngineKind::Nvdec, 0).falcon();
    assert!(h.mmio.writes_to(falcon.dmatrffboffs().addr()).is_empty());
}

#[test]
fn test_bootloader_only_ignores_app() {
    let mut nvenc = header(EngineKind::Nvenc, 0);
    nvenc.signature = None;
    let h = Harness::new(vec![nvenc]);

    let outcomes = h.bootstrap(config()).bootstrap_all().unwrap();
    assert_eq!(outcomes.authorized_count(), 1);
    assert_eq!(h.verifier.calls.get(), 0);
}

#[test]
fn test_pio_load() {
    let h = Harness::new(vec![header(EngineKind::Nvenc, 0)]);
    let config = BootConfig {
        load_method: LoadMethod::Pio,
        ..config()
    };

    let outcomes = h.bootstrap(config).bootstrap_all().unwrap();
    assert_eq!(outcomes.authorized_count(), 1);

    let falcon = h.desc(EngineKind::Nvenc, 0).falcon();
    assert!(h.mmio.writes_to(falcon.dmatrfcmd().addr()).is_empty());

    let imem = h.mmio.writes_to(falcon.imemd(0).addr());
    assert_eq!(imem.len(), 0x200 / 4);
    assert_eq!(imem[0], h.wpr.word(UCODE_OFFSET));
    assert_eq!(imem[0x40], h.wpr.word(UCODE_OFFSET + 0x100));
    assert_eq!(h.mmio.writes_to(falcon.imemt(0).addr()), vec![0xfe, 0xff]);

    let dmem = h.mmio.writes_to(falcon.dmemd(0).addr());
    assert_eq!(dmem.len(), 0x100 / 4);
    assert_eq!(dmem[0], h.wpr.word(UCODE_OFFSET + 0x200));
}
