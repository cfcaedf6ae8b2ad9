// Licensed under the Apache-2.0 license

use lsboot_bootstrap::{BootStage, BootstrapOutcome, LsBootStatus};
use lsboot_drivers::testing::OPEN_PLM;
use lsboot_drivers::{ChipConstants, EngineKind, LsBootError};

use crate::helpers::{config, header, Harness};

#[test]
fn test_reauthorize_after_bootstrap() {
    let h = Harness::new(vec![
        header(EngineKind::Sec2, 0),
        header(EngineKind::Nvenc, 0),
    ]);
    let bootstrap = h.bootstrap(config());

    assert_eq!(bootstrap.bootstrap_all().unwrap().authorized_count(), 2);

    let sctl = h.desc(EngineKind::Nvenc, 0).falcon().sctl().addr();
    let before = h.mmio.writes_to(sctl).len();

    assert_eq!(
        bootstrap.reset_and_reauthorize(EngineKind::Nvenc),
        BootstrapOutcome::Authorized
    );
    assert_eq!(h.mmio.writes_to(sctl).len(), before + 1);
    assert!(h
        .mmio
        .writes_to(h.chip.globals().boot_status)
        .contains(&u32::from(LsBootStatus::RecoveryStarted)));
}

#[test]
fn test_reauthorize_unknown_engine() {
    let h = Harness::new(vec![header(EngineKind::Nvenc, 0)]);

    assert_eq!(
        h.bootstrap(config()).reset_and_reauthorize(EngineKind::Pmu),
        BootstrapOutcome::FailedAt(BootStage::Resolve, LsBootError::BOOTSTRAP_HEADER_NOT_FOUND)
    );
}

#[test]
fn test_reauthorize_running_engine() {
    let h = Harness::new(vec![header(EngineKind::Nvenc, 0)]);
    h.engine(EngineKind::Nvenc, 0).set_running(&h.mmio);

    assert_eq!(
        h.bootstrap(config()).reset_and_reauthorize(EngineKind::Nvenc),
        BootstrapOutcome::FailedAt(BootStage::Authorize, LsBootError::AUTH_NOT_HALTED)
    );

    let (plm, _) = h.cluster_regs(1);
    assert_eq!(h.mmio.get(plm), OPEN_PLM);
    assert_eq!(
        h.mmio.writes_to(h.chip.globals().error_non_fatal),
        vec![u32::from(LsBootError::AUTH_NOT_HALTED)]
    );
}
