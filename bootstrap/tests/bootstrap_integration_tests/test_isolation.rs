// Licensed under the Apache-2.0 license

use lsboot_bootstrap::{BootConfig, BootStage, BootstrapOutcome, Platform};
use lsboot_drivers::testing::OPEN_PLM;
use lsboot_drivers::{EngineKind, IsolationBypass, LsBootError};

use crate::helpers::{config, header, Harness};

#[test]
fn test_self_target_rejected() {
    let h = Harness::new(vec![
        header(EngineKind::Gsp, 0),
        header(EngineKind::Nvenc, 0),
    ]);

    let outcomes = h.bootstrap(config()).bootstrap_all().unwrap();

    let results: Vec<_> = outcomes.iter().map(|o| o.outcome).collect();
    assert_eq!(
        results,
        vec![
            BootstrapOutcome::FailedAt(
                BootStage::Lock,
                LsBootError::ISOLATION_SELF_ISOLATION_REJECTED
            ),
            BootstrapOutcome::Authorized,
        ]
    );

    let gsp = h.desc(EngineKind::Gsp, 0);
    let (plm, _) = h.cluster_regs(gsp.isolation.cluster);
    assert!(h.mmio.writes_to(plm).is_empty());
    assert!(h.mmio.writes_to(gsp.falcon().sctl().addr()).is_empty());
}

#[test]
fn test_permission_denied() {
    let h = Harness::new(vec![header(EngineKind::Nvenc, 0)]);
    let (plm, target_mask) = h.cluster_regs(1);

    // Clear the GSP source enable bit
    let denied = OPEN_PLM & !(1 << (12 + 1));
    h.mmio.set(plm, denied);

    let outcomes = h.bootstrap(config()).bootstrap_all().unwrap();
    assert_eq!(
        outcomes.get(0).unwrap().outcome,
        BootstrapOutcome::FailedAt(BootStage::Lock, LsBootError::ISOLATION_PERMISSION_DENIED)
    );
    assert!(h.mmio.writes_to(plm).is_empty());
    assert!(h.mmio.writes_to(target_mask).is_empty());
}

#[test]
fn test_lock_written_and_restored() {
    let h = Harness::new(vec![header(EngineKind::Nvenc, 0)]);
    let (plm, target_mask) = h.cluster_regs(1);

    h.bootstrap(config()).bootstrap_all().unwrap();

    let plm_writes = h.mmio.writes_to(plm);
    assert_eq!(plm_writes.len(), 2);
    assert_ne!(plm_writes[0], OPEN_PLM);
    assert_eq!(plm_writes[1], OPEN_PLM);

    let mask_writes = h.mmio.writes_to(target_mask);
    assert_eq!(mask_writes.len(), 2);
    assert_eq!(mask_writes[1], 0xffff_ffff);
}

#[test]
fn test_emulation_bypass() {
    let bypass = [IsolationBypass {
        kind: EngineKind::Nvenc,
        cluster: 1,
    }];

    let h = Harness::new(vec![header(EngineKind::Nvenc, 0)]);
    let config = BootConfig {
        platform: Platform::Emulation,
        isolation_bypass: &bypass,
        ..config()
    };
    let outcomes = h.bootstrap(config).bootstrap_all().unwrap();
    assert_eq!(outcomes.authorized_count(), 1);

    let (plm, target_mask) = h.cluster_regs(1);
    assert!(h.mmio.writes_to(plm).is_empty());
    assert!(h.mmio.writes_to(target_mask).is_empty());
}

#[test]
fn test_bypass_ignored_on_silicon() {
    let bypass = [IsolationBypass {
        kind: EngineKind::Nvenc,
        cluster: 1,
    }];

    let h = Harness::new(vec![header(EngineKind::Nvenc, 0)]);
    let config = BootConfig {
        platform: Platform::Silicon,
        isolation_bypass: &bypass,
        ..config()
    };
    h.bootstrap(config).bootstrap_all().unwrap();

    let (plm, _) = h.cluster_regs(1);
    assert_eq!(h.mmio.writes_to(plm).len(), 2);
}

#[test]
fn test_source_without_identifier() {
    let h = Harness::new(vec![header(EngineKind::Nvenc, 0)]);
    let config = BootConfig {
        source: EngineKind::Pmu,
        ..config()
    };

    assert_eq!(
        h.bootstrap(config).bootstrap_all().err(),
        Some(LsBootError::RESOLVER_NO_SOURCE_ID)
    );
}
