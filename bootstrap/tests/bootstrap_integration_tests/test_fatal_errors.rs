// Licensed under the Apache-2.0 license

use std::panic::{catch_unwind, AssertUnwindSafe};

use lsboot_drivers::testing::OPEN_PLM;
use lsboot_drivers::{ChipConstants, EngineKind, LsBootError};

use crate::helpers::{config, header, Harness};

#[test]
fn test_key_fetch_failure_halts_source() {
    let h = Harness::new(vec![
        header(EngineKind::Sec2, 0),
        header(EngineKind::Nvenc, 0),
    ]);
    let sec2 = h.desc(EngineKind::Sec2, 0);
    h.mmio.set(sec2.key_fetch.status, 3);

    let result = catch_unwind(AssertUnwindSafe(|| h.bootstrap(config()).bootstrap_all()));
    assert!(result.is_err());

    let code = u32::from(LsBootError::RESET_KEY_FETCH_FAILED);
    assert_eq!(h.halt.code.get(), Some(code));
    assert_eq!(h.mmio.writes_to(h.chip.globals().error_fatal), vec![code]);
    assert!(h.mmio.writes_to(h.chip.globals().error_non_fatal).is_empty());

    // Isolation was released before the halt
    let (plm, target_mask) = h.cluster_regs(sec2.isolation.cluster);
    assert_eq!(h.mmio.get(plm), OPEN_PLM);
    assert_eq!(h.mmio.get(target_mask), 0xffff_ffff);

    // The pass stopped at the fatal target
    let nvenc = h.desc(EngineKind::Nvenc, 0);
    assert!(h.mmio.writes_to(nvenc.falcon().sctl().addr()).is_empty());
}

#[test]
#[should_panic(expected = "source halted")]
fn test_key_fetch_stuck_halts_source() {
    let h = Harness::new(vec![header(EngineKind::Sec2, 0)]);
    let sec2 = h.desc(EngineKind::Sec2, 0);

    // Transaction never leaves the in-flight state
    h.mmio.stick(sec2.key_fetch.status, 1);

    let _ = h.bootstrap(config()).bootstrap_all();
}

#[test]
fn test_key_fetch_stuck_reports_code() {
    let h = Harness::new(vec![header(EngineKind::Sec2, 0)]);
    let sec2 = h.desc(EngineKind::Sec2, 0);
    h.mmio.stick(sec2.key_fetch.status, 1);

    let result = catch_unwind(AssertUnwindSafe(|| {
        h.bootstrap(config()).reset_and_reauthorize(EngineKind::Sec2)
    }));
    assert!(result.is_err());
    assert_eq!(
        h.halt.code.get(),
        Some(u32::from(LsBootError::RESET_KEY_FETCH_STUCK))
    );
}
