/*++

Licensed under the Apache-2.0 license.

File Name:

    mod.rs

Abstract:

    File contains fakes for exercising the drivers without hardware.

--*/
mod fake_engine;
mod fake_mmio;
mod fake_timer;

pub use fake_engine::{
    sample_chip, FakeEngine, FAKE_DMEM_BLOCKS, FAKE_IMEM_BLOCKS, OPEN_PLM,
};
pub use fake_mmio::{Access, FakeMmio};
pub use fake_timer::FakeTimer;
