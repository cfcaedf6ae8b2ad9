/*++

Licensed under the Apache-2.0 license.

File Name:

    header.rs

Abstract:

    File contains the per-engine firmware header and the collaborator traits the bootstrap
    flow consumes: WPR header access, signature verification and source halt.

--*/

use lsboot_drivers::{EngineKind, WprRead};
use lsboot_error::{BootResult, LsBootError};

bitflags::bitflags! {
    /// Boot flags carried in a firmware header
    pub struct BootFlags : u32 {
        /// Code is linked to run from IMEM offset zero
        const LOAD_AT_ZERO = 0x01;

        /// Engine DMA uses virtual addressing once running
        const NEEDS_VIRTUAL_CONTEXT = 0x02;

        /// Engine DMA must carry a context once running
        const REQUIRES_DMA_CONTEXT = 0x04;
    }
}

/// Location of one image inside the ucode blob.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImageSection {
    /// Offset from the start of the ucode blob
    pub offset: u32,
    pub size: u32,
}

/// Firmware header of one target engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FirmwareHeader {
    pub engine: EngineKind,
    pub instance: u8,

    /// Instances the image may be booted on
    pub index_mask: u32,

    /// Offset of the ucode blob within WPR
    pub ucode_offset: u32,
    pub bl_code: ImageSection,
    pub bl_data: ImageSection,
    pub app_code: Option<ImageSection>,
    pub app_data: Option<ImageSection>,

    /// Signature block handed to the verifier and loaded after the application data
    pub signature: Option<ImageSection>,
    pub flags: BootFlags,
}

impl FirmwareHeader {
    /// WPR offset of `section`.
    pub fn wpr_offset(&self, section: &ImageSection) -> BootResult<u32> {
        self.ucode_offset
            .checked_add(section.offset)
            .ok_or(LsBootError::INVALID_ARGUMENT)
    }
}

/// Access to the parsed WPR header and the region's bytes.
pub trait WprHeaderAccessor: WprRead {
    /// Firmware headers in boot order.
    fn headers(&self) -> &[FirmwareHeader];

    /// First header for `engine`.
    fn find(&self, engine: EngineKind) -> Option<&FirmwareHeader> {
        self.headers().iter().find(|h| h.engine == engine)
    }
}

/// External signature verification of a bundled application image.
pub trait FirmwareVerifier {
    /// Returns true when the signature block of `header` covers its images.
    fn verify(&self, header: &FirmwareHeader, signature: &ImageSection) -> bool;
}

/// Stops the bootstrap source after a fatal error.
pub trait SourceHalt {
    fn halt(&self, code: u32) -> !;
}
