/*++

Licensed under the Apache-2.0 license.

File Name:

    load.rs

Abstract:

    File contains the placement of a target's images in IMEM/DMEM and their transfer out of
    WPR.

--*/

use lsboot_drivers::{
    cprintln, BootResult, EngineDescriptor, EngineFlags, LsBootError, MemoryTarget, MmioMut,
    SecureLoader, Transfer,
};

use crate::config::{BootConfig, BootProfile};
use crate::header::{
    BootFlags, FirmwareHeader, FirmwareVerifier, ImageSection, WprHeaderAccessor,
};

/// Copies the images of one header into its target.
pub(crate) struct ImageLoader<'l, 'a, M: MmioMut> {
    loader: &'l SecureLoader<'a, M>,
    wpr: &'a dyn WprHeaderAccessor,
    verifier: &'a dyn FirmwareVerifier,
    config: &'l BootConfig<'a>,
    desc: &'l EngineDescriptor,
    header: &'l FirmwareHeader,
}

impl<'l, 'a, M: MmioMut> ImageLoader<'l, 'a, M> {
    pub fn new(
        loader: &'l SecureLoader<'a, M>,
        wpr: &'a dyn WprHeaderAccessor,
        verifier: &'a dyn FirmwareVerifier,
        config: &'l BootConfig<'a>,
        desc: &'l EngineDescriptor,
        header: &'l FirmwareHeader,
    ) -> Self {
        Self {
            loader,
            wpr,
            verifier,
            config,
            desc,
            header,
        }
    }

    fn copy(
        &self,
        section: &ImageSection,
        dst_offset: u32,
        target: MemoryTarget,
    ) -> BootResult<()> {
        let region_id = if self.desc.flags.contains(EngineFlags::OPEN_CARVEOUT) {
            0
        } else {
            self.config.region_id
        };
        let secure = target == MemoryTarget::Imem
            && !self.desc.flags.contains(EngineFlags::NON_SECURE);

        let xfer = Transfer {
            dst_offset,
            fb_base: self.config.wpr_base,
            fb_offset: self.header.wpr_offset(section)?,
            size: section.size,
            region_id,
            target,
            secure,
        };
        self.loader
            .load(self.desc, &xfer, self.config.load_method, self.wpr)
    }

    /// Load every image the boot profile calls for.
    ///
    /// # Returns
    ///
    /// * `u32` - IMEM offset of the bootloader, used as the boot vector
    pub fn load(&self) -> BootResult<u32> {
        let header = self.header;
        let load_at_zero = header.flags.contains(BootFlags::LOAD_AT_ZERO);
        let code_offset = self
            .loader
            .compute_load_offset(self.desc, header.bl_code.size, load_at_zero)?;
        let dmem_size = self.loader.dmem_size(self.desc);

        if header.bl_data.size > dmem_size {
            return Err(LsBootError::LOADER_IMAGE_TOO_LARGE);
        }

        self.copy(&header.bl_code, code_offset, MemoryTarget::Imem)?;
        self.copy(&header.bl_data, 0, MemoryTarget::Dmem)?;

        match self.config.profile {
            BootProfile::BootloaderOnly => {}
            BootProfile::BundledApp => self.load_app(code_offset, dmem_size)?,
        }

        Ok(code_offset)
    }

    /// Verify and load the application image, placed next to the bootloader.
    fn load_app(&self, bl_code_offset: u32, dmem_size: u32) -> BootResult<()> {
        let header = self.header;
        let (Some(app_code), Some(app_data)) = (header.app_code, header.app_data) else {
            return Err(LsBootError::INVALID_ARGUMENT);
        };
        let signature = header
            .signature
            .ok_or(LsBootError::LOADER_SIGNATURE_REJECTED)?;

        if !self.verifier.verify(header, &signature) {
            cprintln!("[lsboot] {} signature rejected", self.desc.id);
            return Err(LsBootError::LOADER_SIGNATURE_REJECTED);
        }

        // Code goes below a top-loaded bootloader, or above one loaded at zero.
        let (code_dst, code_limit) = if header.flags.contains(BootFlags::LOAD_AT_ZERO) {
            (header.bl_code.size, self.loader.imem_size(self.desc))
        } else {
            (0, bl_code_offset)
        };
        let data_dst = header.bl_data.size;
        let signature_dst = data_dst
            .checked_add(app_data.size)
            .ok_or(LsBootError::LOADER_IMAGE_TOO_LARGE)?;

        let code_end = code_dst.checked_add(app_code.size);
        let data_end = signature_dst.checked_add(signature.size);
        if code_end.map_or(true, |end| end > code_limit)
            || data_end.map_or(true, |end| end > dmem_size)
        {
            return Err(LsBootError::LOADER_IMAGE_TOO_LARGE);
        }

        self.copy(&app_code, code_dst, MemoryTarget::Imem)?;
        self.copy(&app_data, data_dst, MemoryTarget::Dmem)?;
        self.copy(&signature, signature_dst, MemoryTarget::Dmem)
    }
}
