//! SPIR-V shader module management
//!
//! Shader byte code arrives from a collaborator as opaque, pre-compiled
//! blobs; this module only validates alignment and wraps the driver object.
//! Shader modules are transient: they are released as soon as the pipeline
//! that consumed them has been built.

use std::ffi::CStr;
use std::path::Path;

use ash::{vk, Device};

use crate::error::{VulkanError, VulkanResult};

/// SPIR-V shader module wrapper with automatic resource management
pub struct ShaderModule {
    device: Device,
    module: vk::ShaderModule,
}

impl ShaderModule {
    /// Create shader module from SPIR-V byte code
    pub fn from_bytes(device: &Device, bytes: &[u8]) -> VulkanResult<Self> {
        // SPIR-V is a stream of u32 words; reject blobs that are not.
        let (prefix, words, suffix) = unsafe { bytes.align_to::<u32>() };
        if !prefix.is_empty() || !suffix.is_empty() {
            return Err(VulkanError::ShaderAlignment);
        }

        let create_info = vk::ShaderModuleCreateInfo::builder().code(words);

        let module = unsafe { device.create_shader_module(&create_info, None)? };
        log::debug!("Created shader module from {} bytes", bytes.len());

        Ok(Self {
            device: device.clone(),
            module,
        })
    }

    /// Load shader from a SPIR-V file
    pub fn from_file<P: AsRef<Path>>(device: &Device, path: P) -> VulkanResult<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| VulkanError::Shader {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_bytes(device, &bytes)
    }

    /// Get shader module handle
    pub fn handle(&self) -> vk::ShaderModule {
        self.module
    }

    /// Build the stage create info referencing this module
    pub fn stage_info(
        &self,
        stage: vk::ShaderStageFlags,
        entry_point: &CStr,
    ) -> vk::PipelineShaderStageCreateInfo {
        vk::PipelineShaderStageCreateInfo::builder()
            .stage(stage)
            .module(self.module)
            .name(entry_point)
            .build()
    }
}

impl Drop for ShaderModule {
    fn drop(&mut self) {
        unsafe {
            self.device.destroy_shader_module(self.module, None);
        }
    }
}
