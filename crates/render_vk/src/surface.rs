//! Vulkan surface management
//!
//! Wraps the window surface and hosts the surface-dependent capability
//! probes: formats, present modes, capability ranges and per-queue-family
//! presentation support. All probes are read-only snapshots of driver state.

use ash::extensions::khr;
use ash::vk;
use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle};

use crate::error::{VulkanError, VulkanResult};
use crate::instance::VulkanInstance;

/// Vulkan surface wrapper for presentation
pub struct Surface {
    surface_loader: khr::Surface,
    surface: vk::SurfaceKHR,
}

impl Surface {
    /// Create a new surface from a window
    pub fn new<W>(instance: &VulkanInstance, window: &W) -> VulkanResult<Self>
    where
        W: HasRawWindowHandle + HasRawDisplayHandle,
    {
        let surface_loader = khr::Surface::new(&instance.entry, &instance.instance);

        let surface = unsafe {
            ash_window::create_surface(
                &instance.entry,
                &instance.instance,
                window.raw_display_handle(),
                window.raw_window_handle(),
                None,
            )
            .map_err(|e| VulkanError::Window(format!("failed to create surface: {e:?}")))?
        };

        Ok(Self {
            surface_loader,
            surface,
        })
    }

    /// Get the underlying surface handle
    pub fn handle(&self) -> vk::SurfaceKHR {
        self.surface
    }

    /// Get the surface loader
    pub fn loader(&self) -> &khr::Surface {
        &self.surface_loader
    }

    /// Get surface capability ranges for a physical device
    pub fn capabilities(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VulkanResult<vk::SurfaceCapabilitiesKHR> {
        unsafe {
            Ok(self
                .surface_loader
                .get_physical_device_surface_capabilities(physical_device, self.surface)?)
        }
    }

    /// Get supported (format, color space) pairs for a physical device
    pub fn formats(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VulkanResult<Vec<vk::SurfaceFormatKHR>> {
        unsafe {
            Ok(self
                .surface_loader
                .get_physical_device_surface_formats(physical_device, self.surface)?)
        }
    }

    /// Get supported present modes for a physical device
    pub fn present_modes(
        &self,
        physical_device: vk::PhysicalDevice,
    ) -> VulkanResult<Vec<vk::PresentModeKHR>> {
        unsafe {
            Ok(self
                .surface_loader
                .get_physical_device_surface_present_modes(physical_device, self.surface)?)
        }
    }

    /// Check if a queue family supports presenting to this surface
    pub fn supports_present(
        &self,
        physical_device: vk::PhysicalDevice,
        queue_family_index: u32,
    ) -> VulkanResult<bool> {
        unsafe {
            Ok(self.surface_loader.get_physical_device_surface_support(
                physical_device,
                queue_family_index,
                self.surface,
            )?)
        }
    }
}

impl Drop for Surface {
    fn drop(&mut self) {
        unsafe {
            self.surface_loader.destroy_surface(self.surface, None);
        }
    }
}
