//! Swapchain negotiation and lifecycle
//!
//! Splits presentation setup into a pure negotiation step, which resolves
//! format, present mode, extent, image count and sharing mode from the
//! probed surface capabilities, and an execution step that creates the
//! swapchain and its image views. A swapchain is never mutated after
//! creation; a new extent means a full rebuild via [`Swapchain::recreate`].

use ash::{vk, Device};

use crate::device::{LogicalDevice, PhysicalDeviceInfo, QueueFamilyIndices};
use crate::error::VulkanResult;
use crate::surface::Surface;

/// Resolution used when the driver leaves the extent to the application
pub const DEFAULT_EXTENT: vk::Extent2D = vk::Extent2D {
    width: 800,
    height: 600,
};

/// Negotiated swapchain parameters
///
/// Produced by [`SwapchainSettings::negotiate`] from probed driver data
/// only, with no driver calls of its own.
#[derive(Debug, Clone)]
pub struct SwapchainSettings {
    /// Color format and color space
    pub format: vk::SurfaceFormatKHR,
    /// Presentation mode
    pub present_mode: vk::PresentModeKHR,
    /// Image extent in pixels
    pub extent: vk::Extent2D,
    /// Number of images requested (the driver may allocate more)
    pub image_count: u32,
    /// Image sharing mode across queue families
    pub sharing_mode: vk::SharingMode,
    /// Families sharing the images; empty under exclusive sharing
    pub queue_family_indices: Vec<u32>,
    /// Surface transform applied at presentation
    pub pre_transform: vk::SurfaceTransformFlagsKHR,
}

impl SwapchainSettings {
    /// Resolve swapchain parameters from the advertised surface ranges
    pub fn negotiate(
        caps: &vk::SurfaceCapabilitiesKHR,
        formats: &[vk::SurfaceFormatKHR],
        present_modes: &[vk::PresentModeKHR],
        queue_indices: QueueFamilyIndices,
    ) -> Self {
        let format = choose_format(formats);
        let present_mode = choose_present_mode(present_modes);
        let extent = choose_extent(caps);
        let image_count = choose_image_count(caps);

        // Exclusive sharing needs no ownership transfers; concurrent sharing
        // is only required when graphics and presentation live on different
        // families.
        let (sharing_mode, queue_family_indices) = if queue_indices.is_shared() {
            (vk::SharingMode::EXCLUSIVE, Vec::new())
        } else {
            (
                vk::SharingMode::CONCURRENT,
                vec![queue_indices.graphics, queue_indices.present],
            )
        };

        Self {
            format,
            present_mode,
            extent,
            image_count,
            sharing_mode,
            queue_family_indices,
            pre_transform: caps.current_transform,
        }
    }
}

/// Prefer sRGB B8G8R8A8; otherwise take the first advertised pair unchanged
fn choose_format(formats: &[vk::SurfaceFormatKHR]) -> vk::SurfaceFormatKHR {
    formats
        .iter()
        .find(|sf| {
            sf.format == vk::Format::B8G8R8A8_SRGB
                && sf.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .copied()
        .unwrap_or(formats[0])
}

/// Prefer low-latency MAILBOX; FIFO is guaranteed by the standard
fn choose_present_mode(present_modes: &[vk::PresentModeKHR]) -> vk::PresentModeKHR {
    present_modes
        .iter()
        .copied()
        .find(|&mode| mode == vk::PresentModeKHR::MAILBOX)
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

/// Use the driver-fixed extent verbatim, or clamp the default resolution
/// per axis when the driver reports the "application decides" sentinel
fn choose_extent(caps: &vk::SurfaceCapabilitiesKHR) -> vk::Extent2D {
    if caps.current_extent.width != u32::MAX {
        caps.current_extent
    } else {
        vk::Extent2D {
            width: DEFAULT_EXTENT.width.clamp(
                caps.min_image_extent.width,
                caps.max_image_extent.width,
            ),
            height: DEFAULT_EXTENT.height.clamp(
                caps.min_image_extent.height,
                caps.max_image_extent.height,
            ),
        }
    }
}

/// One more than the minimum, so the application is not stalled on driver
/// internals; a max of zero means unbounded
fn choose_image_count(caps: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let requested = caps.min_image_count + 1;
    if caps.max_image_count > 0 {
        requested.min(caps.max_image_count)
    } else {
        requested
    }
}

/// Vulkan swapchain wrapper with automatic resource management
///
/// Owns the swapchain, its images and one image view per image. The image
/// list is re-queried after creation because drivers may allocate more
/// images than requested.
pub struct Swapchain {
    device: Device,
    swapchain_loader: ash::extensions::khr::Swapchain,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    settings: SwapchainSettings,
}

impl Swapchain {
    /// Negotiate against current surface capabilities and create a swapchain
    pub fn new(
        device: &LogicalDevice,
        surface: &Surface,
        physical_device_info: &PhysicalDeviceInfo,
    ) -> VulkanResult<Self> {
        Self::build(device, surface, physical_device_info, vk::SwapchainKHR::null())
    }

    /// Build a replacement swapchain after a surface change
    ///
    /// The old swapchain is handed to the driver for resource reuse and must
    /// still be destroyed by its own wrapper afterwards.
    pub fn recreate(
        device: &LogicalDevice,
        surface: &Surface,
        physical_device_info: &PhysicalDeviceInfo,
        old_swapchain: vk::SwapchainKHR,
    ) -> VulkanResult<Self> {
        Self::build(device, surface, physical_device_info, old_swapchain)
    }

    fn build(
        device: &LogicalDevice,
        surface: &Surface,
        physical_device_info: &PhysicalDeviceInfo,
        old_swapchain: vk::SwapchainKHR,
    ) -> VulkanResult<Self> {
        let physical_device = physical_device_info.device;
        let caps = surface.capabilities(physical_device)?;
        let formats = surface.formats(physical_device)?;
        let present_modes = surface.present_modes(physical_device)?;

        let settings = SwapchainSettings::negotiate(
            &caps,
            &formats,
            &present_modes,
            physical_device_info.queue_indices,
        );
        log::info!(
            "Negotiated swapchain: {:?} {:?} {}x{} x{} ({:?})",
            settings.format.format,
            settings.present_mode,
            settings.extent.width,
            settings.extent.height,
            settings.image_count,
            settings.sharing_mode,
        );

        let create_info = vk::SwapchainCreateInfoKHR::builder()
            .surface(surface.handle())
            .min_image_count(settings.image_count)
            .image_format(settings.format.format)
            .image_color_space(settings.format.color_space)
            .image_extent(settings.extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(settings.sharing_mode)
            .queue_family_indices(&settings.queue_family_indices)
            .pre_transform(settings.pre_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(settings.present_mode)
            .clipped(true)
            .old_swapchain(old_swapchain);

        let swapchain_loader = device.swapchain_loader.clone();
        let swapchain = unsafe { swapchain_loader.create_swapchain(&create_info, None)? };

        // The driver may allocate more images than requested; always use the
        // re-queried list.
        let images = unsafe { swapchain_loader.get_swapchain_images(swapchain)? };
        let image_views =
            create_image_views(&device.device, &images, settings.format.format)?;

        Ok(Self {
            device: device.device.clone(),
            swapchain_loader,
            swapchain,
            images,
            image_views,
            settings,
        })
    }

    /// Get swapchain handle
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.swapchain
    }

    /// Get the negotiated settings
    pub fn settings(&self) -> &SwapchainSettings {
        &self.settings
    }

    /// Get image extent
    pub fn extent(&self) -> vk::Extent2D {
        self.settings.extent
    }

    /// Get surface format
    pub fn format(&self) -> vk::SurfaceFormatKHR {
        self.settings.format
    }

    /// Get swapchain images
    pub fn images(&self) -> &[vk::Image] {
        &self.images
    }

    /// Get image views, parallel to [`Self::images`]
    pub fn image_views(&self) -> &[vk::ImageView] {
        &self.image_views
    }
}

fn create_image_views(
    device: &Device,
    images: &[vk::Image],
    format: vk::Format,
) -> VulkanResult<Vec<vk::ImageView>> {
    images
        .iter()
        .map(|&image| {
            let create_info = vk::ImageViewCreateInfo::builder()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(format)
                .components(vk::ComponentMapping {
                    r: vk::ComponentSwizzle::IDENTITY,
                    g: vk::ComponentSwizzle::IDENTITY,
                    b: vk::ComponentSwizzle::IDENTITY,
                    a: vk::ComponentSwizzle::IDENTITY,
                })
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            Ok(unsafe { device.create_image_view(&create_info, None)? })
        })
        .collect()
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        unsafe {
            for &image_view in &self.image_views {
                self.device.destroy_image_view(image_view, None);
            }
            self.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(
        min_count: u32,
        max_count: u32,
        current: vk::Extent2D,
        min_extent: vk::Extent2D,
        max_extent: vk::Extent2D,
    ) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            min_image_count: min_count,
            max_image_count: max_count,
            current_extent: current,
            min_image_extent: min_extent,
            max_image_extent: max_extent,
            current_transform: vk::SurfaceTransformFlagsKHR::IDENTITY,
            ..Default::default()
        }
    }

    fn extent(width: u32, height: u32) -> vk::Extent2D {
        vk::Extent2D { width, height }
    }

    fn assert_extent(actual: vk::Extent2D, expected: vk::Extent2D) {
        assert_eq!(actual.width, expected.width);
        assert_eq!(actual.height, expected.height);
    }

    const SENTINEL: vk::Extent2D = vk::Extent2D {
        width: u32::MAX,
        height: u32::MAX,
    };

    fn shared_indices() -> QueueFamilyIndices {
        QueueFamilyIndices {
            graphics: 0,
            present: 0,
        }
    }

    #[test]
    fn test_format_prefers_srgb_pair() {
        let formats = [
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::B8G8R8A8_SRGB,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
        ];
        let chosen = choose_format(&formats);
        assert_eq!(chosen.format, vk::Format::B8G8R8A8_SRGB);
        assert_eq!(chosen.color_space, vk::ColorSpaceKHR::SRGB_NONLINEAR);
    }

    #[test]
    fn test_format_falls_back_to_first_advertised() {
        let formats = [
            vk::SurfaceFormatKHR {
                format: vk::Format::R8G8B8A8_UNORM,
                color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
            },
            vk::SurfaceFormatKHR {
                format: vk::Format::R16G16B16A16_SFLOAT,
                color_space: vk::ColorSpaceKHR::EXTENDED_SRGB_LINEAR_EXT,
            },
        ];
        let chosen = choose_format(&formats);
        assert_eq!(chosen.format, formats[0].format);
        assert_eq!(chosen.color_space, formats[0].color_space);
    }

    #[test]
    fn test_present_mode_prefers_mailbox_else_fifo() {
        let with_mailbox = [
            vk::PresentModeKHR::IMMEDIATE,
            vk::PresentModeKHR::MAILBOX,
            vk::PresentModeKHR::FIFO,
        ];
        assert_eq!(choose_present_mode(&with_mailbox), vk::PresentModeKHR::MAILBOX);

        let without = [vk::PresentModeKHR::IMMEDIATE, vk::PresentModeKHR::FIFO];
        assert_eq!(choose_present_mode(&without), vk::PresentModeKHR::FIFO);
    }

    #[test]
    fn test_extent_uses_driver_value_verbatim() {
        let caps = caps(1, 2, extent(1280, 720), extent(1, 1), extent(640, 480));
        // A fixed current extent wins even when outside the min/max range.
        assert_extent(choose_extent(&caps), extent(1280, 720));
    }

    #[test]
    fn test_extent_sentinel_picks_default_resolution() {
        let caps = caps(1, 2, SENTINEL, extent(1, 1), extent(4096, 4096));
        assert_extent(choose_extent(&caps), extent(800, 600));
    }

    #[test]
    fn test_extent_sentinel_clamps_each_axis() {
        let clamped_up = caps(1, 2, SENTINEL, extent(1024, 768), extent(2048, 2048));
        assert_extent(choose_extent(&clamped_up), extent(1024, 768));

        let clamped_down = caps(1, 2, SENTINEL, extent(1, 1), extent(640, 480));
        assert_extent(choose_extent(&clamped_down), extent(640, 480));

        let mixed = caps(1, 2, SENTINEL, extent(1, 720), extent(640, 4096));
        assert_extent(choose_extent(&mixed), extent(640, 720));
    }

    #[test]
    fn test_image_count_unbounded_max_never_clamps() {
        let unbounded = caps(2, 0, extent(800, 600), extent(1, 1), extent(800, 600));
        assert_eq!(choose_image_count(&unbounded), 3);
    }

    #[test]
    fn test_image_count_clamped_to_max() {
        let bounded = caps(2, 2, extent(800, 600), extent(1, 1), extent(800, 600));
        assert_eq!(choose_image_count(&bounded), 2);
    }

    #[test]
    fn test_sharing_exclusive_for_shared_family() {
        let caps = caps(2, 3, extent(800, 600), extent(1, 1), extent(800, 600));
        let formats = [vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_SRGB,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }];
        let settings = SwapchainSettings::negotiate(
            &caps,
            &formats,
            &[vk::PresentModeKHR::FIFO],
            shared_indices(),
        );
        assert_eq!(settings.sharing_mode, vk::SharingMode::EXCLUSIVE);
        assert!(settings.queue_family_indices.is_empty());
    }

    #[test]
    fn test_sharing_concurrent_across_distinct_families() {
        let caps = caps(2, 3, extent(800, 600), extent(1, 1), extent(800, 600));
        let formats = [vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_SRGB,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }];
        let settings = SwapchainSettings::negotiate(
            &caps,
            &formats,
            &[vk::PresentModeKHR::FIFO],
            QueueFamilyIndices {
                graphics: 0,
                present: 2,
            },
        );
        assert_eq!(settings.sharing_mode, vk::SharingMode::CONCURRENT);
        assert_eq!(settings.queue_family_indices, vec![0, 2]);
    }

    #[test]
    fn test_negotiation_single_family_single_format_fifo() {
        // One queue family with both roles, one format, FIFO only,
        // a fixed 1280x720 extent and a [1, 1] image count range.
        let caps = caps(1, 1, extent(1280, 720), extent(1, 1), extent(1280, 720));
        let formats = [vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_UNORM,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        }];
        let settings = SwapchainSettings::negotiate(
            &caps,
            &formats,
            &[vk::PresentModeKHR::FIFO],
            shared_indices(),
        );

        assert_eq!(settings.image_count, 1);
        assert_eq!(settings.format.format, formats[0].format);
        assert_eq!(settings.format.color_space, formats[0].color_space);
        assert_eq!(settings.present_mode, vk::PresentModeKHR::FIFO);
        assert_extent(settings.extent, extent(1280, 720));
        assert_eq!(settings.sharing_mode, vk::SharingMode::EXCLUSIVE);
        assert!(settings.queue_family_indices.is_empty());
    }
}
