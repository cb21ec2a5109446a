//! Physical-device selection and logical-device creation
//!
//! Probes each adapter the driver enumerates into a plain capability
//! snapshot, then picks the first one that can render and present. Selection
//! is deliberately first-match, not best-match: no scoring across candidates,
//! so the outcome is deterministic for a given enumeration order.

use std::ffi::{c_char, CStr, CString};

use ash::extensions::khr;
use ash::{vk, Device, Instance};

use crate::error::{VulkanError, VulkanResult};
use crate::instance::{VulkanInstance, REQUIRED_LAYERS};
use crate::surface::Surface;

/// Device extensions every adapter must support
pub fn required_device_extensions() -> [&'static CStr; 1] {
    [khr::Swapchain::name()]
}

/// Probed snapshot of one queue family
#[derive(Debug, Clone, Copy)]
pub struct QueueFamilyInfo {
    /// Capability flags reported by the driver
    pub flags: vk::QueueFlags,
    /// Whether this family can present to the target surface
    pub supports_present: bool,
}

/// Graphics and presentation queue family assignment
///
/// The two indices may coincide; distinctness changes the swapchain sharing
/// mode downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilyIndices {
    /// Index of the graphics-capable family
    pub graphics: u32,
    /// Index of the presentation-capable family
    pub present: u32,
}

impl QueueFamilyIndices {
    /// Whether both roles share a single family
    pub fn is_shared(&self) -> bool {
        self.graphics == self.present
    }

    /// The distinct family indices, deduplicated
    pub fn unique(&self) -> Vec<u32> {
        if self.is_shared() {
            vec![self.graphics]
        } else {
            vec![self.graphics, self.present]
        }
    }
}

/// Assign queue family roles from a probed family list
///
/// One linear scan in enumeration order: each role takes the first family
/// index that satisfies it, both roles are checked in every iteration, and
/// the scan stops as soon as both are filled. A later family that might suit
/// one role better on its own is never considered.
pub fn find_queue_families(families: &[QueueFamilyInfo]) -> Option<QueueFamilyIndices> {
    let mut graphics = None;
    let mut present = None;

    for (index, family) in families.iter().enumerate() {
        let index = index as u32;

        if graphics.is_none() && family.flags.contains(vk::QueueFlags::GRAPHICS) {
            graphics = Some(index);
        }

        if present.is_none() && family.supports_present {
            present = Some(index);
        }

        if graphics.is_some() && present.is_some() {
            break;
        }
    }

    Some(QueueFamilyIndices {
        graphics: graphics?,
        present: present?,
    })
}

/// Everything probed about one adapter candidate
///
/// Immutable once probed; pure queries against the driver with no state
/// mutation.
#[derive(Debug, Clone)]
pub struct AdapterCapabilities {
    /// Queue families in enumeration order
    pub queue_families: Vec<QueueFamilyInfo>,
    /// Supported device extension names
    pub extension_names: Vec<CString>,
    /// Number of supported surface (format, color space) pairs
    pub surface_format_count: usize,
    /// Number of supported present modes
    pub present_mode_count: usize,
}

impl AdapterCapabilities {
    /// Queue assignment if this adapter satisfies every requirement, else `None`
    ///
    /// Requirements: a graphics family, a presentation family (possibly the
    /// same), every required device extension, and at least one surface
    /// format and one present mode.
    pub fn queue_assignment(&self) -> Option<QueueFamilyIndices> {
        let indices = find_queue_families(&self.queue_families)?;

        let has_extensions = required_device_extensions().iter().all(|required| {
            self.extension_names
                .iter()
                .any(|name| name.as_c_str() == *required)
        });
        if !has_extensions {
            return None;
        }

        if self.surface_format_count == 0 || self.present_mode_count == 0 {
            return None;
        }

        Some(indices)
    }
}

/// First-match selection over candidate capability snapshots
///
/// Distinguishes an empty candidate list (no adapters in the environment)
/// from a non-empty list where nothing qualifies (capability mismatch).
/// Probe errors abort the scan.
fn select_first_qualifying<I>(candidates: I) -> VulkanResult<(usize, QueueFamilyIndices)>
where
    I: IntoIterator<Item = VulkanResult<AdapterCapabilities>>,
{
    let mut enumerated_any = false;

    for (index, candidate) in candidates.into_iter().enumerate() {
        enumerated_any = true;
        if let Some(indices) = candidate?.queue_assignment() {
            return Ok((index, indices));
        }
    }

    if enumerated_any {
        Err(VulkanError::NoSuitableAdapter)
    } else {
        Err(VulkanError::NoAdapters)
    }
}

/// Selected physical device and its queue family assignment
pub struct PhysicalDeviceInfo {
    /// Vulkan physical device handle
    pub device: vk::PhysicalDevice,
    /// Device properties and limits
    pub properties: vk::PhysicalDeviceProperties,
    /// Queue family assignment used for device creation
    pub queue_indices: QueueFamilyIndices,
}

impl PhysicalDeviceInfo {
    /// Select the first adapter that can render and present to `surface`
    pub fn select(instance: &Instance, surface: &Surface) -> VulkanResult<Self> {
        let devices = unsafe { instance.enumerate_physical_devices()? };

        let (selected, queue_indices) = select_first_qualifying(
            devices
                .iter()
                .map(|&device| Self::probe(instance, device, surface)),
        )?;
        let device = devices[selected];

        let properties = unsafe { instance.get_physical_device_properties(device) };
        log::info!("Selected GPU: {}", unsafe {
            CStr::from_ptr(properties.device_name.as_ptr()).to_string_lossy()
        });

        Ok(Self {
            device,
            properties,
            queue_indices,
        })
    }

    /// Probe one candidate into a capability snapshot
    fn probe(
        instance: &Instance,
        device: vk::PhysicalDevice,
        surface: &Surface,
    ) -> VulkanResult<AdapterCapabilities> {
        let family_props = unsafe { instance.get_physical_device_queue_family_properties(device) };
        let queue_families = family_props
            .iter()
            .enumerate()
            .map(|(index, props)| {
                Ok(QueueFamilyInfo {
                    flags: props.queue_flags,
                    supports_present: surface.supports_present(device, index as u32)?,
                })
            })
            .collect::<VulkanResult<Vec<_>>>()?;

        let extension_names = unsafe { instance.enumerate_device_extension_properties(device)? }
            .iter()
            .map(|ext| unsafe { CStr::from_ptr(ext.extension_name.as_ptr()).to_owned() })
            .collect();

        let surface_format_count = surface.formats(device)?.len();
        let present_mode_count = surface.present_modes(device)?.len();

        Ok(AdapterCapabilities {
            queue_families,
            extension_names,
            surface_format_count,
            present_mode_count,
        })
    }
}

/// Logical device wrapper with RAII cleanup
pub struct LogicalDevice {
    /// Vulkan logical device handle
    pub device: Device,
    /// Graphics operations queue
    pub graphics_queue: vk::Queue,
    /// Surface presentation queue
    pub present_queue: vk::Queue,
    /// Queue family assignment the queues were retrieved from
    pub queue_indices: QueueFamilyIndices,
    /// Swapchain extension loader
    pub swapchain_loader: khr::Swapchain,
}

impl LogicalDevice {
    /// Create a logical device with one queue per distinct family role
    pub fn new(
        instance: &VulkanInstance,
        physical_device_info: &PhysicalDeviceInfo,
    ) -> VulkanResult<Self> {
        let queue_indices = physical_device_info.queue_indices;

        // One creation record per distinct family; both roles may share one.
        let queue_infos: Vec<vk::DeviceQueueCreateInfo> = queue_indices
            .unique()
            .into_iter()
            .map(|family| {
                vk::DeviceQueueCreateInfo::builder()
                    .queue_family_index(family)
                    .queue_priorities(&[1.0])
                    .build()
            })
            .collect();

        let extension_ptrs: Vec<*const c_char> = required_device_extensions()
            .iter()
            .map(|ext| ext.as_ptr())
            .collect();

        // Older driver revisions ignore instance-level layers on the device;
        // mirroring them here keeps validation working on those drivers.
        let layer_ptrs: Vec<*const c_char> = if instance.validation_enabled() {
            REQUIRED_LAYERS.iter().map(|layer| layer.as_ptr()).collect()
        } else {
            Vec::new()
        };

        let device_features = vk::PhysicalDeviceFeatures::default();

        let create_info = vk::DeviceCreateInfo::builder()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&extension_ptrs)
            .enabled_layer_names(&layer_ptrs)
            .enabled_features(&device_features);

        let device = unsafe {
            instance
                .instance
                .create_device(physical_device_info.device, &create_info, None)?
        };

        let graphics_queue = unsafe { device.get_device_queue(queue_indices.graphics, 0) };
        let present_queue = unsafe { device.get_device_queue(queue_indices.present, 0) };

        let swapchain_loader = khr::Swapchain::new(&instance.instance, &device);
        log::info!(
            "Created logical device (graphics family {}, present family {})",
            queue_indices.graphics,
            queue_indices.present
        );

        Ok(Self {
            device,
            graphics_queue,
            present_queue,
            queue_indices,
            swapchain_loader,
        })
    }
}

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        unsafe {
            // Ensure device is idle before destruction
            let _ = self.device.device_wait_idle();
            self.device.destroy_device(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags, supports_present: bool) -> QueueFamilyInfo {
        QueueFamilyInfo {
            flags,
            supports_present,
        }
    }

    fn capable_adapter(queue_families: Vec<QueueFamilyInfo>) -> AdapterCapabilities {
        AdapterCapabilities {
            queue_families,
            extension_names: vec![khr::Swapchain::name().to_owned()],
            surface_format_count: 1,
            present_mode_count: 1,
        }
    }

    #[test]
    fn test_queue_scan_shared_family() {
        let families = [family(vk::QueueFlags::GRAPHICS, true)];
        let indices = find_queue_families(&families).unwrap();
        assert_eq!(indices.graphics, 0);
        assert_eq!(indices.present, 0);
        assert!(indices.is_shared());
        assert_eq!(indices.unique(), vec![0]);
    }

    #[test]
    fn test_queue_scan_split_families() {
        let families = [
            family(vk::QueueFlags::GRAPHICS, false),
            family(vk::QueueFlags::TRANSFER, true),
        ];
        let indices = find_queue_families(&families).unwrap();
        assert_eq!(indices.graphics, 0);
        assert_eq!(indices.present, 1);
        assert!(!indices.is_shared());
        assert_eq!(indices.unique(), vec![0, 1]);
    }

    #[test]
    fn test_queue_scan_takes_first_index_per_role() {
        // Family 2 satisfies both roles, but each role keeps the first index
        // that satisfied it alone.
        let families = [
            family(vk::QueueFlags::GRAPHICS, false),
            family(vk::QueueFlags::COMPUTE, true),
            family(vk::QueueFlags::GRAPHICS, true),
        ];
        let indices = find_queue_families(&families).unwrap();
        assert_eq!(indices.graphics, 0);
        assert_eq!(indices.present, 1);
    }

    #[test]
    fn test_queue_scan_missing_role() {
        let families = [
            family(vk::QueueFlags::COMPUTE, false),
            family(vk::QueueFlags::TRANSFER, false),
        ];
        assert!(find_queue_families(&families).is_none());

        let present_only = [family(vk::QueueFlags::TRANSFER, true)];
        assert!(find_queue_families(&present_only).is_none());
    }

    #[test]
    fn test_selection_is_first_match_not_best_match() {
        // The second adapter has more queue families and would score higher
        // under any heuristic; the first qualifying one still wins.
        let modest = capable_adapter(vec![family(vk::QueueFlags::GRAPHICS, true)]);
        let deluxe = capable_adapter(vec![
            family(vk::QueueFlags::GRAPHICS, true),
            family(vk::QueueFlags::COMPUTE, true),
            family(vk::QueueFlags::TRANSFER, true),
        ]);

        let (index, indices) = select_first_qualifying([Ok(modest), Ok(deluxe)]).unwrap();
        assert_eq!(index, 0);
        assert_eq!(indices.graphics, 0);
        assert_eq!(indices.present, 0);
    }

    #[test]
    fn test_selection_skips_unqualified_candidates() {
        let no_swapchain = AdapterCapabilities {
            extension_names: Vec::new(),
            ..capable_adapter(vec![family(vk::QueueFlags::GRAPHICS, true)])
        };
        let no_formats = AdapterCapabilities {
            surface_format_count: 0,
            ..capable_adapter(vec![family(vk::QueueFlags::GRAPHICS, true)])
        };
        let good = capable_adapter(vec![family(vk::QueueFlags::GRAPHICS, true)]);

        let (index, _) = select_first_qualifying([Ok(no_swapchain), Ok(no_formats), Ok(good)]).unwrap();
        assert_eq!(index, 2);
    }

    #[test]
    fn test_selection_distinguishes_empty_from_unsuitable() {
        let empty: Vec<VulkanResult<AdapterCapabilities>> = Vec::new();
        assert!(matches!(
            select_first_qualifying(empty),
            Err(VulkanError::NoAdapters)
        ));

        let unsuitable = AdapterCapabilities {
            present_mode_count: 0,
            ..capable_adapter(vec![family(vk::QueueFlags::GRAPHICS, true)])
        };
        assert!(matches!(
            select_first_qualifying([Ok(unsuitable)]),
            Err(VulkanError::NoSuitableAdapter)
        ));
    }

    #[test]
    fn test_selection_propagates_probe_errors() {
        let result = select_first_qualifying([Err(VulkanError::Api(
            vk::Result::ERROR_INITIALIZATION_FAILED,
        ))]);
        assert!(matches!(result, Err(VulkanError::Api(_))));
    }
}
