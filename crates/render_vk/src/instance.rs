//! Vulkan instance creation
//!
//! Builds the instance-level context from the extension list supplied by the
//! windowing collaborator, checking validation-layer availability up front and
//! appending the debug-utils extension when diagnostics are enabled.

use std::ffi::{c_char, CStr, CString};

use ash::extensions::ext::DebugUtils;
use ash::{vk, Entry, Instance};

use crate::config::RendererConfig;
use crate::debug;
use crate::error::{VulkanError, VulkanResult};

/// Validation layers requested when diagnostics are enabled
pub const REQUIRED_LAYERS: &[&CStr] =
    unsafe { &[CStr::from_bytes_with_nul_unchecked(b"VK_LAYER_KHRONOS_validation\0")] };

const ENGINE_NAME: &CStr = unsafe { CStr::from_bytes_with_nul_unchecked(b"render_vk\0") };

/// Vulkan instance wrapper with RAII cleanup
pub struct VulkanInstance {
    /// Vulkan entry point
    pub entry: Entry,
    /// Vulkan instance handle
    pub instance: Instance,
    validation_enabled: bool,
}

impl VulkanInstance {
    /// Create a new Vulkan instance
    ///
    /// `required_extensions` is the list the windowing toolkit reports as
    /// required for surface creation; the debug-utils extension is appended
    /// when validation is enabled.
    pub fn new(required_extensions: &[String], config: &RendererConfig) -> VulkanResult<Self> {
        let entry = unsafe { Entry::load() }.map_err(|e| VulkanError::LibraryLoad(e.to_string()))?;

        let validation_enabled = config.validation_enabled();
        if validation_enabled {
            Self::check_validation_layers(&entry)?;
        }

        let app_name = CString::new(config.application_name.as_str())
            .map_err(|_| VulkanError::Window("application name contains NUL".to_string()))?;
        let (major, minor, patch) = config.application_version;
        let app_info = vk::ApplicationInfo::builder()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, major, minor, patch))
            .engine_name(ENGINE_NAME)
            .engine_version(vk::make_api_version(0, 0, 1, 0))
            .api_version(vk::API_VERSION_1_0);

        let cstr_extensions: Vec<CString> = required_extensions
            .iter()
            .map(|ext| {
                CString::new(ext.as_str())
                    .map_err(|_| VulkanError::Window(format!("extension name {ext:?} contains NUL")))
            })
            .collect::<VulkanResult<_>>()?;
        let mut extension_ptrs: Vec<*const c_char> =
            cstr_extensions.iter().map(|ext| ext.as_ptr()).collect();
        if validation_enabled {
            extension_ptrs.push(DebugUtils::name().as_ptr());
        }

        let layer_ptrs: Vec<*const c_char> = if validation_enabled {
            REQUIRED_LAYERS.iter().map(|layer| layer.as_ptr()).collect()
        } else {
            Vec::new()
        };

        // Chaining a messenger create info covers the create/destroy calls of
        // the instance itself, which the installed messenger cannot observe.
        let mut messenger_info = debug::messenger_create_info();
        let mut create_info = vk::InstanceCreateInfo::builder()
            .application_info(&app_info)
            .enabled_extension_names(&extension_ptrs)
            .enabled_layer_names(&layer_ptrs);
        if validation_enabled {
            create_info = create_info.push_next(&mut messenger_info);
        }

        let instance = unsafe { entry.create_instance(&create_info, None)? };
        log::info!(
            "Created Vulkan instance (validation {})",
            if validation_enabled { "on" } else { "off" }
        );

        Ok(Self {
            entry,
            instance,
            validation_enabled,
        })
    }

    /// Whether validation layers were enabled at creation time
    pub fn validation_enabled(&self) -> bool {
        self.validation_enabled
    }

    fn check_validation_layers(entry: &Entry) -> VulkanResult<()> {
        let available = entry.enumerate_instance_layer_properties()?;

        for required in REQUIRED_LAYERS {
            let found = available.iter().any(|props| {
                let name = unsafe { CStr::from_ptr(props.layer_name.as_ptr()) };
                name == *required
            });
            if !found {
                return Err(VulkanError::MissingValidationLayer(
                    required.to_string_lossy().into_owned(),
                ));
            }
        }

        Ok(())
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            self.instance.destroy_instance(None);
        }
    }
}
