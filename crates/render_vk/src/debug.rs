//! Validation-layer diagnostics bridge
//!
//! Installs a debug-utils messenger that forwards driver validation messages
//! to the [`log`] facade. The driver may invoke the callback from one of its
//! own threads at any time between install and uninstall, so the callback
//! only touches the thread-safe log sink and never unwinds across the FFI
//! boundary.

use std::ffi::CStr;

use ash::extensions::ext::DebugUtils;
use ash::{vk, Entry, Instance};

use crate::error::{VulkanError, VulkanResult};

/// Debug-utils messenger wrapper with RAII cleanup
///
/// The debug-utils entry points are resolved once when the loader is built;
/// on driver builds without the extension, messenger creation is rejected and
/// surfaces as [`VulkanError::DebugUtilsUnavailable`].
pub struct DebugMessenger {
    debug_utils: DebugUtils,
    messenger: vk::DebugUtilsMessengerEXT,
}

impl DebugMessenger {
    /// Install the messenger on the given instance
    pub fn new(entry: &Entry, instance: &Instance) -> VulkanResult<Self> {
        let debug_utils = DebugUtils::new(entry, instance);
        let create_info = messenger_create_info();

        let messenger = unsafe {
            debug_utils
                .create_debug_utils_messenger(&create_info, None)
                .map_err(VulkanError::DebugUtilsUnavailable)?
        };
        log::debug!("Installed debug-utils messenger");

        Ok(Self {
            debug_utils,
            messenger,
        })
    }
}

impl Drop for DebugMessenger {
    fn drop(&mut self) {
        unsafe {
            self.debug_utils
                .destroy_debug_utils_messenger(self.messenger, None);
        }
    }
}

/// Messenger configuration shared between installation and the pNext chain of
/// instance creation
///
/// Informational and verbose messages are filtered here, by configuration,
/// so the callback itself never sees them.
pub(crate) fn messenger_create_info() -> vk::DebugUtilsMessengerCreateInfoEXTBuilder<'static> {
    vk::DebugUtilsMessengerCreateInfoEXT::builder()
        .message_severity(
            vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
        )
        .message_type(
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
        )
        .pfn_user_callback(Some(debug_callback))
}

/// Callback invoked by the driver; forwards to `log` and never aborts the
/// triggering call
unsafe extern "system" fn debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT,
    _user_data: *mut std::ffi::c_void,
) -> vk::Bool32 {
    let message = CStr::from_ptr((*callback_data).p_message).to_string_lossy();

    let category = match message_type {
        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL => "general",
        vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION => "validation",
        vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE => "performance",
        _ => "-",
    };

    if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        log::error!("[Vulkan] [{category}] {message}");
    } else {
        log::warn!("[Vulkan] [{category}] {message}");
    }

    vk::FALSE
}
