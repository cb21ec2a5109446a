//! Error types for Vulkan context initialization
//!
//! Every failure during bring-up is fatal to the initialization sequence:
//! nothing is retried internally. Already-constructed resources are released
//! by their RAII wrappers while the error propagates.

use std::path::PathBuf;

use ash::vk;
use thiserror::Error;

/// Vulkan initialization errors
#[derive(Error, Debug)]
pub enum VulkanError {
    /// The Vulkan loader shared library could not be found or loaded
    #[error("failed to load the Vulkan library: {0}")]
    LibraryLoad(String),

    /// Physical-device enumeration returned zero candidates
    #[error("no Vulkan-capable devices present")]
    NoAdapters,

    /// Candidates were enumerated but none satisfies the requirements
    #[error("no suitable GPU found (graphics + presentation queues, required extensions, surface support)")]
    NoSuitableAdapter,

    /// A requested validation layer is not installed
    #[error("validation layer {0:?} is not available")]
    MissingValidationLayer(String),

    /// Validation was requested but the debug-utils entry points are absent
    #[error("validation requested but VK_EXT_debug_utils could not be set up")]
    DebugUtilsUnavailable(#[source] vk::Result),

    /// A creation or enumeration call was rejected by the driver
    #[error("Vulkan API error: {0:?}")]
    Api(#[from] vk::Result),

    /// A SPIR-V blob could not be read from disk
    #[error("failed to read shader {path:?}")]
    Shader {
        /// Path of the missing or unreadable blob
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// SPIR-V byte code is not a whole number of 4-byte words
    #[error("SPIR-V byte code is not 4-byte aligned")]
    ShaderAlignment,

    /// The windowing collaborator failed to supply a surface or extension list
    #[error("window error: {0}")]
    Window(String),
}

/// Result type for Vulkan operations
pub type VulkanResult<T> = Result<T, VulkanError>;
