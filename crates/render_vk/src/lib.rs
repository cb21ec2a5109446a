//! # render_vk
//!
//! Brings up a Vulkan rendering context capable of presenting frames to a
//! window: instance, diagnostics messenger, surface, physical/logical device,
//! swapchain, render pass and graphics pipeline, torn down in strict reverse
//! creation order.
//!
//! The windowing toolkit, the SPIR-V blobs and the log sink are external
//! collaborators: the caller supplies a raw window handle plus the instance
//! extensions its toolkit requires, pre-compiled shader byte code, and a
//! [`log`] backend.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use render_vk::{RendererConfig, VulkanContext};
//!
//! let config = RendererConfig::default();
//! // `window` is anything implementing HasRawWindowHandle + HasRawDisplayHandle;
//! // `extensions` is the list the windowing toolkit reports as required.
//! let context = VulkanContext::new(&window, &extensions, &config)?;
//! // render, then drop `context` to release everything in reverse order
//! ```

pub mod config;
pub mod context;
pub mod debug;
pub mod device;
pub mod error;
pub mod instance;
pub mod pipeline;
pub mod render_pass;
pub mod shader;
pub mod surface;
pub mod swapchain;

pub use config::{RendererConfig, ShaderConfig};
pub use context::VulkanContext;
pub use debug::DebugMessenger;
pub use device::{LogicalDevice, PhysicalDeviceInfo, QueueFamilyIndices, QueueFamilyInfo};
pub use error::{VulkanError, VulkanResult};
pub use instance::VulkanInstance;
pub use pipeline::GraphicsPipeline;
pub use render_pass::RenderPass;
pub use shader::ShaderModule;
pub use surface::Surface;
pub use swapchain::{Swapchain, SwapchainSettings};
