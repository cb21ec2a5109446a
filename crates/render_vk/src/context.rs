//! Rendering context lifecycle
//!
//! [`VulkanContext`] owns every bring-up object and encodes the teardown
//! contract in its field order: Rust drops fields in declaration order, so
//! the struct lists its members in reverse order of creation. A failure at
//! any point of [`VulkanContext::new`] unwinds through the wrappers already
//! built, releasing exactly what was created.

use ash::vk;
use raw_window_handle::{HasRawDisplayHandle, HasRawWindowHandle};

use crate::config::RendererConfig;
use crate::debug::DebugMessenger;
use crate::device::{LogicalDevice, PhysicalDeviceInfo};
use crate::error::VulkanResult;
use crate::instance::VulkanInstance;
use crate::pipeline::GraphicsPipeline;
use crate::render_pass::RenderPass;
use crate::shader::ShaderModule;
use crate::surface::Surface;
use crate::swapchain::Swapchain;

/// Fully initialized rendering context
///
/// Creation order is instance, debug messenger, surface, physical device
/// selection, logical device, swapchain, render pass, pipeline. Destruction
/// runs in the exact reverse via field declaration order.
pub struct VulkanContext {
    pipeline: GraphicsPipeline,
    render_pass: RenderPass,
    swapchain: Swapchain,
    device: LogicalDevice,
    physical_device: PhysicalDeviceInfo,
    surface: Surface,
    // None when validation is disabled; still dropped before the instance.
    debug_messenger: Option<DebugMessenger>,
    instance: VulkanInstance,
    config: RendererConfig,
}

impl VulkanContext {
    /// Bring up a complete rendering context for `window`
    ///
    /// `required_extensions` is the instance extension list reported by the
    /// windowing toolkit.
    pub fn new<W>(
        window: &W,
        required_extensions: &[String],
        config: &RendererConfig,
    ) -> VulkanResult<Self>
    where
        W: HasRawWindowHandle + HasRawDisplayHandle,
    {
        let instance = VulkanInstance::new(required_extensions, config)?;

        let debug_messenger = if instance.validation_enabled() {
            Some(DebugMessenger::new(&instance.entry, &instance.instance)?)
        } else {
            None
        };

        let surface = Surface::new(&instance, window)?;
        let physical_device = PhysicalDeviceInfo::select(&instance.instance, &surface)?;
        let device = LogicalDevice::new(&instance, &physical_device)?;
        let swapchain = Swapchain::new(&device, &surface, &physical_device)?;

        let (render_pass, pipeline) =
            Self::build_pass_and_pipeline(&device, &swapchain, config)?;

        log::info!("Vulkan context initialized");

        Ok(Self {
            pipeline,
            render_pass,
            swapchain,
            device,
            physical_device,
            surface,
            debug_messenger,
            instance,
            config: config.clone(),
        })
    }

    /// Rebuild the swapchain and everything sized to it
    ///
    /// Call after a window resize or a surface-lost report from the driver.
    /// The pipeline uses a static viewport, so it is rebuilt along with the
    /// render pass rather than patched in place.
    pub fn recreate_swapchain(&mut self) -> VulkanResult<()> {
        unsafe { self.device.device.device_wait_idle()? };

        let swapchain = Swapchain::recreate(
            &self.device,
            &self.surface,
            &self.physical_device,
            self.swapchain.handle(),
        )?;
        let (render_pass, pipeline) =
            Self::build_pass_and_pipeline(&self.device, &swapchain, &self.config)?;

        // Replace in reverse creation order so the old pipeline goes first.
        self.pipeline = pipeline;
        self.render_pass = render_pass;
        self.swapchain = swapchain;

        log::info!(
            "Recreated swapchain at {}x{}",
            self.swapchain.extent().width,
            self.swapchain.extent().height
        );
        Ok(())
    }

    fn build_pass_and_pipeline(
        device: &LogicalDevice,
        swapchain: &Swapchain,
        config: &RendererConfig,
    ) -> VulkanResult<(RenderPass, GraphicsPipeline)> {
        let render_pass = RenderPass::new(&device.device, swapchain.format().format)?;

        // Shader modules are only needed until the pipeline is baked.
        let vertex_shader =
            ShaderModule::from_file(&device.device, &config.shaders.vertex_shader_path)?;
        let fragment_shader =
            ShaderModule::from_file(&device.device, &config.shaders.fragment_shader_path)?;

        let pipeline = GraphicsPipeline::new(
            &device.device,
            render_pass.handle(),
            &vertex_shader,
            &fragment_shader,
            swapchain.extent(),
        )?;

        Ok((render_pass, pipeline))
    }

    /// Get the instance wrapper
    pub fn instance(&self) -> &VulkanInstance {
        &self.instance
    }

    /// Get the surface wrapper
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Get the selected physical device
    pub fn physical_device(&self) -> &PhysicalDeviceInfo {
        &self.physical_device
    }

    /// Get the logical device wrapper
    pub fn device(&self) -> &LogicalDevice {
        &self.device
    }

    /// Get the swapchain
    pub fn swapchain(&self) -> &Swapchain {
        &self.swapchain
    }

    /// Get the render pass
    pub fn render_pass(&self) -> &RenderPass {
        &self.render_pass
    }

    /// Get the graphics pipeline
    pub fn pipeline(&self) -> &GraphicsPipeline {
        &self.pipeline
    }

    /// Whether the diagnostics messenger is installed
    pub fn diagnostics_active(&self) -> bool {
        self.debug_messenger.is_some()
    }

    /// Get the negotiated swapchain extent
    pub fn extent(&self) -> vk::Extent2D {
        self.swapchain.extent()
    }
}
