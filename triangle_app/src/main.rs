//! Triangle demo application
//!
//! Brings up a complete Vulkan rendering context against a GLFW window and
//! runs the event loop, recreating the swapchain on framebuffer resizes.

mod window;

use glfw::{Action, Key, WindowEvent};
use render_vk::{RendererConfig, ShaderConfig, VulkanContext};

use crate::window::Window;

const WINDOW_TITLE: &str = "Vulkan Triangle";
const WINDOW_WIDTH: u32 = 800;
const WINDOW_HEIGHT: u32 = 600;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = RendererConfig {
        application_name: WINDOW_TITLE.to_string(),
        application_version: (0, 1, 0),
        shaders: ShaderConfig::with_path_resolution("vert.spv", "frag.spv"),
        enable_validation: None,
    };

    let mut window = Window::new(WINDOW_TITLE, WINDOW_WIDTH, WINDOW_HEIGHT)?;
    let extensions = window.required_instance_extensions()?;
    log::info!("GLFW requires instance extensions: {extensions:?}");

    let mut context = VulkanContext::new(window.inner(), &extensions, &config)?;

    let mut framebuffer_resized = false;
    while !window.should_close() {
        window.poll_events();

        let events: Vec<(f64, WindowEvent)> = window.flush_events().collect();
        for (_, event) in events {
            match event {
                WindowEvent::Key(Key::Escape, _, Action::Press, _) => {
                    window.set_should_close(true);
                }
                WindowEvent::FramebufferSize(_, _) => {
                    framebuffer_resized = true;
                }
                WindowEvent::Close => {
                    window.set_should_close(true);
                }
                _ => {}
            }
        }

        if framebuffer_resized {
            let (width, height) = window.framebuffer_size();
            // A minimized window reports a zero-area framebuffer; wait for
            // it to come back before rebuilding anything.
            if width > 0 && height > 0 {
                context.recreate_swapchain()?;
                framebuffer_resized = false;
            }
        }
    }

    drop(context);
    log::info!("Shut down cleanly");
    Ok(())
}
