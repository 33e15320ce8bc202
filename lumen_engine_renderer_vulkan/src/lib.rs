/*!
# Lumen Engine - Vulkan Backend

Vulkan implementation of the `lumen_engine` collaborator traits, built on
`ash` and `ash-window`.

`VulkanContext` owns the instance, logical device, queues and command pool and
implements `GraphicsContext` and `DrawCommands`; a `WindowSurface` created on it
manages the window's surface, swapchain and frame synchronization.

# Example

```no_run
use lumen_engine::lumen::Config;
use lumen_engine::lumen::surface::WindowSurface;
use lumen_engine_renderer_vulkan::VulkanContext;
# fn run(window: &winit::window::Window) -> lumen_engine::lumen::Result<()> {
let config = Config::default();
let context = VulkanContext::new(window, &config)?;
let mut surface = WindowSurface::new(&context, window);
surface.create_surface()?;
surface.initialize()?;
# Ok(())
# }
```
*/

mod debug;
mod vulkan_context;
mod vulkan_format;
mod vulkan_graphics_context;
mod vulkan_commands;

pub use vulkan_context::VulkanContext;

// Re-export debug utilities
pub use debug::{get_validation_stats, ValidationStats};
