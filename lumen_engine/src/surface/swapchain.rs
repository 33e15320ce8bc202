/// Swapchain aggregate and its per-image elements

use glam::UVec2;

use crate::graphics_context::{GraphicsContext, SurfaceFormat, PresentMode};

/// Everything tied to one presentable image
///
/// The framebuffer and command buffer are filled in by later creation steps.
pub struct SwapchainElement<C: GraphicsContext> {
    pub image: C::Image,
    pub image_view: C::ImageView,
    pub framebuffer: Option<C::Framebuffer>,
    pub command_buffer: Option<C::CommandBuffer>,
}

/// Swapchain handle with the parameters it was created with
///
/// `image_count` always equals `elements.len()`.
pub struct Swapchain<C: GraphicsContext> {
    pub handle: C::Swapchain,
    pub format: SurfaceFormat,
    pub present_mode: PresentMode,
    pub extent: UVec2,
    pub image_count: u32,
    pub elements: Vec<SwapchainElement<C>>,
    /// Element acquired for the frame being recorded
    pub current_element_index: u32,
}

impl<C: GraphicsContext> Swapchain<C> {
    pub fn current_element(&self) -> Option<&SwapchainElement<C>> {
        self.elements.get(self.current_element_index as usize)
    }

    /// Framebuffers of every element that has one, in image order
    pub fn framebuffers(&self) -> Vec<C::Framebuffer> {
        self.elements.iter().filter_map(|e| e.framebuffer).collect()
    }

    /// Command buffers of every element that has one, in image order
    pub fn command_buffers(&self) -> Vec<C::CommandBuffer> {
        self.elements.iter().filter_map(|e| e.command_buffer).collect()
    }
}
