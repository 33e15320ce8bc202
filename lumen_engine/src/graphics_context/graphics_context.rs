/// GraphicsContext, DrawCommands and SurfaceWindow traits

use std::fmt::Debug;
use glam::UVec2;
use winit::window::Window;

use crate::error::Result;
use crate::graphics_context::{
    SurfaceFormat, SurfaceSupport, SwapchainDesc, QueueFamilyIndices,
    RenderPassDesc, RenderPassBegin, SubmitDesc, AcquireResult, PresentResult,
    IndexType,
};

// ============================================================================
// Window collaborator
// ============================================================================

/// Window a surface can be bound to
pub trait SurfaceWindow {
    /// Size of the drawable area in physical pixels
    fn pixel_size(&self) -> UVec2;
}

impl SurfaceWindow for Window {
    fn pixel_size(&self) -> UVec2 {
        let size = self.inner_size();
        UVec2::new(size.width, size.height)
    }
}

// ============================================================================
// Device/context collaborator
// ============================================================================

/// Device/context collaborator
///
/// Wraps a logical device with its graphics and present queues and a command
/// pool. Handles are plain copyable values; the caller owns their lifetime and
/// must destroy every handle it creates through the matching `destroy_*`.
///
/// All methods take `&self`: a context is shared by every surface created on
/// it, and must outlive them.
pub trait GraphicsContext {
    type Window: SurfaceWindow;
    type Surface: Copy + Debug + PartialEq;
    type Swapchain: Copy + Debug + PartialEq;
    type Image: Copy + Debug + PartialEq;
    type ImageView: Copy + Debug + PartialEq;
    type RenderPass: Copy + Debug + PartialEq;
    type Framebuffer: Copy + Debug + PartialEq;
    type CommandBuffer: Copy + Debug + PartialEq;
    type Semaphore: Copy + Debug + PartialEq;
    type Fence: Copy + Debug + PartialEq;

    // ===== DEVICE =====

    /// True while the logical device exists
    fn is_device_alive(&self) -> bool;

    /// Graphics and present queue families selected at device creation
    fn queue_family_indices(&self) -> QueueFamilyIndices;

    /// Block until the device has finished all submitted work
    fn wait_idle(&self) -> Result<()>;

    // ===== SURFACE =====

    fn create_surface(&self, window: &Self::Window) -> Result<Self::Surface>;
    fn destroy_surface(&self, surface: Self::Surface);

    /// Capabilities, formats and present modes of `surface` on this device
    fn query_surface_support(&self, surface: Self::Surface) -> Result<SurfaceSupport>;

    // ===== SWAPCHAIN =====

    fn create_swapchain(&self, desc: &SwapchainDesc<Self::Surface>) -> Result<Self::Swapchain>;
    fn destroy_swapchain(&self, swapchain: Self::Swapchain);

    /// Presentable images owned by the swapchain (destroyed with it)
    fn swapchain_images(&self, swapchain: Self::Swapchain) -> Result<Vec<Self::Image>>;

    fn create_image_view(&self, image: Self::Image, format: SurfaceFormat) -> Result<Self::ImageView>;
    fn destroy_image_view(&self, view: Self::ImageView);

    // ===== RENDER PASS / FRAMEBUFFER =====

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Self::RenderPass>;
    fn destroy_render_pass(&self, render_pass: Self::RenderPass);

    fn create_framebuffer(
        &self,
        render_pass: Self::RenderPass,
        view: Self::ImageView,
        extent: UVec2,
    ) -> Result<Self::Framebuffer>;
    fn destroy_framebuffer(&self, framebuffer: Self::Framebuffer);

    // ===== COMMAND BUFFERS =====

    /// Allocate primary command buffers from the context's pool
    fn allocate_command_buffers(&self, count: u32) -> Result<Vec<Self::CommandBuffer>>;
    fn free_command_buffers(&self, command_buffers: &[Self::CommandBuffer]);

    /// Reset and begin recording
    fn begin_command_buffer(&self, command_buffer: Self::CommandBuffer) -> Result<()>;
    fn end_command_buffer(&self, command_buffer: Self::CommandBuffer) -> Result<()>;

    /// Begin the render pass and set a full-extent viewport and scissor
    fn cmd_begin_render_pass(
        &self,
        command_buffer: Self::CommandBuffer,
        begin: &RenderPassBegin<Self::RenderPass, Self::Framebuffer>,
    );
    fn cmd_end_render_pass(&self, command_buffer: Self::CommandBuffer);

    // ===== SYNCHRONIZATION =====

    fn create_semaphore(&self) -> Result<Self::Semaphore>;
    fn destroy_semaphore(&self, semaphore: Self::Semaphore);

    fn create_fence(&self, signaled: bool) -> Result<Self::Fence>;
    fn destroy_fence(&self, fence: Self::Fence);

    /// Block until `fence` is signaled or `timeout` nanoseconds elapse
    fn wait_for_fence(&self, fence: Self::Fence, timeout: u64) -> Result<()>;
    fn reset_fence(&self, fence: Self::Fence) -> Result<()>;

    // ===== PRESENTATION =====

    /// Acquire the next presentable image, signaling `signal` once it is ready
    fn acquire_next_image(
        &self,
        swapchain: Self::Swapchain,
        timeout: u64,
        signal: Self::Semaphore,
    ) -> Result<AcquireResult>;

    /// Submit one command buffer to the graphics queue
    fn submit(&self, desc: &SubmitDesc<Self::CommandBuffer, Self::Semaphore, Self::Fence>) -> Result<()>;

    /// Queue `image_index` for presentation on the present queue after `wait`
    fn present(
        &self,
        swapchain: Self::Swapchain,
        image_index: u32,
        wait: Self::Semaphore,
    ) -> Result<PresentResult>;
}

// ============================================================================
// Draw recording
// ============================================================================

/// Draw commands recorded into a command buffer inside a render pass
pub trait DrawCommands: GraphicsContext {
    type Buffer: Copy + Debug + PartialEq;
    type Pipeline: Copy + Debug + PartialEq;
    type PipelineLayout: Copy + Debug + PartialEq;
    type DescriptorSet: Copy + Debug + PartialEq;

    fn cmd_bind_pipeline(&self, command_buffer: Self::CommandBuffer, pipeline: Self::Pipeline);

    fn cmd_bind_vertex_buffer(
        &self,
        command_buffer: Self::CommandBuffer,
        binding: u32,
        buffer: Self::Buffer,
        offset: u64,
    );

    fn cmd_bind_index_buffer(
        &self,
        command_buffer: Self::CommandBuffer,
        buffer: Self::Buffer,
        offset: u64,
        index_type: IndexType,
    );

    fn cmd_bind_descriptor_set(
        &self,
        command_buffer: Self::CommandBuffer,
        layout: Self::PipelineLayout,
        set_index: u32,
        descriptor_set: Self::DescriptorSet,
    );

    fn cmd_draw_indexed(
        &self,
        command_buffer: Self::CommandBuffer,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    );
}
