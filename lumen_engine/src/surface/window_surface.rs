/// WindowSurface - swapchain lifecycle and frame submission for one window
///
/// Owns the native surface, the swapchain with its per-image elements, the
/// render pass and the frame synchronization ring. Borrows the context and the
/// window: both must outlive the surface, which the `'a` lifetime enforces.
///
/// ```text
/// Uninitialized --create_surface--> SurfaceBound --initialize--> Ready
///                                        ^                         |
///                                        +--- zero-area resize ----+
/// any --clean_up--> Destroyed
/// ```

use glam::{UVec2, Vec4};

use crate::error::{Error, Result};
use crate::graphics_context::{
    GraphicsContext, SurfaceWindow, SwapchainDesc, ImageUsage, CompositeAlpha,
    RenderPassDesc, ColorAttachmentDesc, SubpassDependency, RenderPassBegin, SubmitDesc,
    LoadOp, StoreOp, ImageLayout, PipelineStages, AccessFlags, TextureFormat,
    AcquireResult, PresentResult,
};
use crate::log::ScopedTask;
use crate::surface::{
    FrameSynchronization, Swapchain, SwapchainElement,
    get_best_surface_format, get_best_present_mode, get_best_swap_extent,
    get_image_count, get_sharing_mode,
};
use crate::{engine_trace, engine_debug, engine_info, engine_warn, engine_error, engine_err};

const SOURCE: &str = "lumen::surface";

/// Fence wait and image acquisition timeout (effectively unbounded)
pub const FRAME_TIMEOUT: u64 = u64::MAX;

/// Lifecycle state of a window surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceState {
    /// Nothing created yet
    Uninitialized,
    /// Native surface bound, no usable swapchain (not yet built, or torn down while minimized)
    SurfaceBound,
    /// Swapchain, render pass, framebuffers, command buffers and sync all exist
    Ready,
    /// Everything released
    Destroyed,
}

/// Result of `begin_frame`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// Commands may be recorded; `end_frame` must follow
    Recording { frame: usize, image_index: u32 },
    /// No image this time (zero-area window, or swapchain stale twice in a row)
    Skipped,
}

/// Render pass used for swapchain images: clear, store, present
pub fn swapchain_render_pass_desc(format: TextureFormat) -> RenderPassDesc {
    RenderPassDesc {
        color_attachment: ColorAttachmentDesc {
            format,
            load_op: LoadOp::Clear,
            store_op: StoreOp::Store,
            stencil_load_op: LoadOp::DontCare,
            stencil_store_op: StoreOp::DontCare,
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::PresentSrc,
        },
        // Order the previous frame's color writes before this subpass touches the attachment
        dependency: SubpassDependency {
            src_subpass: None,
            dst_subpass: 0,
            src_stage: PipelineStages::COLOR_ATTACHMENT_OUTPUT,
            dst_stage: PipelineStages::COLOR_ATTACHMENT_OUTPUT,
            src_access: AccessFlags::empty(),
            dst_access: AccessFlags::COLOR_ATTACHMENT_READ | AccessFlags::COLOR_ATTACHMENT_WRITE,
        },
    }
}

fn invalid_state(operation: &str, reason: &str) -> Error {
    engine_error!(SOURCE, "{}: {}", operation, reason);
    Error::InvalidState(format!("{}: {}", operation, reason))
}

fn invalid_configuration(operation: &str, reason: &str) -> Error {
    engine_error!(SOURCE, "{}: {}", operation, reason);
    Error::InvalidConfiguration(format!("{}: {}", operation, reason))
}

fn has_area(size: UVec2) -> bool {
    size.x > 0 && size.y > 0
}

pub struct WindowSurface<'a, C: GraphicsContext> {
    context: &'a C,
    window: &'a C::Window,
    clear_color: [f32; 4],
    state: SurfaceState,
    surface: Option<C::Surface>,
    swapchain: Option<Swapchain<C>>,
    render_pass: Option<C::RenderPass>,
    sync: Option<FrameSynchronization<C>>,
    resize_pending: bool,
    recording: bool,
}

impl<'a, C: GraphicsContext> WindowSurface<'a, C> {
    /// Create an unbound surface for `window` on `context`
    ///
    /// # Panics
    ///
    /// In debug builds, if the context reports its device as gone.
    pub fn new(context: &'a C, window: &'a C::Window) -> Self {
        debug_assert!(
            context.is_device_alive(),
            "WindowSurface requires a context with a live device"
        );
        let size = window.pixel_size();
        engine_debug!(SOURCE, "Window surface created for a {}x{} window", size.x, size.y);

        Self {
            context,
            window,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            state: SurfaceState::Uninitialized,
            surface: None,
            swapchain: None,
            render_pass: None,
            sync: None,
            resize_pending: false,
            recording: false,
        }
    }

    /// Color the render pass clears each image to
    pub fn set_clear_color(&mut self, color: Vec4) {
        self.clear_color = color.to_array();
    }

    // ===== CREATION =====

    /// Bind a native surface to the window
    pub fn create_surface(&mut self) -> Result<()> {
        if self.state != SurfaceState::Uninitialized {
            return Err(invalid_state("create_surface", "surface already bound"));
        }
        let _task = ScopedTask::begin(SOURCE, "Surface creation");

        let surface = self.context.create_surface(self.window).map_err(|e| {
            engine_error!(SOURCE, "create_surface: surface creation rejected: {}", e);
            Error::InitializationFailed(format!("create_surface: {}", e))
        })?;

        self.surface = Some(surface);
        self.state = SurfaceState::SurfaceBound;
        Ok(())
    }

    /// Build the swapchain, render pass, framebuffers, command buffers and frame sync
    ///
    /// A window with no drawable area only gets its frame sync; the swapchain is
    /// built by the first `begin_frame` after the window is restored.
    pub fn initialize(&mut self) -> Result<()> {
        if self.state != SurfaceState::SurfaceBound {
            return Err(invalid_state("initialize", "surface must be bound first"));
        }
        let _task = ScopedTask::begin(SOURCE, "Window surface initialization");

        if !has_area(self.window.pixel_size()) {
            engine_info!(SOURCE, "Window has no drawable area, swapchain creation deferred");
            return self.initialize_synchronization();
        }

        self.create_swapchain()?;
        self.create_render_pass()?;
        self.create_frame_buffers()?;
        self.create_command_buffers()?;
        self.initialize_synchronization()?;

        self.state = SurfaceState::Ready;
        Ok(())
    }

    /// Create the swapchain and one image view per swapchain image
    pub fn create_swapchain(&mut self) -> Result<()> {
        let size = self.window.pixel_size();
        self.build_swapchain(size)
    }

    fn build_swapchain(&mut self, window_size: UVec2) -> Result<()> {
        let surface = self
            .surface
            .ok_or_else(|| invalid_configuration("create_swapchain", "no surface bound"))?;
        if self.swapchain.is_some() {
            return Err(invalid_state("create_swapchain", "swapchain already exists"));
        }

        let sharing_mode = get_sharing_mode(self.context.queue_family_indices()).map_err(|e| {
            engine_error!(SOURCE, "create_swapchain: {}", e);
            e
        })?;

        let support = self.context.query_surface_support(surface)?;
        let format = get_best_surface_format(&support.formats)
            .ok_or_else(|| invalid_configuration("create_swapchain", "surface reports no formats"))?;
        let present_mode = get_best_present_mode(&support.present_modes);
        let extent = get_best_swap_extent(&support.capabilities, window_size);

        let desc = SwapchainDesc {
            surface,
            min_image_count: get_image_count(&support.capabilities),
            format,
            extent,
            usage: ImageUsage::COLOR_ATTACHMENT,
            sharing_mode,
            pre_transform: support.capabilities.current_transform,
            composite_alpha: CompositeAlpha::Opaque,
            present_mode,
            clipped: true,
        };

        let handle = self.context.create_swapchain(&desc)?;
        let images = match self.context.swapchain_images(handle) {
            Ok(images) => images,
            Err(e) => {
                self.context.destroy_swapchain(handle);
                return Err(e);
            }
        };

        let mut elements: Vec<SwapchainElement<C>> = Vec::with_capacity(images.len());
        for image in images {
            match self.context.create_image_view(image, format) {
                Ok(image_view) => elements.push(SwapchainElement {
                    image,
                    image_view,
                    framebuffer: None,
                    command_buffer: None,
                }),
                Err(e) => {
                    for element in elements {
                        self.context.destroy_image_view(element.image_view);
                    }
                    self.context.destroy_swapchain(handle);
                    return Err(e);
                }
            }
        }

        engine_info!(
            SOURCE,
            "Swapchain created: {}x{}, {} images, {:?}/{:?}, {:?}",
            extent.x,
            extent.y,
            elements.len(),
            format.format,
            format.color_space,
            present_mode
        );

        self.swapchain = Some(Swapchain {
            handle,
            format,
            present_mode,
            extent,
            image_count: elements.len() as u32,
            elements,
            current_element_index: 0,
        });
        Ok(())
    }

    /// Create the render pass targeting the swapchain format
    pub fn create_render_pass(&mut self) -> Result<()> {
        let format = match &self.swapchain {
            Some(swapchain) => swapchain.format.format,
            None => return Err(invalid_state("create_render_pass", "no swapchain")),
        };
        if self.render_pass.is_some() {
            return Err(invalid_state("create_render_pass", "render pass already exists"));
        }

        let render_pass = self.context.create_render_pass(&swapchain_render_pass_desc(format))?;
        self.render_pass = Some(render_pass);
        Ok(())
    }

    /// Create one framebuffer per swapchain element
    pub fn create_frame_buffers(&mut self) -> Result<()> {
        let render_pass = self
            .render_pass
            .ok_or_else(|| invalid_state("create_frame_buffers", "no render pass"))?;
        let context = self.context;
        let swapchain = self
            .swapchain
            .as_mut()
            .ok_or_else(|| invalid_state("create_frame_buffers", "no swapchain"))?;

        let extent = swapchain.extent;
        for element in swapchain.elements.iter_mut().filter(|e| e.framebuffer.is_none()) {
            element.framebuffer = Some(context.create_framebuffer(render_pass, element.image_view, extent)?);
        }
        Ok(())
    }

    /// Allocate one command buffer per swapchain element
    pub fn create_command_buffers(&mut self) -> Result<()> {
        let context = self.context;
        let swapchain = self
            .swapchain
            .as_mut()
            .ok_or_else(|| invalid_state("create_command_buffers", "no swapchain"))?;

        let missing = swapchain
            .elements
            .iter()
            .filter(|e| e.command_buffer.is_none())
            .count() as u32;
        if missing == 0 {
            return Ok(());
        }

        let command_buffers = context.allocate_command_buffers(missing)?;
        for (element, command_buffer) in swapchain
            .elements
            .iter_mut()
            .filter(|e| e.command_buffer.is_none())
            .zip(command_buffers)
        {
            element.command_buffer = Some(command_buffer);
        }
        Ok(())
    }

    /// Create the frame slots. Does nothing if they already exist.
    pub fn initialize_synchronization(&mut self) -> Result<()> {
        if self.sync.is_some() {
            engine_debug!(SOURCE, "Frame synchronization already initialized");
            return Ok(());
        }
        self.sync = Some(FrameSynchronization::create(self.context)?);
        Ok(())
    }

    // ===== FRAME =====

    /// Wait for the current slot, acquire an image and start recording into it
    ///
    /// A stale swapchain is recreated and the acquisition retried once. If it is
    /// still stale, or the window has no drawable area, the frame is skipped.
    pub fn begin_frame(&mut self) -> Result<FrameStatus> {
        if self.recording {
            return Err(invalid_state("begin_frame", "a frame is already recording"));
        }
        let (slot, frame) = match &self.sync {
            Some(sync) => (sync.current(), sync.current_frame()),
            None => return Err(invalid_state("begin_frame", "surface not initialized")),
        };

        if self.resize_pending || self.state != SurfaceState::Ready {
            self.resize_pending = false;
            self.handle_out_of_date_swapchain()?;
        }
        if self.swapchain.is_none() {
            engine_trace!(SOURCE, "[slot {}] window has no drawable area, frame skipped", frame);
            return Ok(FrameStatus::Skipped);
        }

        self.context.wait_for_fence(slot.in_flight, FRAME_TIMEOUT).map_err(|e| {
            engine_error!(SOURCE, "[slot {}] begin_frame: fence wait failed: {}", frame, e);
            e
        })?;

        let mut retried = false;
        let image_index = loop {
            let handle = match &self.swapchain {
                Some(swapchain) => swapchain.handle,
                None => return Ok(FrameStatus::Skipped),
            };
            match self.context.acquire_next_image(handle, FRAME_TIMEOUT, slot.image_available)? {
                AcquireResult::Acquired { image_index, suboptimal } => {
                    if suboptimal {
                        engine_debug!(SOURCE, "[slot {}] acquired image {} is suboptimal", frame, image_index);
                    }
                    break image_index;
                }
                AcquireResult::OutOfDate if !retried => {
                    engine_warn!(SOURCE, "[slot {}] begin_frame: swapchain out of date, recreating", frame);
                    retried = true;
                    self.handle_out_of_date_swapchain()?;
                }
                AcquireResult::OutOfDate => {
                    engine_warn!(
                        SOURCE,
                        "[slot {}] begin_frame: swapchain still out of date after recreation, frame skipped",
                        frame
                    );
                    return Ok(FrameStatus::Skipped);
                }
            }
        };

        let context = self.context;
        let clear_color = self.clear_color;
        let render_pass = self
            .render_pass
            .ok_or_else(|| invalid_state("begin_frame", "no render pass"))?;
        let swapchain = self
            .swapchain
            .as_mut()
            .ok_or_else(|| invalid_state("begin_frame", "no swapchain"))?;

        let element_count = swapchain.elements.len();
        let element = swapchain.elements.get(image_index as usize).ok_or_else(|| {
            engine_err!(
                SOURCE,
                "[slot {}] begin_frame: acquired image {} out of range ({} images)",
                frame,
                image_index,
                element_count
            )
        })?;
        let (command_buffer, framebuffer) = match (element.command_buffer, element.framebuffer) {
            (Some(command_buffer), Some(framebuffer)) => (command_buffer, framebuffer),
            _ => {
                return Err(invalid_state(
                    "begin_frame",
                    "swapchain element has no command buffer or framebuffer",
                ))
            }
        };

        context.reset_fence(slot.in_flight)?;
        swapchain.current_element_index = image_index;
        if let Err(e) = context.begin_command_buffer(command_buffer) {
            engine_error!(SOURCE, "[slot {}] begin_frame: begin_command_buffer failed: {}", frame, e);
            // Nothing will be submitted with this fence, so the next wait needs a signaled one
            if let Some(sync) = self.sync.as_mut() {
                if let Err(fence_error) = sync.replace_current_fence(context) {
                    engine_error!(SOURCE, "[slot {}] begin_frame: fence replacement failed: {}", frame, fence_error);
                }
            }
            return Err(e);
        }
        context.cmd_begin_render_pass(
            command_buffer,
            &RenderPassBegin {
                render_pass,
                framebuffer,
                extent: swapchain.extent,
                clear_color,
            },
        );

        self.recording = true;
        engine_trace!(SOURCE, "[slot {}] recording into image {}", frame, image_index);
        Ok(FrameStatus::Recording { frame, image_index })
    }

    /// Finish recording, submit, present and move to the next frame slot
    ///
    /// The slot advances whatever the submission or presentation outcome.
    pub fn end_frame(&mut self) -> Result<()> {
        if !self.recording {
            return Err(invalid_state("end_frame", "no frame is recording"));
        }
        self.recording = false;

        let result = self.submit_and_present();
        if let Some(sync) = self.sync.as_mut() {
            sync.advance();
        }
        result
    }

    fn submit_and_present(&mut self) -> Result<()> {
        let context = self.context;
        let (slot, frame) = match &self.sync {
            Some(sync) => (sync.current(), sync.current_frame()),
            None => return Err(invalid_state("end_frame", "surface not initialized")),
        };
        let swapchain = self
            .swapchain
            .as_ref()
            .ok_or_else(|| invalid_state("end_frame", "no swapchain"))?;
        let handle = swapchain.handle;
        let image_index = swapchain.current_element_index;
        let command_buffer = swapchain
            .current_element()
            .and_then(|e| e.command_buffer)
            .ok_or_else(|| invalid_state("end_frame", "current element has no command buffer"))?;

        context.cmd_end_render_pass(command_buffer);
        context.end_command_buffer(command_buffer)?;

        context
            .submit(&SubmitDesc {
                command_buffer,
                wait_semaphore: slot.image_available,
                wait_stage: PipelineStages::COLOR_ATTACHMENT_OUTPUT,
                signal_semaphore: slot.render_finished,
                fence: slot.in_flight,
            })
            .map_err(|e| {
                engine_error!(SOURCE, "[slot {}] end_frame: submit failed: {}", frame, e);
                e
            })?;

        match context.present(handle, image_index, slot.render_finished)? {
            PresentResult::Presented { suboptimal: false } => {}
            PresentResult::Presented { suboptimal: true } => {
                engine_debug!(SOURCE, "[slot {}] end_frame: image {} presented suboptimal", frame, image_index);
            }
            PresentResult::OutOfDate => {
                engine_warn!(SOURCE, "[slot {}] end_frame: swapchain out of date on present, recreating", frame);
                self.handle_out_of_date_swapchain()?;
            }
        }
        Ok(())
    }

    // ===== RECREATION =====

    /// Request swapchain recreation at the start of the next frame
    pub fn notify_resized(&mut self) {
        engine_trace!(SOURCE, "Resize notified");
        self.resize_pending = true;
    }

    pub fn is_resize_pending(&self) -> bool {
        self.resize_pending
    }

    /// Recreate the swapchain, render pass, framebuffers and command buffers at `new_size`
    ///
    /// The surface and frame synchronization are left untouched. A zero-area
    /// size leaves the swapchain torn down until a non-zero size arrives.
    pub fn handle_resize(&mut self, new_size: UVec2) -> Result<()> {
        if self.surface.is_none() {
            return Err(invalid_state("handle_resize", "no surface bound"));
        }
        if self.recording {
            return Err(invalid_state("handle_resize", "a frame is recording"));
        }
        let _task = ScopedTask::begin(
            SOURCE,
            format!("Swapchain recreation at {}x{}", new_size.x, new_size.y),
        );

        self.context.wait_idle()?;
        self.destroy_swapchain_resources();
        self.state = SurfaceState::SurfaceBound;

        if !has_area(new_size) {
            engine_info!(SOURCE, "Window has no drawable area, swapchain torn down until restored");
            return Ok(());
        }

        if let Err(e) = self.rebuild_swapchain_resources(new_size) {
            engine_error!(SOURCE, "handle_resize: recreation failed, retrying next frame: {}", e);
            self.destroy_swapchain_resources();
            return Err(e);
        }

        if self.sync.is_some() {
            self.state = SurfaceState::Ready;
        }
        Ok(())
    }

    fn rebuild_swapchain_resources(&mut self, size: UVec2) -> Result<()> {
        self.build_swapchain(size)?;
        self.create_render_pass()?;
        self.create_frame_buffers()?;
        self.create_command_buffers()
    }

    /// Recreate the swapchain at the window's current pixel size
    pub fn handle_out_of_date_swapchain(&mut self) -> Result<()> {
        let size = self.window.pixel_size();
        self.handle_resize(size)
    }

    /// Framebuffers and views, command buffers, render pass, then swapchain
    fn destroy_swapchain_resources(&mut self) {
        let swapchain = self.swapchain.take();
        if let Some(swapchain) = &swapchain {
            for element in &swapchain.elements {
                if let Some(framebuffer) = element.framebuffer {
                    self.context.destroy_framebuffer(framebuffer);
                }
                self.context.destroy_image_view(element.image_view);
            }
            let command_buffers = swapchain.command_buffers();
            if !command_buffers.is_empty() {
                self.context.free_command_buffers(&command_buffers);
            }
        }
        if let Some(render_pass) = self.render_pass.take() {
            self.context.destroy_render_pass(render_pass);
        }
        if let Some(swapchain) = swapchain {
            self.context.destroy_swapchain(swapchain.handle);
        }
    }

    // ===== TEARDOWN =====

    /// Release everything in reverse creation order
    ///
    /// Sync, framebuffers, render pass, swapchain, surface. Safe to call more
    /// than once; `Drop` calls it too.
    pub fn clean_up(&mut self) {
        if self.state == SurfaceState::Destroyed {
            return;
        }
        let _task = ScopedTask::begin(SOURCE, "Window surface teardown");

        if self.surface.is_some() {
            if let Err(e) = self.context.wait_idle() {
                engine_warn!(SOURCE, "clean_up: wait_idle failed: {}", e);
            }
        }
        if let Some(sync) = self.sync.take() {
            sync.destroy(self.context);
        }
        self.destroy_swapchain_resources();
        if let Some(surface) = self.surface.take() {
            self.context.destroy_surface(surface);
        }

        self.recording = false;
        self.resize_pending = false;
        self.state = SurfaceState::Destroyed;
    }

    // ===== ACCESSORS =====

    pub fn context(&self) -> &'a C {
        self.context
    }

    pub fn window(&self) -> &'a C::Window {
        self.window
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn surface(&self) -> Option<C::Surface> {
        self.surface
    }

    pub fn swapchain(&self) -> Option<&Swapchain<C>> {
        self.swapchain.as_ref()
    }

    pub fn render_pass(&self) -> Option<C::RenderPass> {
        self.render_pass
    }

    /// Framebuffers in swapchain image order (empty while torn down)
    pub fn framebuffers(&self) -> Vec<C::Framebuffer> {
        self.swapchain
            .as_ref()
            .map(|swapchain| swapchain.framebuffers())
            .unwrap_or_default()
    }

    /// Command buffer of the acquired image while a frame is recording
    pub fn current_command_buffer(&self) -> Option<C::CommandBuffer> {
        if !self.recording {
            return None;
        }
        self.swapchain
            .as_ref()
            .and_then(|swapchain| swapchain.current_element())
            .and_then(|element| element.command_buffer)
    }

    /// Index of the frame slot in use
    pub fn current_frame(&self) -> usize {
        self.sync.as_ref().map_or(0, |sync| sync.current_frame())
    }

    /// Number of frame slots (0 before synchronization is initialized)
    pub fn frame_slot_count(&self) -> usize {
        self.sync.as_ref().map_or(0, |sync| sync.slot_count())
    }

    pub fn frame_synchronization(&self) -> Option<&FrameSynchronization<C>> {
        self.sync.as_ref()
    }

    pub fn extent(&self) -> Option<UVec2> {
        self.swapchain.as_ref().map(|swapchain| swapchain.extent)
    }

    pub fn is_recording(&self) -> bool {
        self.recording
    }
}

impl<'a, C: GraphicsContext> Drop for WindowSurface<'a, C> {
    fn drop(&mut self) {
        self.clean_up();
    }
}

#[cfg(test)]
#[path = "window_surface_tests.rs"]
mod tests;
