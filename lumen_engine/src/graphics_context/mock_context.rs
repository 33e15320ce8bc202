/// Mock GraphicsContext for unit tests (no GPU required)
///
/// Every call is recorded as a string, created handles are tracked until
/// destroyed, fences keep a signaled flag, and stale swapchain results can be
/// injected on acquire and present. Handle misuse (double destroy, waiting on
/// a fence nothing will ever signal) panics so that tests fail loudly.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use glam::UVec2;

use crate::error::{Error, Result};
use crate::graphics_context::{
    GraphicsContext, DrawCommands, SurfaceWindow,
    SurfaceFormat, SurfaceSupport, SurfaceCapabilities, SurfaceTransform,
    SwapchainDesc, QueueFamilyIndices, TextureFormat, ColorSpace, PresentMode,
    RenderPassDesc, RenderPassBegin, SubmitDesc, AcquireResult, PresentResult,
    IndexType,
};

// ============================================================================
// Mock handles and window
// ============================================================================

/// Opaque handle handed out by the mock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MockHandle(pub u64);

/// Window with a settable pixel size
pub struct MockWindow {
    size: Cell<UVec2>,
}

impl MockWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self { size: Cell::new(UVec2::new(width, height)) }
    }

    pub fn set_size(&self, width: u32, height: u32) {
        self.size.set(UVec2::new(width, height));
    }
}

impl SurfaceWindow for MockWindow {
    fn pixel_size(&self) -> UVec2 {
        self.size.get()
    }
}

// ============================================================================
// Mock context
// ============================================================================

pub struct MockContext {
    calls: RefCell<Vec<String>>,
    next_handle: Cell<u64>,
    live: RefCell<HashMap<MockHandle, &'static str>>,
    fences: RefCell<HashMap<MockHandle, bool>>,
    swapchain_images: RefCell<HashMap<MockHandle, Vec<MockHandle>>>,
    acquire_cursor: Cell<u32>,

    support: RefCell<SurfaceSupport>,
    queue_families: Cell<QueueFamilyIndices>,
    device_alive: Cell<bool>,
    reject_surface: Cell<bool>,
    out_of_date_acquires: Cell<u32>,
    out_of_date_presents: Cell<u32>,
    suboptimal_presents: Cell<u32>,
    device_lost_on_submit: Cell<bool>,
    failures: RefCell<HashMap<&'static str, Error>>,

    last_swapchain_desc: RefCell<Option<SwapchainDesc<MockHandle>>>,
    last_render_pass_desc: RefCell<Option<RenderPassDesc>>,
    last_render_pass_begin: RefCell<Option<RenderPassBegin<MockHandle, MockHandle>>>,
    submits: RefCell<Vec<SubmitDesc<MockHandle, MockHandle, MockHandle>>>,
    presents: RefCell<Vec<(MockHandle, u32, MockHandle)>>,
}

impl MockContext {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
            next_handle: Cell::new(1),
            live: RefCell::new(HashMap::new()),
            fences: RefCell::new(HashMap::new()),
            swapchain_images: RefCell::new(HashMap::new()),
            acquire_cursor: Cell::new(0),
            support: RefCell::new(Self::default_support()),
            queue_families: Cell::new(QueueFamilyIndices {
                graphics: Some(0),
                present: Some(0),
            }),
            device_alive: Cell::new(true),
            reject_surface: Cell::new(false),
            out_of_date_acquires: Cell::new(0),
            out_of_date_presents: Cell::new(0),
            suboptimal_presents: Cell::new(0),
            device_lost_on_submit: Cell::new(false),
            failures: RefCell::new(HashMap::new()),
            last_swapchain_desc: RefCell::new(None),
            last_render_pass_desc: RefCell::new(None),
            last_render_pass_begin: RefCell::new(None),
            submits: RefCell::new(Vec::new()),
            presents: RefCell::new(Vec::new()),
        }
    }

    /// Variable-extent surface, 2..=3 images, FIFO + MAILBOX, preferred format second
    pub fn default_support() -> SurfaceSupport {
        SurfaceSupport {
            capabilities: SurfaceCapabilities {
                min_image_count: 2,
                max_image_count: 3,
                current_extent: UVec2::new(u32::MAX, u32::MAX),
                min_image_extent: UVec2::new(1, 1),
                max_image_extent: UVec2::new(4096, 4096),
                current_transform: SurfaceTransform::IDENTITY,
            },
            formats: vec![
                SurfaceFormat::new(TextureFormat::R8G8B8A8_SRGB, ColorSpace::SrgbNonlinear),
                SurfaceFormat::new(TextureFormat::B8G8R8A8_UNORM, ColorSpace::SrgbNonlinear),
            ],
            present_modes: vec![PresentMode::Fifo, PresentMode::Mailbox],
        }
    }

    // ===== CONFIGURATION =====

    pub fn set_support(&self, support: SurfaceSupport) {
        *self.support.borrow_mut() = support;
    }

    pub fn set_queue_families(&self, indices: QueueFamilyIndices) {
        self.queue_families.set(indices);
    }

    pub fn set_device_alive(&self, alive: bool) {
        self.device_alive.set(alive);
    }

    pub fn reject_surface_creation(&self) {
        self.reject_surface.set(true);
    }

    /// The next `count` acquisitions report the swapchain out of date
    pub fn inject_out_of_date_acquires(&self, count: u32) {
        self.out_of_date_acquires.set(count);
    }

    /// The next `count` presentations report the swapchain out of date
    pub fn inject_out_of_date_presents(&self, count: u32) {
        self.out_of_date_presents.set(count);
    }

    /// The next `count` presentations succeed but report suboptimal
    pub fn inject_suboptimal_presents(&self, count: u32) {
        self.suboptimal_presents.set(count);
    }

    pub fn set_device_lost_on_submit(&self, lost: bool) {
        self.device_lost_on_submit.set(lost);
    }

    /// The next call to `operation` fails with `error`
    ///
    /// Honored by `create_render_pass`, `create_framebuffer`,
    /// `allocate_command_buffers` and `begin_command_buffer`.
    pub fn fail_next(&self, operation: &'static str, error: Error) {
        self.failures.borrow_mut().insert(operation, error);
    }

    fn injected_failure(&self, operation: &'static str) -> Result<()> {
        match self.failures.borrow_mut().remove(operation) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    // ===== INSPECTION =====

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.borrow_mut().clear();
    }

    /// Number of recorded calls whose name (text before any '(') is `name`
    pub fn count_calls(&self, name: &str) -> usize {
        self.calls.borrow().iter().filter(|c| call_name(c) == name).count()
    }

    /// Index of the first recorded call named `name`
    pub fn first_call(&self, name: &str) -> Option<usize> {
        self.calls.borrow().iter().position(|c| call_name(c) == name)
    }

    /// Index of the last recorded call named `name`
    pub fn last_call(&self, name: &str) -> Option<usize> {
        self.calls.borrow().iter().rposition(|c| call_name(c) == name)
    }

    /// Number of live handles of a kind ("surface", "fence", ...)
    pub fn live_count(&self, kind: &str) -> usize {
        self.live.borrow().values().filter(|k| **k == kind).count()
    }

    pub fn is_live(&self, handle: MockHandle) -> bool {
        self.live.borrow().contains_key(&handle)
    }

    pub fn fence_signaled(&self, fence: MockHandle) -> bool {
        self.fences.borrow().get(&fence).copied().unwrap_or(false)
    }

    pub fn last_swapchain_desc(&self) -> Option<SwapchainDesc<MockHandle>> {
        *self.last_swapchain_desc.borrow()
    }

    pub fn last_render_pass_desc(&self) -> Option<RenderPassDesc> {
        *self.last_render_pass_desc.borrow()
    }

    pub fn last_render_pass_begin(&self) -> Option<RenderPassBegin<MockHandle, MockHandle>> {
        *self.last_render_pass_begin.borrow()
    }

    pub fn submits(&self) -> Vec<SubmitDesc<MockHandle, MockHandle, MockHandle>> {
        self.submits.borrow().clone()
    }

    pub fn presents(&self) -> Vec<(MockHandle, u32, MockHandle)> {
        self.presents.borrow().clone()
    }

    // ===== INTERNALS =====

    fn record(&self, call: impl Into<String>) {
        self.calls.borrow_mut().push(call.into());
    }

    fn create(&self, kind: &'static str) -> MockHandle {
        let handle = MockHandle(self.next_handle.get());
        self.next_handle.set(handle.0 + 1);
        self.live.borrow_mut().insert(handle, kind);
        handle
    }

    fn destroy(&self, kind: &'static str, handle: MockHandle) {
        let removed = self.live.borrow_mut().remove(&handle);
        assert_eq!(removed, Some(kind), "destroying {} {:?} that is not live", kind, handle);
    }

    fn assert_live(&self, kind: &'static str, handle: MockHandle) {
        assert_eq!(
            self.live.borrow().get(&handle).copied(),
            Some(kind),
            "{} {:?} used while not live",
            kind,
            handle
        );
    }
}

fn call_name(call: &str) -> &str {
    call.split('(').next().unwrap_or(call)
}

// ============================================================================
// GraphicsContext
// ============================================================================

impl GraphicsContext for MockContext {
    type Window = MockWindow;
    type Surface = MockHandle;
    type Swapchain = MockHandle;
    type Image = MockHandle;
    type ImageView = MockHandle;
    type RenderPass = MockHandle;
    type Framebuffer = MockHandle;
    type CommandBuffer = MockHandle;
    type Semaphore = MockHandle;
    type Fence = MockHandle;

    fn is_device_alive(&self) -> bool {
        self.device_alive.get()
    }

    fn queue_family_indices(&self) -> QueueFamilyIndices {
        self.queue_families.get()
    }

    fn wait_idle(&self) -> Result<()> {
        self.record("wait_idle");
        Ok(())
    }

    fn create_surface(&self, _window: &MockWindow) -> Result<MockHandle> {
        self.record("create_surface");
        if self.reject_surface.get() {
            return Err(Error::BackendError("ERROR_NATIVE_WINDOW_IN_USE_KHR".to_string()));
        }
        Ok(self.create("surface"))
    }

    fn destroy_surface(&self, surface: MockHandle) {
        self.record("destroy_surface");
        self.destroy("surface", surface);
    }

    fn query_surface_support(&self, surface: MockHandle) -> Result<SurfaceSupport> {
        self.record("query_surface_support");
        self.assert_live("surface", surface);
        Ok(self.support.borrow().clone())
    }

    fn create_swapchain(&self, desc: &SwapchainDesc<MockHandle>) -> Result<MockHandle> {
        self.record("create_swapchain");
        self.assert_live("surface", desc.surface);
        *self.last_swapchain_desc.borrow_mut() = Some(*desc);
        let swapchain = self.create("swapchain");
        let images = (0..desc.min_image_count)
            .map(|_| {
                let handle = MockHandle(self.next_handle.get());
                self.next_handle.set(handle.0 + 1);
                handle
            })
            .collect();
        self.swapchain_images.borrow_mut().insert(swapchain, images);
        Ok(swapchain)
    }

    fn destroy_swapchain(&self, swapchain: MockHandle) {
        self.record("destroy_swapchain");
        self.destroy("swapchain", swapchain);
        self.swapchain_images.borrow_mut().remove(&swapchain);
    }

    fn swapchain_images(&self, swapchain: MockHandle) -> Result<Vec<MockHandle>> {
        self.record("swapchain_images");
        self.swapchain_images
            .borrow()
            .get(&swapchain)
            .cloned()
            .ok_or_else(|| Error::InvalidResource(format!("unknown swapchain {:?}", swapchain)))
    }

    fn create_image_view(&self, _image: MockHandle, _format: SurfaceFormat) -> Result<MockHandle> {
        self.record("create_image_view");
        Ok(self.create("image_view"))
    }

    fn destroy_image_view(&self, view: MockHandle) {
        self.record("destroy_image_view");
        self.destroy("image_view", view);
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<MockHandle> {
        self.record("create_render_pass");
        self.injected_failure("create_render_pass")?;
        *self.last_render_pass_desc.borrow_mut() = Some(*desc);
        Ok(self.create("render_pass"))
    }

    fn destroy_render_pass(&self, render_pass: MockHandle) {
        self.record("destroy_render_pass");
        self.destroy("render_pass", render_pass);
    }

    fn create_framebuffer(
        &self,
        render_pass: MockHandle,
        view: MockHandle,
        extent: UVec2,
    ) -> Result<MockHandle> {
        self.record(format!("create_framebuffer({}x{})", extent.x, extent.y));
        self.injected_failure("create_framebuffer")?;
        self.assert_live("render_pass", render_pass);
        self.assert_live("image_view", view);
        Ok(self.create("framebuffer"))
    }

    fn destroy_framebuffer(&self, framebuffer: MockHandle) {
        self.record("destroy_framebuffer");
        self.destroy("framebuffer", framebuffer);
    }

    fn allocate_command_buffers(&self, count: u32) -> Result<Vec<MockHandle>> {
        self.record(format!("allocate_command_buffers({})", count));
        self.injected_failure("allocate_command_buffers")?;
        Ok((0..count).map(|_| self.create("command_buffer")).collect())
    }

    fn free_command_buffers(&self, command_buffers: &[MockHandle]) {
        self.record(format!("free_command_buffers({})", command_buffers.len()));
        for &command_buffer in command_buffers {
            self.destroy("command_buffer", command_buffer);
        }
    }

    fn begin_command_buffer(&self, command_buffer: MockHandle) -> Result<()> {
        self.record("begin_command_buffer");
        self.assert_live("command_buffer", command_buffer);
        self.injected_failure("begin_command_buffer")?;
        Ok(())
    }

    fn end_command_buffer(&self, command_buffer: MockHandle) -> Result<()> {
        self.record("end_command_buffer");
        self.assert_live("command_buffer", command_buffer);
        Ok(())
    }

    fn cmd_begin_render_pass(
        &self,
        command_buffer: MockHandle,
        begin: &RenderPassBegin<MockHandle, MockHandle>,
    ) {
        self.record("begin_render_pass");
        self.assert_live("command_buffer", command_buffer);
        self.assert_live("render_pass", begin.render_pass);
        self.assert_live("framebuffer", begin.framebuffer);
        *self.last_render_pass_begin.borrow_mut() = Some(*begin);
    }

    fn cmd_end_render_pass(&self, _command_buffer: MockHandle) {
        self.record("end_render_pass");
    }

    fn create_semaphore(&self) -> Result<MockHandle> {
        self.record("create_semaphore");
        Ok(self.create("semaphore"))
    }

    fn destroy_semaphore(&self, semaphore: MockHandle) {
        self.record("destroy_semaphore");
        self.destroy("semaphore", semaphore);
    }

    fn create_fence(&self, signaled: bool) -> Result<MockHandle> {
        self.record(if signaled { "create_fence(signaled)" } else { "create_fence(unsignaled)" });
        let fence = self.create("fence");
        self.fences.borrow_mut().insert(fence, signaled);
        Ok(fence)
    }

    fn destroy_fence(&self, fence: MockHandle) {
        self.record("destroy_fence");
        self.destroy("fence", fence);
        self.fences.borrow_mut().remove(&fence);
    }

    fn wait_for_fence(&self, fence: MockHandle, _timeout: u64) -> Result<()> {
        self.record("wait_for_fence");
        self.assert_live("fence", fence);
        assert!(
            self.fence_signaled(fence),
            "waiting on unsignaled fence {:?} with no pending submit would block forever",
            fence
        );
        Ok(())
    }

    fn reset_fence(&self, fence: MockHandle) -> Result<()> {
        self.record("reset_fence");
        self.assert_live("fence", fence);
        self.fences.borrow_mut().insert(fence, false);
        Ok(())
    }

    fn acquire_next_image(
        &self,
        swapchain: MockHandle,
        _timeout: u64,
        signal: MockHandle,
    ) -> Result<AcquireResult> {
        self.record("acquire_next_image");
        self.assert_live("swapchain", swapchain);
        self.assert_live("semaphore", signal);

        let pending = self.out_of_date_acquires.get();
        if pending > 0 {
            self.out_of_date_acquires.set(pending - 1);
            return Ok(AcquireResult::OutOfDate);
        }

        let count = self
            .swapchain_images
            .borrow()
            .get(&swapchain)
            .map(|images| images.len() as u32)
            .unwrap_or(1)
            .max(1);
        let cursor = self.acquire_cursor.get();
        self.acquire_cursor.set(cursor + 1);
        Ok(AcquireResult::Acquired { image_index: cursor % count, suboptimal: false })
    }

    fn submit(&self, desc: &SubmitDesc<MockHandle, MockHandle, MockHandle>) -> Result<()> {
        self.record("submit");
        if self.device_lost_on_submit.get() {
            return Err(Error::DeviceLost);
        }
        self.assert_live("command_buffer", desc.command_buffer);
        self.assert_live("fence", desc.fence);
        self.submits.borrow_mut().push(*desc);
        // The mock GPU finishes instantly
        self.fences.borrow_mut().insert(desc.fence, true);
        Ok(())
    }

    fn present(
        &self,
        swapchain: MockHandle,
        image_index: u32,
        wait: MockHandle,
    ) -> Result<PresentResult> {
        self.record("present");
        self.assert_live("swapchain", swapchain);
        self.presents.borrow_mut().push((swapchain, image_index, wait));

        let stale = self.out_of_date_presents.get();
        if stale > 0 {
            self.out_of_date_presents.set(stale - 1);
            return Ok(PresentResult::OutOfDate);
        }
        let suboptimal = self.suboptimal_presents.get();
        if suboptimal > 0 {
            self.suboptimal_presents.set(suboptimal - 1);
            return Ok(PresentResult::Presented { suboptimal: true });
        }
        Ok(PresentResult::Presented { suboptimal: false })
    }
}

// ============================================================================
// DrawCommands
// ============================================================================

impl DrawCommands for MockContext {
    type Buffer = MockHandle;
    type Pipeline = MockHandle;
    type PipelineLayout = MockHandle;
    type DescriptorSet = MockHandle;

    fn cmd_bind_pipeline(&self, _command_buffer: MockHandle, pipeline: MockHandle) {
        self.record(format!("bind_pipeline({})", pipeline.0));
    }

    fn cmd_bind_vertex_buffer(
        &self,
        _command_buffer: MockHandle,
        binding: u32,
        buffer: MockHandle,
        offset: u64,
    ) {
        self.record(format!("bind_vertex_buffer({}, {}, {})", binding, buffer.0, offset));
    }

    fn cmd_bind_index_buffer(
        &self,
        _command_buffer: MockHandle,
        buffer: MockHandle,
        offset: u64,
        index_type: IndexType,
    ) {
        self.record(format!("bind_index_buffer({}, {}, {:?})", buffer.0, offset, index_type));
    }

    fn cmd_bind_descriptor_set(
        &self,
        _command_buffer: MockHandle,
        layout: MockHandle,
        set_index: u32,
        descriptor_set: MockHandle,
    ) {
        self.record(format!("bind_descriptor_set({}, {}, {})", layout.0, set_index, descriptor_set.0));
    }

    fn cmd_draw_indexed(
        &self,
        _command_buffer: MockHandle,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        self.record(format!(
            "draw_indexed({}, {}, {}, {}, {})",
            index_count, instance_count, first_index, vertex_offset, first_instance
        ));
    }
}

#[cfg(test)]
#[path = "mock_context_tests.rs"]
mod tests;
