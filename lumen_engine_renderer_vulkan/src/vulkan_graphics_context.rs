/// GraphicsContext implementation for VulkanContext

use ash::vk;
use std::sync::atomic::Ordering;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::window::Window;
use glam::UVec2;
use lumen_engine::lumen::{Error, Result};
use lumen_engine::lumen::context::{
    GraphicsContext, SurfaceFormat, SurfaceSupport, SwapchainDesc, QueueFamilyIndices,
    RenderPassDesc, RenderPassBegin, SubmitDesc, AcquireResult, PresentResult,
};
use lumen_engine::{engine_error, engine_trace};

use crate::vulkan_context::{VulkanContext, SOURCE};
use crate::vulkan_format::*;

impl GraphicsContext for VulkanContext {
    type Window = Window;
    type Surface = vk::SurfaceKHR;
    type Swapchain = vk::SwapchainKHR;
    type Image = vk::Image;
    type ImageView = vk::ImageView;
    type RenderPass = vk::RenderPass;
    type Framebuffer = vk::Framebuffer;
    type CommandBuffer = vk::CommandBuffer;
    type Semaphore = vk::Semaphore;
    type Fence = vk::Fence;

    // ===== DEVICE =====

    fn is_device_alive(&self) -> bool {
        !self.device_lost.load(Ordering::Acquire)
    }

    fn queue_family_indices(&self) -> QueueFamilyIndices {
        self.queue_families
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe { self.device.device_wait_idle() }
            .map_err(|e| self.vk_error("vkDeviceWaitIdle", e))
    }

    // ===== SURFACE =====

    fn create_surface(&self, window: &Window) -> Result<vk::SurfaceKHR> {
        let display_handle = window.display_handle().map_err(|e| {
            engine_error!(SOURCE, "Failed to get display handle: {}", e);
            Error::InitializationFailed(format!("Failed to get display handle: {}", e))
        })?;
        let window_handle = window.window_handle().map_err(|e| {
            engine_error!(SOURCE, "Failed to get window handle: {}", e);
            Error::InitializationFailed(format!("Failed to get window handle: {}", e))
        })?;

        unsafe {
            let surface = ash_window::create_surface(
                &self.entry,
                &self.instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| {
                engine_error!(SOURCE, "Failed to create surface: {:?}", e);
                Error::InitializationFailed(format!("Failed to create surface: {:?}", e))
            })?;

            // The device was chosen against another window; check this one too
            let present_family = self.queue_families.present.unwrap_or(0);
            let supported = self
                .surface_loader
                .get_physical_device_surface_support(self.physical_device, present_family, surface)
                .unwrap_or(false);
            if !supported {
                self.surface_loader.destroy_surface(surface, None);
                engine_error!(SOURCE, "Present family {} cannot present to the window surface", present_family);
                return Err(Error::InitializationFailed(
                    "window surface not supported by the present queue family".to_string(),
                ));
            }
            Ok(surface)
        }
    }

    fn destroy_surface(&self, surface: vk::SurfaceKHR) {
        unsafe { self.surface_loader.destroy_surface(surface, None) };
    }

    fn query_surface_support(&self, surface: vk::SurfaceKHR) -> Result<SurfaceSupport> {
        unsafe {
            let capabilities = self
                .surface_loader
                .get_physical_device_surface_capabilities(self.physical_device, surface)
                .map_err(|e| self.vk_error("vkGetPhysicalDeviceSurfaceCapabilitiesKHR", e))?;
            let formats = self
                .surface_loader
                .get_physical_device_surface_formats(self.physical_device, surface)
                .map_err(|e| self.vk_error("vkGetPhysicalDeviceSurfaceFormatsKHR", e))?;
            let present_modes = self
                .surface_loader
                .get_physical_device_surface_present_modes(self.physical_device, surface)
                .map_err(|e| self.vk_error("vkGetPhysicalDeviceSurfacePresentModesKHR", e))?;

            Ok(SurfaceSupport {
                capabilities: capabilities_from_vk(&capabilities),
                formats: formats.iter().map(surface_format_from_vk).collect(),
                present_modes: present_modes.into_iter().filter_map(present_mode_from_vk).collect(),
            })
        }
    }

    // ===== SWAPCHAIN =====

    fn create_swapchain(&self, desc: &SwapchainDesc<vk::SurfaceKHR>) -> Result<vk::SwapchainKHR> {
        let (sharing_mode, queue_families) = sharing_mode_to_vk(&desc.sharing_mode);
        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(desc.surface)
            .min_image_count(desc.min_image_count)
            .image_format(format_to_vk(desc.format.format))
            .image_color_space(color_space_to_vk(desc.format.color_space))
            .image_extent(extent_to_vk(desc.extent))
            .image_array_layers(1)
            .image_usage(image_usage_to_vk(desc.usage))
            .image_sharing_mode(sharing_mode)
            .queue_family_indices(queue_families)
            .pre_transform(transform_to_vk(desc.pre_transform))
            .composite_alpha(composite_alpha_to_vk(desc.composite_alpha))
            .present_mode(present_mode_to_vk(desc.present_mode))
            .clipped(desc.clipped);

        unsafe { self.swapchain_loader.create_swapchain(&create_info, None) }
            .map_err(|e| self.vk_error("vkCreateSwapchainKHR", e))
    }

    fn destroy_swapchain(&self, swapchain: vk::SwapchainKHR) {
        unsafe { self.swapchain_loader.destroy_swapchain(swapchain, None) };
    }

    fn swapchain_images(&self, swapchain: vk::SwapchainKHR) -> Result<Vec<vk::Image>> {
        unsafe { self.swapchain_loader.get_swapchain_images(swapchain) }
            .map_err(|e| self.vk_error("vkGetSwapchainImagesKHR", e))
    }

    fn create_image_view(&self, image: vk::Image, format: SurfaceFormat) -> Result<vk::ImageView> {
        let create_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format_to_vk(format.format))
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            })
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: vk::ImageAspectFlags::COLOR,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });

        unsafe { self.device.create_image_view(&create_info, None) }
            .map_err(|e| self.vk_error("vkCreateImageView", e))
    }

    fn destroy_image_view(&self, view: vk::ImageView) {
        unsafe { self.device.destroy_image_view(view, None) };
    }

    // ===== RENDER PASS / FRAMEBUFFER =====

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<vk::RenderPass> {
        let color = &desc.color_attachment;
        let attachments = [vk::AttachmentDescription::default()
            .format(format_to_vk(color.format))
            .samples(vk::SampleCountFlags::TYPE_1)
            .load_op(load_op_to_vk(color.load_op))
            .store_op(store_op_to_vk(color.store_op))
            .stencil_load_op(load_op_to_vk(color.stencil_load_op))
            .stencil_store_op(store_op_to_vk(color.stencil_store_op))
            .initial_layout(image_layout_to_vk(color.initial_layout))
            .final_layout(image_layout_to_vk(color.final_layout))];

        let color_refs = [vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        }];
        let subpasses = [vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs)];

        let dependency = &desc.dependency;
        let dependencies = [vk::SubpassDependency::default()
            .src_subpass(subpass_to_vk(dependency.src_subpass))
            .dst_subpass(dependency.dst_subpass)
            .src_stage_mask(pipeline_stages_to_vk(dependency.src_stage))
            .dst_stage_mask(pipeline_stages_to_vk(dependency.dst_stage))
            .src_access_mask(access_flags_to_vk(dependency.src_access))
            .dst_access_mask(access_flags_to_vk(dependency.dst_access))];

        let create_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        unsafe { self.device.create_render_pass(&create_info, None) }
            .map_err(|e| self.vk_error("vkCreateRenderPass", e))
    }

    fn destroy_render_pass(&self, render_pass: vk::RenderPass) {
        unsafe { self.device.destroy_render_pass(render_pass, None) };
    }

    fn create_framebuffer(
        &self,
        render_pass: vk::RenderPass,
        view: vk::ImageView,
        extent: UVec2,
    ) -> Result<vk::Framebuffer> {
        let attachments = [view];
        let create_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass)
            .attachments(&attachments)
            .width(extent.x)
            .height(extent.y)
            .layers(1);

        unsafe { self.device.create_framebuffer(&create_info, None) }
            .map_err(|e| self.vk_error("vkCreateFramebuffer", e))
    }

    fn destroy_framebuffer(&self, framebuffer: vk::Framebuffer) {
        unsafe { self.device.destroy_framebuffer(framebuffer, None) };
    }

    // ===== COMMAND BUFFERS =====

    fn allocate_command_buffers(&self, count: u32) -> Result<Vec<vk::CommandBuffer>> {
        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(self.command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(count);

        unsafe { self.device.allocate_command_buffers(&allocate_info) }
            .map_err(|e| self.vk_error("vkAllocateCommandBuffers", e))
    }

    fn free_command_buffers(&self, command_buffers: &[vk::CommandBuffer]) {
        if command_buffers.is_empty() {
            return;
        }
        unsafe { self.device.free_command_buffers(self.command_pool, command_buffers) };
    }

    fn begin_command_buffer(&self, command_buffer: vk::CommandBuffer) -> Result<()> {
        unsafe {
            self.device
                .reset_command_buffer(command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| self.vk_error("vkResetCommandBuffer", e))?;
            self.device
                .begin_command_buffer(command_buffer, &vk::CommandBufferBeginInfo::default())
                .map_err(|e| self.vk_error("vkBeginCommandBuffer", e))
        }
    }

    fn end_command_buffer(&self, command_buffer: vk::CommandBuffer) -> Result<()> {
        unsafe { self.device.end_command_buffer(command_buffer) }
            .map_err(|e| self.vk_error("vkEndCommandBuffer", e))
    }

    fn cmd_begin_render_pass(
        &self,
        command_buffer: vk::CommandBuffer,
        begin: &RenderPassBegin<vk::RenderPass, vk::Framebuffer>,
    ) {
        let render_area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: extent_to_vk(begin.extent),
        };
        let clear_values = [vk::ClearValue {
            color: vk::ClearColorValue { float32: begin.clear_color },
        }];
        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(begin.render_pass)
            .framebuffer(begin.framebuffer)
            .render_area(render_area)
            .clear_values(&clear_values);

        let viewport = vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: begin.extent.x as f32,
            height: begin.extent.y as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };

        unsafe {
            self.device.cmd_begin_render_pass(command_buffer, &begin_info, vk::SubpassContents::INLINE);
            self.device.cmd_set_viewport(command_buffer, 0, &[viewport]);
            self.device.cmd_set_scissor(command_buffer, 0, &[render_area]);
        }
    }

    fn cmd_end_render_pass(&self, command_buffer: vk::CommandBuffer) {
        unsafe { self.device.cmd_end_render_pass(command_buffer) };
    }

    // ===== SYNCHRONIZATION =====

    fn create_semaphore(&self) -> Result<vk::Semaphore> {
        unsafe { self.device.create_semaphore(&vk::SemaphoreCreateInfo::default(), None) }
            .map_err(|e| self.vk_error("vkCreateSemaphore", e))
    }

    fn destroy_semaphore(&self, semaphore: vk::Semaphore) {
        unsafe { self.device.destroy_semaphore(semaphore, None) };
    }

    fn create_fence(&self, signaled: bool) -> Result<vk::Fence> {
        let flags = if signaled {
            vk::FenceCreateFlags::SIGNALED
        } else {
            vk::FenceCreateFlags::empty()
        };
        unsafe { self.device.create_fence(&vk::FenceCreateInfo::default().flags(flags), None) }
            .map_err(|e| self.vk_error("vkCreateFence", e))
    }

    fn destroy_fence(&self, fence: vk::Fence) {
        unsafe { self.device.destroy_fence(fence, None) };
    }

    fn wait_for_fence(&self, fence: vk::Fence, timeout: u64) -> Result<()> {
        unsafe { self.device.wait_for_fences(&[fence], true, timeout) }
            .map_err(|e| self.vk_error("vkWaitForFences", e))
    }

    fn reset_fence(&self, fence: vk::Fence) -> Result<()> {
        unsafe { self.device.reset_fences(&[fence]) }
            .map_err(|e| self.vk_error("vkResetFences", e))
    }

    // ===== PRESENTATION =====

    fn acquire_next_image(
        &self,
        swapchain: vk::SwapchainKHR,
        timeout: u64,
        signal: vk::Semaphore,
    ) -> Result<AcquireResult> {
        let acquired = unsafe {
            self.swapchain_loader
                .acquire_next_image(swapchain, timeout, signal, vk::Fence::null())
        };
        match acquired {
            Ok((image_index, suboptimal)) => Ok(AcquireResult::Acquired { image_index, suboptimal }),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                engine_trace!(SOURCE, "vkAcquireNextImageKHR: swapchain out of date");
                Ok(AcquireResult::OutOfDate)
            }
            Err(e) => Err(self.vk_error("vkAcquireNextImageKHR", e)),
        }
    }

    fn submit(&self, desc: &SubmitDesc<vk::CommandBuffer, vk::Semaphore, vk::Fence>) -> Result<()> {
        let wait_semaphores = [desc.wait_semaphore];
        let wait_stages = [pipeline_stages_to_vk(desc.wait_stage)];
        let command_buffers = [desc.command_buffer];
        let signal_semaphores = [desc.signal_semaphore];

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        unsafe { self.device.queue_submit(self.graphics_queue, &[submit_info], desc.fence) }
            .map_err(|e| self.vk_error("vkQueueSubmit", e))
    }

    fn present(
        &self,
        swapchain: vk::SwapchainKHR,
        image_index: u32,
        wait: vk::Semaphore,
    ) -> Result<PresentResult> {
        let wait_semaphores = [wait];
        let swapchains = [swapchain];
        let image_indices = [image_index];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        match unsafe { self.swapchain_loader.queue_present(self.present_queue, &present_info) } {
            Ok(suboptimal) => Ok(PresentResult::Presented { suboptimal }),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                engine_trace!(SOURCE, "vkQueuePresentKHR: swapchain out of date");
                Ok(PresentResult::OutOfDate)
            }
            Err(e) => Err(self.vk_error("vkQueuePresentKHR", e)),
        }
    }
}
