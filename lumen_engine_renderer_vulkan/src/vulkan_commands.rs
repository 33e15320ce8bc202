/// DrawCommands implementation for VulkanContext

use ash::vk;
use lumen_engine::lumen::context::{DrawCommands, IndexType};

use crate::vulkan_context::VulkanContext;
use crate::vulkan_format::index_type_to_vk;

impl DrawCommands for VulkanContext {
    type Buffer = vk::Buffer;
    type Pipeline = vk::Pipeline;
    type PipelineLayout = vk::PipelineLayout;
    type DescriptorSet = vk::DescriptorSet;

    fn cmd_bind_pipeline(&self, command_buffer: vk::CommandBuffer, pipeline: vk::Pipeline) {
        unsafe {
            self.device
                .cmd_bind_pipeline(command_buffer, vk::PipelineBindPoint::GRAPHICS, pipeline);
        }
    }

    fn cmd_bind_vertex_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        binding: u32,
        buffer: vk::Buffer,
        offset: u64,
    ) {
        unsafe {
            self.device
                .cmd_bind_vertex_buffers(command_buffer, binding, &[buffer], &[offset]);
        }
    }

    fn cmd_bind_index_buffer(
        &self,
        command_buffer: vk::CommandBuffer,
        buffer: vk::Buffer,
        offset: u64,
        index_type: IndexType,
    ) {
        unsafe {
            self.device
                .cmd_bind_index_buffer(command_buffer, buffer, offset, index_type_to_vk(index_type));
        }
    }

    fn cmd_bind_descriptor_set(
        &self,
        command_buffer: vk::CommandBuffer,
        layout: vk::PipelineLayout,
        set_index: u32,
        descriptor_set: vk::DescriptorSet,
    ) {
        unsafe {
            self.device.cmd_bind_descriptor_sets(
                command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                layout,
                set_index,
                &[descriptor_set],
                &[],
            );
        }
    }

    fn cmd_draw_indexed(
        &self,
        command_buffer: vk::CommandBuffer,
        index_count: u32,
        instance_count: u32,
        first_index: u32,
        vertex_offset: i32,
        first_instance: u32,
    ) {
        unsafe {
            self.device.cmd_draw_indexed(
                command_buffer,
                index_count,
                instance_count,
                first_index,
                vertex_offset,
                first_instance,
            );
        }
    }
}
