/// Mesh and material resources read by the renderer
///
/// The renderer borrows these from whoever owns the renderable entities; it
/// never creates or frees the GPU objects behind them.

use std::mem::size_of;

use crate::graphics_context::{DrawCommands, IndexType};

/// Index element type of every mesh
pub type MeshIndex = u32;

/// GPU index type matching `MeshIndex`, fixed at compile time
pub const INDEX_TYPE: IndexType = IndexType::from_index_size(size_of::<MeshIndex>());

/// Sub-range of a shared GPU buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferAllocation<B> {
    pub buffer: B,
    /// Byte offset of the range in `buffer`
    pub offset: u64,
    /// Byte size of the range
    pub size: u64,
}

/// Vertex and index ranges of one mesh
pub struct MeshResources<C: DrawCommands> {
    pub vertices: BufferAllocation<C::Buffer>,
    pub indices: BufferAllocation<C::Buffer>,
}

impl<C: DrawCommands> MeshResources<C> {
    pub fn new(vertices: BufferAllocation<C::Buffer>, indices: BufferAllocation<C::Buffer>) -> Self {
        Self { vertices, indices }
    }

    /// Number of indices in the index range
    pub fn index_count(&self) -> u32 {
        (self.indices.size / INDEX_TYPE.size_bytes()) as u32
    }
}

/// Pipeline state and bindings of one material
pub struct MaterialResources<C: DrawCommands> {
    pub pipeline: C::Pipeline,
    pub pipeline_layout: C::PipelineLayout,
    pub descriptor_set: C::DescriptorSet,
}

impl<C: DrawCommands> MaterialResources<C> {
    pub fn new(
        pipeline: C::Pipeline,
        pipeline_layout: C::PipelineLayout,
        descriptor_set: C::DescriptorSet,
    ) -> Self {
        Self { pipeline, pipeline_layout, descriptor_set }
    }
}
