/// Render pass, submission and draw descriptor types

use glam::UVec2;
use bitflags::bitflags;
use crate::graphics_context::TextureFormat;

/// Attachment load operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOp {
    Load,
    Clear,
    DontCare,
}

/// Attachment store operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Store,
    DontCare,
}

/// Image layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageLayout {
    Undefined,
    ColorAttachmentOptimal,
    PresentSrc,
}

bitflags! {
    /// Pipeline stages referenced by dependencies and submit waits
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PipelineStages: u32 {
        const TOP_OF_PIPE = 1 << 0;
        const COLOR_ATTACHMENT_OUTPUT = 1 << 1;
        const BOTTOM_OF_PIPE = 1 << 2;
    }
}

bitflags! {
    /// Memory access types referenced by dependencies
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct AccessFlags: u32 {
        const COLOR_ATTACHMENT_READ = 1 << 0;
        const COLOR_ATTACHMENT_WRITE = 1 << 1;
    }
}

/// Single color attachment of a render pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorAttachmentDesc {
    pub format: TextureFormat,
    pub load_op: LoadOp,
    pub store_op: StoreOp,
    pub stencil_load_op: LoadOp,
    pub stencil_store_op: StoreOp,
    pub initial_layout: ImageLayout,
    pub final_layout: ImageLayout,
}

/// Dependency between subpasses. `src_subpass: None` is the external subpass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubpassDependency {
    pub src_subpass: Option<u32>,
    pub dst_subpass: u32,
    pub src_stage: PipelineStages,
    pub dst_stage: PipelineStages,
    pub src_access: AccessFlags,
    pub dst_access: AccessFlags,
}

/// Render pass with one color attachment and a single subpass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderPassDesc {
    pub color_attachment: ColorAttachmentDesc,
    pub dependency: SubpassDependency,
}

/// Render pass begin parameters
///
/// The render area, viewport and scissor all cover `extent`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderPassBegin<R, F> {
    pub render_pass: R,
    pub framebuffer: F,
    pub extent: UVec2,
    pub clear_color: [f32; 4],
}

/// Queue submission of one command buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitDesc<B, S, F> {
    pub command_buffer: B,
    pub wait_semaphore: S,
    pub wait_stage: PipelineStages,
    pub signal_semaphore: S,
    pub fence: F,
}

/// Index element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    /// 16-bit indices (max 65535 vertices)
    U16,
    /// 32-bit indices (max ~4 billion vertices)
    U32,
}

impl IndexType {
    /// Index type for an index element of `size` bytes
    ///
    /// Evaluated in const context, an unsupported size fails the build.
    pub const fn from_index_size(size: usize) -> Self {
        match size {
            2 => IndexType::U16,
            4 => IndexType::U32,
            _ => panic!("index elements must be 2 or 4 bytes"),
        }
    }

    /// Size in bytes of one index element
    pub const fn size_bytes(self) -> u64 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}
