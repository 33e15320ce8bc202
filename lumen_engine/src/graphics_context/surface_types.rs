/// Surface and swapchain descriptor types

use glam::UVec2;
use bitflags::bitflags;

/// Presentable image format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    B8G8R8A8_UNORM,
    B8G8R8A8_SRGB,
    R8G8B8A8_UNORM,
    R8G8B8A8_SRGB,
    A2B10G10R10_UNORM,
    R16G16B16A16_SFLOAT,
    /// Backend format with no engine equivalent (raw backend value)
    Unknown(i32),
}

/// Color space in which the presentation engine interprets images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    SrgbNonlinear,
    ExtendedSrgbLinear,
    DisplayP3Nonlinear,
    Hdr10St2084,
    /// Backend color space with no engine equivalent (raw backend value)
    Other(i32),
}

/// Format + color space pair supported by a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceFormat {
    pub format: TextureFormat,
    pub color_space: ColorSpace,
}

impl SurfaceFormat {
    pub const fn new(format: TextureFormat, color_space: ColorSpace) -> Self {
        Self { format, color_space }
    }
}

/// Presentation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentMode {
    /// No vsync, may tear
    Immediate,
    /// Triple buffering, replaces the queued image
    Mailbox,
    /// Vsync queue, always supported
    Fifo,
    /// Vsync, tears when late
    FifoRelaxed,
}

/// Surface transform bits, passed through to swapchain creation untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SurfaceTransform(pub u32);

impl SurfaceTransform {
    pub const IDENTITY: Self = Self(1);
}

/// How the presentation engine composites alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompositeAlpha {
    Opaque,
    PreMultiplied,
    PostMultiplied,
    Inherit,
}

/// Surface capabilities reported by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceCapabilities {
    pub min_image_count: u32,
    /// 0 means no upper bound
    pub max_image_count: u32,
    /// `u32::MAX` in x means the size follows the swapchain extent
    pub current_extent: UVec2,
    pub min_image_extent: UVec2,
    pub max_image_extent: UVec2,
    pub current_transform: SurfaceTransform,
}

/// Everything a surface supports on the current device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceSupport {
    pub capabilities: SurfaceCapabilities,
    pub formats: Vec<SurfaceFormat>,
    pub present_modes: Vec<PresentMode>,
}

/// Queue family indices of the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueFamilyIndices {
    pub graphics: Option<u32>,
    pub present: Option<u32>,
}

impl QueueFamilyIndices {
    pub fn is_complete(&self) -> bool {
        self.graphics.is_some() && self.present.is_some()
    }
}

/// Image sharing between queue families
///
/// The concurrent family list is an owned fixed-size array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SharingMode {
    Exclusive,
    Concurrent([u32; 2]),
}

bitflags! {
    /// Usage of swapchain images
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ImageUsage: u32 {
        const TRANSFER_SRC = 1 << 0;
        const TRANSFER_DST = 1 << 1;
        const SAMPLED = 1 << 2;
        const COLOR_ATTACHMENT = 1 << 3;
    }
}

/// Swapchain creation descriptor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapchainDesc<S> {
    pub surface: S,
    pub min_image_count: u32,
    pub format: SurfaceFormat,
    pub extent: UVec2,
    pub usage: ImageUsage,
    pub sharing_mode: SharingMode,
    pub pre_transform: SurfaceTransform,
    pub composite_alpha: CompositeAlpha,
    pub present_mode: PresentMode,
    pub clipped: bool,
}

/// Outcome of a successful-or-stale image acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireResult {
    Acquired { image_index: u32, suboptimal: bool },
    /// The swapchain no longer matches the surface and must be recreated
    OutOfDate,
}

/// Outcome of a successful-or-stale presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentResult {
    Presented { suboptimal: bool },
    /// The swapchain no longer matches the surface and must be recreated
    OutOfDate,
}
