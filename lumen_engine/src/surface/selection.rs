/// Swapchain parameter selection from what the surface supports
///
/// Pure functions, no device access.

use glam::UVec2;

use crate::error::{Error, Result};
use crate::graphics_context::{
    SurfaceFormat, SurfaceCapabilities, PresentMode, QueueFamilyIndices, SharingMode,
    TextureFormat, ColorSpace,
};

/// Format preferred for swapchain images
pub const PREFERRED_SURFACE_FORMAT: SurfaceFormat =
    SurfaceFormat::new(TextureFormat::B8G8R8A8_UNORM, ColorSpace::SrgbNonlinear);

/// Preferred format if supported, otherwise the first supported one
///
/// Returns `None` only for an empty list.
pub fn get_best_surface_format(formats: &[SurfaceFormat]) -> Option<SurfaceFormat> {
    formats
        .iter()
        .find(|format| **format == PREFERRED_SURFACE_FORMAT)
        .or_else(|| formats.first())
        .copied()
}

/// Mailbox if supported, then immediate, then FIFO (always available)
pub fn get_best_present_mode(modes: &[PresentMode]) -> PresentMode {
    let mut immediate_seen = false;
    for &mode in modes {
        match mode {
            PresentMode::Mailbox => return PresentMode::Mailbox,
            PresentMode::Immediate => immediate_seen = true,
            _ => {}
        }
    }
    if immediate_seen {
        PresentMode::Immediate
    } else {
        PresentMode::Fifo
    }
}

/// Swapchain extent for a window of `window_size` pixels
///
/// A fixed `current_extent` wins. The `u32::MAX` sentinel means the surface
/// follows the swapchain, so the window size is clamped to the allowed range.
pub fn get_best_swap_extent(capabilities: &SurfaceCapabilities, window_size: UVec2) -> UVec2 {
    if capabilities.current_extent.x != u32::MAX {
        return capabilities.current_extent;
    }
    UVec2::new(
        window_size
            .x
            .clamp(capabilities.min_image_extent.x, capabilities.max_image_extent.x),
        window_size
            .y
            .clamp(capabilities.min_image_extent.y, capabilities.max_image_extent.y),
    )
}

/// One more image than the minimum, capped at the maximum (0 = unbounded)
pub fn get_image_count(capabilities: &SurfaceCapabilities) -> u32 {
    let count = capabilities.min_image_count + 1;
    if capabilities.max_image_count > 0 {
        count.min(capabilities.max_image_count)
    } else {
        count
    }
}

/// Concurrent sharing between distinct graphics and present families, else exclusive
pub fn get_sharing_mode(indices: QueueFamilyIndices) -> Result<SharingMode> {
    match (indices.graphics, indices.present) {
        (Some(graphics), Some(present)) if graphics != present => {
            Ok(SharingMode::Concurrent([graphics, present]))
        }
        (Some(_), Some(_)) => Ok(SharingMode::Exclusive),
        (graphics, present) => Err(Error::InvalidConfiguration(format!(
            "incomplete queue family indices (graphics: {:?}, present: {:?})",
            graphics, present
        ))),
    }
}

#[cfg(test)]
#[path = "selection_tests.rs"]
mod tests;
