//! Unit tests for selection.rs
//!
//! Pure selection functions, no context needed.

use super::*;
use crate::graphics_context::SurfaceTransform;

fn caps(current: UVec2, min: UVec2, max: UVec2) -> SurfaceCapabilities {
    SurfaceCapabilities {
        min_image_count: 2,
        max_image_count: 8,
        current_extent: current,
        min_image_extent: min,
        max_image_extent: max,
        current_transform: SurfaceTransform::IDENTITY,
    }
}

fn format(format: TextureFormat, color_space: ColorSpace) -> SurfaceFormat {
    SurfaceFormat::new(format, color_space)
}

// ============================================================================
// SURFACE FORMAT
// ============================================================================

#[test]
fn test_best_surface_format_picks_preferred_anywhere_in_list() {
    let preferred = format(TextureFormat::B8G8R8A8_UNORM, ColorSpace::SrgbNonlinear);
    let others = [
        format(TextureFormat::R8G8B8A8_SRGB, ColorSpace::SrgbNonlinear),
        format(TextureFormat::A2B10G10R10_UNORM, ColorSpace::Hdr10St2084),
        format(TextureFormat::B8G8R8A8_SRGB, ColorSpace::SrgbNonlinear),
    ];

    for position in 0..=others.len() {
        let mut formats = others.to_vec();
        formats.insert(position, preferred);
        assert_eq!(get_best_surface_format(&formats), Some(preferred));
    }
}

#[test]
fn test_best_surface_format_requires_matching_color_space() {
    // Right format in the wrong color space is not the preferred entry
    let formats = [
        format(TextureFormat::R16G16B16A16_SFLOAT, ColorSpace::ExtendedSrgbLinear),
        format(TextureFormat::B8G8R8A8_UNORM, ColorSpace::DisplayP3Nonlinear),
    ];
    assert_eq!(get_best_surface_format(&formats), Some(formats[0]));
}

#[test]
fn test_best_surface_format_falls_back_to_first() {
    let formats = [
        format(TextureFormat::R8G8B8A8_UNORM, ColorSpace::SrgbNonlinear),
        format(TextureFormat::Unknown(1000), ColorSpace::Other(7)),
    ];
    assert_eq!(get_best_surface_format(&formats), Some(formats[0]));
}

#[test]
fn test_best_surface_format_empty_list() {
    assert_eq!(get_best_surface_format(&[]), None);
}

// ============================================================================
// PRESENT MODE
// ============================================================================

#[test]
fn test_best_present_mode_prefers_mailbox() {
    use PresentMode::*;
    assert_eq!(get_best_present_mode(&[Fifo, Immediate, Mailbox]), Mailbox);
    assert_eq!(get_best_present_mode(&[Mailbox, Fifo]), Mailbox);
    assert_eq!(get_best_present_mode(&[Immediate, FifoRelaxed, Mailbox]), Mailbox);
}

#[test]
fn test_best_present_mode_immediate_then_fifo() {
    use PresentMode::*;
    assert_eq!(get_best_present_mode(&[Fifo, Immediate]), Immediate);
    assert_eq!(get_best_present_mode(&[Immediate]), Immediate);
    assert_eq!(get_best_present_mode(&[FifoRelaxed, Fifo]), Fifo);
    assert_eq!(get_best_present_mode(&[]), Fifo);
}

// ============================================================================
// EXTENT
// ============================================================================

#[test]
fn test_swap_extent_sentinel_clamps_window_size() {
    let c = caps(
        UVec2::new(u32::MAX, u32::MAX),
        UVec2::new(100, 50),
        UVec2::new(1920, 1080),
    );

    assert_eq!(get_best_swap_extent(&c, UVec2::new(800, 600)), UVec2::new(800, 600));
    assert_eq!(get_best_swap_extent(&c, UVec2::new(10, 4000)), UVec2::new(100, 1080));
    assert_eq!(get_best_swap_extent(&c, UVec2::new(5000, 20)), UVec2::new(1920, 50));
    assert_eq!(get_best_swap_extent(&c, UVec2::ZERO), UVec2::new(100, 50));
}

#[test]
fn test_swap_extent_fixed_current_extent_wins() {
    let c = caps(UVec2::new(1280, 720), UVec2::new(1, 1), UVec2::new(4096, 4096));

    assert_eq!(get_best_swap_extent(&c, UVec2::new(800, 600)), UVec2::new(1280, 720));
    assert_eq!(get_best_swap_extent(&c, UVec2::new(5000, 5000)), UVec2::new(1280, 720));
}

// ============================================================================
// IMAGE COUNT
// ============================================================================

#[test]
fn test_image_count_is_min_plus_one_capped() {
    let mut c = caps(UVec2::ZERO, UVec2::ZERO, UVec2::ZERO);

    c.min_image_count = 2;
    c.max_image_count = 8;
    assert_eq!(get_image_count(&c), 3);

    c.max_image_count = 2;
    assert_eq!(get_image_count(&c), 2);

    // 0 means unbounded
    c.min_image_count = 4;
    c.max_image_count = 0;
    assert_eq!(get_image_count(&c), 5);
}

// ============================================================================
// SHARING MODE
// ============================================================================

#[test]
fn test_sharing_mode_exclusive_for_same_family() {
    let indices = QueueFamilyIndices { graphics: Some(0), present: Some(0) };
    assert_eq!(get_sharing_mode(indices), Ok(SharingMode::Exclusive));
}

#[test]
fn test_sharing_mode_concurrent_for_distinct_families() {
    let indices = QueueFamilyIndices { graphics: Some(0), present: Some(2) };
    assert_eq!(get_sharing_mode(indices), Ok(SharingMode::Concurrent([0, 2])));
}

#[test]
fn test_sharing_mode_rejects_missing_indices() {
    for indices in [
        QueueFamilyIndices { graphics: None, present: Some(0) },
        QueueFamilyIndices { graphics: Some(0), present: None },
        QueueFamilyIndices::default(),
    ] {
        match get_sharing_mode(indices) {
            Err(Error::InvalidConfiguration(msg)) => assert!(msg.contains("queue family")),
            other => panic!("expected InvalidConfiguration, got {:?}", other),
        }
    }
}
