/// Surface module - window surface, swapchain and frame synchronization

pub mod selection;
pub mod frame_sync;
pub mod swapchain;
pub mod window_surface;

pub use selection::*;
pub use frame_sync::*;
pub use swapchain::*;
pub use window_surface::*;
