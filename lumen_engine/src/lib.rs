/*!
# Lumen Engine

Backend-agnostic core of the Lumen renderer: window surface and swapchain
lifecycle, frame-in-flight synchronization, and per-renderable draw submission.

## Architecture

- **GraphicsContext**: device/context collaborator trait (surface, swapchain,
  render pass, framebuffers, command buffers, semaphores, fences, submit, present)
- **DrawCommands**: draw recording on top of a `GraphicsContext`
- **WindowSurface**: owns the swapchain, render pass and frame synchronization
  for one window, and drives begin/end frame
- **Renderer**: records the draws of each renderable between begin and end frame

Backend implementations (see `lumen_engine_renderer_vulkan`) provide the
concrete handle types. This crate builds and tests without a GPU.
*/

// Internal modules
mod error;
mod engine;
mod config;
pub mod log;
pub mod graphics_context;
pub mod surface;
pub mod renderer;

#[cfg(test)]
mod test_support;

// Main lumen namespace module
pub mod lumen {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging facade
    pub use crate::engine::Engine;

    // Configuration
    pub use crate::config::{Config, DebugSeverity};

    // Logging sub-module (types only, macros live at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger, ScopedTask};
    }

    // Collaborator traits and descriptor types
    pub mod context {
        pub use crate::graphics_context::*;
    }

    // Window surface, swapchain and frame synchronization
    pub mod surface {
        pub use crate::surface::*;
    }

    // Draw submission
    pub mod render {
        pub use crate::renderer::*;
    }
}

// Re-export math library at crate root
pub use glam;
