/// Graphics context module - collaborator traits and the descriptors they exchange

// Module declarations
pub mod graphics_context;
pub mod surface_types;
pub mod command_types;

// Re-export everything from graphics_context.rs
pub use graphics_context::*;

// Re-export descriptor types
pub use surface_types::*;
pub use command_types::*;

// Mock graphics context for tests (no GPU required)
#[cfg(test)]
pub mod mock_context;
