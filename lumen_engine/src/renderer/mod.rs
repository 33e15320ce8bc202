/// Renderer module - per-renderable draw submission

pub mod mesh;
pub mod renderer;

pub use mesh::*;
pub use renderer::*;
